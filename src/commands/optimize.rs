use std::io::{self, Write};
use clap::Args;
use tracing::warn;
use bf_engine::prepare;
use super::{SourceArgs, SourceError};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: OptimizeArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let raw_source = match args.source.load(program) {
        Ok(s) => s,
        Err(SourceError::Usage) => usage_and_exit(program, 2),
        Err(SourceError::Unreadable) => return 1,
    };

    let optimized = prepare(&raw_source, true);
    if let Some((ip, kind)) = optimized.first_unmatched() {
        warn!("unmatched bracket {kind} at instruction {ip}");
    }

    println!("{optimized}");
    let _ = io::stdout().flush();
    0
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} optimize "<code>"
  {0} optimize --file <PATH>

Options:
  --file,  -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --help,  -h         Show this help

Description:
  Prints the run-length optimized token stream. A run of n > 1 identical
  instructions is written as n followed by the instruction, e.g. "+++>" -> "3+>".
  Brackets are never merged.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
