use std::io::{self, Write};
use clap::Args;
use bf_engine::sanitize;
use super::{SourceArgs, SourceError};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct SanitizeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: SanitizeArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    match args.source.load(program) {
        Ok(s) => {
            println!("{}", sanitize(&s));
            let _ = io::stdout().flush();
            0
        }
        Err(SourceError::Usage) => usage_and_exit(program, 2),
        Err(SourceError::Unreadable) => 1,
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} sanitize "<code>"
  {0} sanitize --file <PATH>

Description:
  Prints the source with every character outside ><+-.,[] removed.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
