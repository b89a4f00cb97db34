mod commands;

use std::env;
use std::io::{self, Write};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use commands::optimize::OptimizeArgs;
use commands::run::RunArgs;
use commands::sanitize::SanitizeArgs;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run      [OPTIONS] "<code>"      # Run Brainfuck code (args are concatenated)
  {0} run      [OPTIONS] --file <PATH> # Run Brainfuck code loaded from file
  {0} optimize "<code>" | --file <PATH> # Print the run-length optimized program
  {0} sanitize "<code>" | --file <PATH> # Print the program without comments

Global options:
  --verbose, -v   Log diagnostics to stderr (otherwise BF_LOG controls the level)

Run "{0} <subcommand> --help" for more info.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bf", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    /// Log diagnostics to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(RunArgs),
    Optimize(OptimizeArgs),
    Sanitize(SanitizeArgs),
}

/// Logs go to stderr so stdout carries nothing but program output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("BF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        print_top_usage_and_exit(&program, if cli.help { 0 } else { 2 });
    };
    if cli.help {
        print_top_usage_and_exit(&program, 0);
    }

    let code = match command {
        Command::Run(args) => commands::run::run(&program, args),
        Command::Optimize(args) => commands::optimize::run(&program, args),
        Command::Sanitize(args) => commands::sanitize::run(&program, args),
    };

    std::process::exit(code);
}
