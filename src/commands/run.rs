use std::io::{self, Read, Write};
use std::num::NonZeroU64;
use clap::Args;
use tracing::{debug, info, warn};
use bf_engine::cli_util::print_engine_error;
use bf_engine::config::{self, CellBits, EngineConfig, InputRepeat};
use bf_engine::{optimize, sanitize, Engine, Program};
use super::{SourceArgs, SourceError};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Execute one token per instruction instead of the run-length optimized stream
    #[arg(long = "raw")]
    pub raw: bool,

    /// Allow the pointer to move left of cell 0 (default true)
    #[arg(long = "negative-addresses", value_name = "BOOL")]
    pub negative_addresses: Option<bool>,

    /// Let cells hold values in [-max, max] instead of [0, max] (default false)
    #[arg(long = "negative-values", value_name = "BOOL")]
    pub negative_values: Option<bool>,

    /// Cell width in bits: 8, 16 or 32 (default 32)
    #[arg(short = 'b', long = "bits", value_name = "N")]
    pub bits: Option<u32>,

    /// Report throughput statistics on stderr
    #[arg(short = 's', long = "stats")]
    pub stats: bool,

    /// Steps between statistics reports (default 10_000_000)
    #[arg(long = "stats-interval", value_name = "N")]
    pub stats_interval: Option<NonZeroU64>,

    /// Read a single character for a merged run of ',' instead of one per repeat
    #[arg(long = "input-once")]
    pub input_once: bool,

    /// Echo every character read by ',' to stderr
    #[arg(long = "echo")]
    pub echo: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

/// Resolve the engine configuration: flags -> config file -> defaults.
pub fn resolve_config(program: &str, args: &RunArgs) -> Result<EngineConfig, i32> {
    let mut cfg = EngineConfig::default();
    if let Some((path, file)) = config::load_file_config() {
        debug!(path = %path.display(), "applying config file");
        cfg = file.apply(cfg);
    }

    if let Some(v) = args.negative_addresses { cfg.allow_negative_addresses = v; }
    if let Some(v) = args.negative_values { cfg.allow_negative_values = v; }
    if let Some(bits) = args.bits {
        cfg.cell_bits = match CellBits::try_from(bits) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("{program}: Configuration error: {e}");
                let _ = io::stderr().flush();
                return Err(2);
            }
        };
    }
    if args.stats { cfg.statistics = true; }
    if let Some(n) = args.stats_interval { cfg.stats_interval = n; }
    if args.input_once { cfg.input_repeat = InputRepeat::Once; }

    Ok(cfg)
}

/// Mirrors every byte read from the inner reader to stderr.
struct EchoReader<R> {
    inner: R,
}

impl<R: Read> Read for EchoReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        let mut err = io::stderr();
        err.write_all(&buf[..n])?;
        err.flush()?;
        Ok(n)
    }
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let raw_source = match args.source.load(program) {
        Ok(s) => s,
        Err(SourceError::Usage) => usage_and_exit(program, 2),
        Err(SourceError::Unreadable) => return 1,
    };

    let cfg = match resolve_config(program, &args) {
        Ok(cfg) => cfg,
        Err(code) => return code,
    };

    // Program errors point into the sanitized source, which is what tokens index.
    let clean = sanitize(&raw_source);
    let bf_program = if args.raw { Program::raw(&clean) } else { optimize(&clean) };
    info!(
        source_chars = raw_source.chars().count(),
        instructions = clean.len(),
        tokens = bf_program.len(),
        optimized = !args.raw,
        "program prepared"
    );

    // Flush what we have and exit on ctrl+c; there is no other way to stop a looping program.
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(130);
    }) {
        warn!("failed to set ctrl+c handler: {e}");
    }

    let mut engine = Engine::new(cfg);
    let name = program.to_string();
    engine.set_stats_observer(move |report| {
        eprintln!("{name}: {report}");
    });

    let result = if args.echo {
        engine.run_with_io(&bf_program, EchoReader { inner: io::stdin() }, io::stdout())
    } else {
        engine.run_with_io(&bf_program, io::stdin(), io::stdout())
    };

    let exit_code = match result {
        Ok(()) => {
            debug!(steps = engine.steps(), pointer = engine.pointer(), "run finished");
            0
        }
        Err(err) => {
            debug!(steps = engine.steps(), "run aborted");
            print_engine_error(Some(program), &clean, &bf_program, &err);
            1
        }
    };

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [OPTIONS] "<code>"
  {0} run [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>            Read Brainfuck code from PATH instead of positional "<code>"
  --raw                         Execute without run-length optimization
  --bits,  -b <N>               Cell width: 8, 16 or 32 (default 32)
  --negative-addresses <BOOL>   Allow cells left of cell 0 (default true)
  --negative-values <BOOL>      Allow cell values in [-max, max] (default false)
  --stats, -s                   Report throughput statistics on stderr
  --stats-interval <N>          Steps between statistics reports (default 10000000)
  --input-once                  A merged run of ',' reads a single character
  --echo                        Echo characters read by ',' to stderr
  --help,  -h                   Show this help

Notes:
- Characters outside of Brainfuck's ><+-.,[] are ignored.
- Input (`,`) reads one UTF-8 character from stdin; on EOF the current cell is set to 0.
- Defaults can be set in the [engine] section of bf.toml in your config directory
  (or the file named by BF_CONFIG). Flags take precedence.

Examples:
- Load Brainfuck code from a file with 8-bit cells:
    {0} run --bits 8 --file ./program.bf
- Read bytes from a file as stdin (`,` will consume file input):
    {0} run ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
