pub mod optimize;
pub mod run;
pub mod sanitize;

use std::fs;
use std::io::{self, Write};
use clap::Args;
use tracing::debug;

/// Where a command gets its Brainfuck source from.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,
}

/// Why source could not be loaded; each maps to an exit code.
#[derive(Debug)]
pub enum SourceError {
    /// Neither or both of `--file` and positional code were given.
    Usage,
    /// The file could not be read; already reported on stderr.
    Unreadable,
}

impl SourceArgs {
    /// Load the raw source text, reporting problems on stderr.
    pub fn load(&self, program: &str) -> Result<String, SourceError> {
        match (&self.file, self.code.is_empty()) {
            (None, true) => Err(SourceError::Usage),
            (Some(_), false) => {
                eprintln!("{program}: cannot use positional code together with --file");
                Err(SourceError::Usage)
            }
            (Some(path), true) => match fs::read_to_string(path) {
                Ok(s) => {
                    debug!(path = %path, bytes = s.len(), "loaded source file");
                    Ok(s)
                }
                Err(e) => {
                    eprintln!("{program}: failed to read code file as UTF-8: {e}");
                    let _ = io::stderr().flush();
                    Err(SourceError::Unreadable)
                }
            },
            (None, false) => Ok(self.code.join("")),
        }
    }
}
