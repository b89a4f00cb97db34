//! A run-length optimizing Brainfuck interpreter library.
//!
//! Source text goes through three stages:
//! 1. [`sanitize`] drops every character outside `><+-.,[]`.
//! 2. [`optimize`] collapses runs of identical instructions into counted
//!    tokens (or [`Program::raw`] keeps one token per instruction).
//! 3. [`Engine`] executes the resulting [`Program`] on a sparse, two-sided
//!    tape of 8, 16 or 32-bit cells.
//!
//! Features and behaviors:
//! - Cells wrap cyclically; with negative values enabled the range is
//!   `[-max, max]`.
//! - Moving left of address 0 is an error unless negative addresses are allowed.
//! - Input `,` reads a UTF-8 character; on EOF the current cell is set to 0.
//! - Output `.` writes the current cell as a character.
//! - Loops jump through a precomputed table; a bracket without a partner is
//!   reported when a jump through it is needed.
//!
//! Quick start:
//!
//! ```no_run
//! use bf_engine::{Engine, EngineConfig};
//!
//! let code = "++++++++[>++++++++<-]>.";
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.run_source(code, true).expect("program should run");
//! println!(); // ensure a trailing newline for readability
//! ```

pub mod cli_util;
pub mod config;
pub mod engine;
pub mod optimizer;
pub mod sanitizer;
pub mod stats;
pub mod tape;
pub mod token;

pub use config::{CellBits, EngineConfig, InputRepeat};
pub use engine::{Engine, EngineError};
pub use optimizer::optimize;
pub use sanitizer::sanitize;
pub use stats::StatsReport;
pub use tape::Tape;
pub use token::{Op, Program, Token, UnmatchedBracketKind};

/// Sanitize `source` and turn it into a [`Program`], run-length optimized or not.
pub fn prepare(source: &str, optimized: bool) -> Program {
    let clean = sanitize(source);
    if optimized {
        optimize(&clean)
    } else {
        Program::raw(&clean)
    }
}
