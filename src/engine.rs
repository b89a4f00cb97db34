//! The execution engine.
//!
//! A single dispatch loop runs any [`Program`], raw or run-length optimized,
//! against a fresh [`Tape`]. Behavior per token:
//! - `>`/`<` move the pointer by the token's count; moving below address 0
//!   is an error unless negative addresses are allowed.
//! - `+`/`-` add or subtract the count and wrap cyclically into the cell range,
//!   giving the same result as `count` single steps.
//! - `.` writes the current cell as a character `count` times.
//! - `,` reads one character per repeat (or once, see [`InputRepeat`]); on EOF
//!   the current cell is set to 0.
//! - `[`/`]` jump through the program's precomputed jump table. A bracket
//!   without a partner is reported only when a jump through it is needed.
//!
//! The engine does not log; statistics reports go to an installed observer,
//! or to stderr when none is set.

use std::io::{self, Read, Write};
use crate::config::{EngineConfig, InputRepeat};
use crate::stats::{StatsReport, StatsTracker};
use crate::tape::Tape;
use crate::token::{Op, Program, UnmatchedBracketKind};

/// Errors that can occur while configuring or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested cell width is not 8, 16 or 32 bits.
    #[error("Invalid cell width: {bits} bits (expected 8, 16 or 32)")]
    InvalidCellBits { bits: u32 },

    /// The pointer would move below address 0 while negative addresses are disallowed.
    #[error("Negative address at instruction {ip} (ptr={ptr})")]
    NegativeAddress { ip: usize, ptr: i64 },

    /// A jump was needed through a `[` or `]` that has no partner.
    #[error("Unmatched bracket {kind} at instruction {ip}")]
    UnmatchedBracket { ip: usize, kind: UnmatchedBracketKind },

    /// Writing output or reading input failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io { ip: usize, #[source] source: io::Error },
}

type StatsObserver = Box<dyn FnMut(&StatsReport) + Send>;

/// Runs programs under a fixed [`EngineConfig`].
///
/// Tape, pointer and step counter are reset at the start of every run and
/// stay inspectable after it ends.
pub struct Engine {
    config: EngineConfig,
    tape: Tape,
    pointer: i64,
    steps: u64,
    stats_observer: Option<StatsObserver>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            tape: Tape::new(),
            pointer: 0,
            steps: 0,
            stats_observer: None,
        }
    }

    /// Receive statistics reports instead of having them printed to stderr.
    /// Only called when statistics are enabled in the configuration.
    pub fn set_stats_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&StatsReport) + Send + 'static,
    {
        self.stats_observer = Some(Box::new(observer));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn pointer(&self) -> i64 {
        self.pointer
    }

    /// Tokens dispatched during the last run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Value of the cell under the pointer.
    pub fn current_cell(&self) -> i64 {
        self.tape.get(self.pointer)
    }

    /// Run `program` against stdin and stdout.
    pub fn run(&mut self, program: &Program) -> Result<(), EngineError> {
        self.run_with_io(program, io::stdin(), io::stdout())
    }

    /// Sanitize `source`, optionally optimize it, and run it against stdin and stdout.
    pub fn run_source(&mut self, source: &str, optimized: bool) -> Result<(), EngineError> {
        let program = crate::prepare(source, optimized);
        self.run(&program)
    }

    /// Run `program` reading from `input` and writing to `output`.
    pub fn run_with_io<R: Read, W: Write>(
        &mut self,
        program: &Program,
        mut input: R,
        mut output: W,
    ) -> Result<(), EngineError> {
        self.tape = Tape::new();
        self.pointer = 0;
        self.steps = 0;

        let mut stats = self.config.statistics.then(|| StatsTracker::new(self.config.stats_interval));
        let tokens = program.tokens();
        let mut ip = 0;

        while ip < tokens.len() {
            let token = tokens[ip];
            let count = token.count;

            match token.op {
                Op::Right => {
                    self.pointer += count as i64;
                    self.tape.touch(self.pointer);
                    ip += 1;
                }
                Op::Left => {
                    let target = self.pointer - count as i64;
                    if target < 0 && !self.config.allow_negative_addresses {
                        // Single steps would have stopped at address 0.
                        self.pointer = self.pointer.min(0);
                        return Err(EngineError::NegativeAddress { ip, ptr: target });
                    }
                    self.pointer = target;
                    self.tape.touch(self.pointer);
                    ip += 1;
                }
                Op::Inc => {
                    let after = self.config.wrap(self.current_cell() + self.reduced(count));
                    self.tape.set(self.pointer, after);
                    ip += 1;
                }
                Op::Dec => {
                    let after = self.config.wrap(self.current_cell() - self.reduced(count));
                    self.tape.set(self.pointer, after);
                    ip += 1;
                }
                Op::Out => {
                    let ch = cell_to_char(self.current_cell());
                    let mut buf = [0u8; 4];
                    let encoded = ch.encode_utf8(&mut buf).as_bytes();
                    for _ in 0..count {
                        output.write_all(encoded).map_err(|source| EngineError::Io { ip, source })?;
                    }
                    ip += 1;
                }
                Op::In => {
                    // Anything written so far should be visible before we block.
                    output.flush().map_err(|source| EngineError::Io { ip, source })?;
                    let reads = match self.config.input_repeat {
                        InputRepeat::PerCount => count,
                        InputRepeat::Once => 1,
                    };
                    let mut value = 0;
                    for _ in 0..reads {
                        match read_char(&mut input).map_err(|source| EngineError::Io { ip, source })? {
                            Some(ch) => value = self.config.wrap(ch as i64),
                            None => {
                                // EOF: common BF behavior is to set cell to 0
                                value = 0;
                                break;
                            }
                        }
                    }
                    self.tape.set(self.pointer, value);
                    ip += 1;
                }
                Op::LoopOpen => {
                    if self.current_cell() == 0 {
                        // Land on the matching ']', which then falls through.
                        ip = program.jump_target(ip).ok_or(EngineError::UnmatchedBracket {
                            ip,
                            kind: UnmatchedBracketKind::Open,
                        })?;
                    } else {
                        ip += 1;
                    }
                }
                Op::LoopClose => {
                    if self.current_cell() != 0 {
                        ip = program.jump_target(ip).ok_or(EngineError::UnmatchedBracket {
                            ip,
                            kind: UnmatchedBracketKind::Close,
                        })?;
                    } else {
                        ip += 1;
                    }
                }
            }

            self.steps += 1;
            if let Some(report) = stats.as_mut().and_then(|s| s.tick(self.steps)) {
                match self.stats_observer.as_mut() {
                    Some(observer) => observer(&report),
                    None => eprintln!("{report}"),
                }
            }
        }

        output.flush().map_err(|source| EngineError::Io { ip, source })?;
        Ok(())
    }

    /// `count` reduced modulo the value span, so the add cannot overflow.
    fn reduced(&self, count: usize) -> i64 {
        (count as u64 % self.config.value_span() as u64) as i64
    }
}

/// Character for a cell value; values that are not Unicode scalars print as U+FFFD.
fn cell_to_char(value: i64) -> char {
    u32::try_from(value)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Read one UTF-8 encoded character. `Ok(None)` means EOF.
fn read_char<R: Read>(input: &mut R) -> io::Result<Option<char>> {
    let mut buf = [0u8; 4];
    loop {
        match input.read(&mut buf[..1]) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let width = match buf[0] {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
    };
    if width > 1 {
        match input.read_exact(&mut buf[1..width]) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Ok(Some(char::REPLACEMENT_CHARACTER));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Some(
        std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU64;
    use std::sync::{Arc, Mutex};
    use crate::optimizer::optimize;
    use crate::token::Token;

    fn config(negative_addresses: bool, negative_values: bool, bits: u32) -> EngineConfig {
        EngineConfig::new(negative_addresses, negative_values, bits, false).unwrap()
    }

    fn run_raw(cfg: EngineConfig, code: &str, input: &str) -> (Engine, Result<(), EngineError>, String) {
        let mut engine = Engine::new(cfg);
        let mut out = Vec::new();
        let result = engine.run_with_io(&Program::raw(code), input.as_bytes(), &mut out);
        (engine, result, String::from_utf8(out).unwrap())
    }

    fn run_optimized(cfg: EngineConfig, code: &str, input: &str) -> (Engine, Result<(), EngineError>, String) {
        let mut engine = Engine::new(cfg);
        let mut out = Vec::new();
        let result = engine.run_with_io(&optimize(code), input.as_bytes(), &mut out);
        (engine, result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn unmatched_open_bracket_returns_error() {
        // The starting cell is zero, so '[' needs a jump that cannot be resolved.
        let (_, result, out) = run_raw(EngineConfig::default(), "[+", "");
        assert!(matches!(
            result,
            Err(EngineError::UnmatchedBracket { ip: 0, kind: UnmatchedBracketKind::Open })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn unmatched_close_bracket_returns_error_when_jumping_back() {
        let (_, result, _) = run_raw(EngineConfig::default(), "+]", "");
        assert!(matches!(
            result,
            Err(EngineError::UnmatchedBracket { ip: 1, kind: UnmatchedBracketKind::Close })
        ));
    }

    #[test]
    fn unmatched_bracket_not_reached_is_harmless() {
        // ']' on a zero cell falls through without needing a partner.
        let (_, result, out) = run_raw(EngineConfig::default(), "+.-]", "");
        assert!(result.is_ok());
        assert_eq!(out, "\u{1}");
    }

    #[test]
    fn left_of_origin_errors_when_disallowed() {
        let (_, result, _) = run_raw(config(false, false, 8), "<", "");
        assert!(matches!(result, Err(EngineError::NegativeAddress { ip: 0, ptr: -1 })));
    }

    #[test]
    fn left_of_origin_allocates_cell_when_allowed() {
        let (engine, result, _) = run_raw(config(true, false, 8), "<", "");
        assert!(result.is_ok());
        assert_eq!(engine.pointer(), -1);
        assert!(engine.tape().is_allocated(-1));
        assert_eq!(engine.tape().get(-1), 0);
    }

    #[test]
    fn counted_left_reports_landing_address() {
        let (_, result, _) = run_optimized(config(false, false, 8), ">><<<", "");
        assert!(matches!(result, Err(EngineError::NegativeAddress { ip: 1, ptr: -1 })));
    }

    #[test]
    fn counted_left_stops_at_origin_like_single_steps() {
        let cfg = config(false, false, 8);
        let (single, raw_result, _) = run_raw(cfg, ">>+<<<", "");
        let (counted, opt_result, _) = run_optimized(cfg, ">>+<<<", "");
        assert!(matches!(raw_result, Err(EngineError::NegativeAddress { ip: 5, ptr: -1 })));
        assert!(matches!(opt_result, Err(EngineError::NegativeAddress { ip: 2, ptr: -1 })));
        assert_eq!(single.pointer(), 0);
        assert_eq!(counted.pointer(), 0);
        assert_eq!(counted.tape().nonzero_cells(), vec![(2, 1)]);
        assert_eq!(single.tape().nonzero_cells(), counted.tape().nonzero_cells());
    }

    #[test]
    fn empty_loop_on_zero_cell_is_ok() {
        let (_, result, _) = run_raw(EngineConfig::default(), "[]", "");
        assert!(result.is_ok());
    }

    #[test]
    fn simple_program_without_io_runs_ok() {
        let (engine, result, _) = run_raw(EngineConfig::default(), "+++[-]", "");
        assert!(result.is_ok());
        assert_eq!(engine.current_cell(), 0);
    }

    #[test]
    fn wrapping_subtraction() {
        let (engine, result, _) = run_raw(config(false, false, 8), "-", "");
        assert!(result.is_ok());
        assert_eq!(engine.tape().get(0), 255);
    }

    #[test]
    fn wrapping_addition() {
        let code = "+".repeat(256);
        let (engine, result, _) = run_raw(config(false, false, 8), &code, "");
        assert!(result.is_ok());
        assert_eq!(engine.tape().get(0), 0);
    }

    #[test]
    fn counted_increment_matches_single_steps() {
        let cfg = config(false, false, 8);
        let program = Program::from_tokens(vec![Token::new(Op::Inc, 300)]);
        let mut engine = Engine::new(cfg);
        engine.run_with_io(&program, io::empty(), io::sink()).unwrap();
        assert_eq!(engine.current_cell(), 44);

        let (single, _, _) = run_raw(cfg, &"+".repeat(300), "");
        assert_eq!(single.current_cell(), 44);
    }

    #[test]
    fn signed_cells_wrap_through_negative_max() {
        let cfg = config(false, true, 8);
        let (engine, _, _) = run_optimized(cfg, &"+".repeat(256), "");
        assert_eq!(engine.current_cell(), -255);
        let (engine, _, _) = run_optimized(cfg, "-", "");
        assert_eq!(engine.current_cell(), -1);
        let (engine, _, _) = run_optimized(cfg, &format!("{}-", "-".repeat(255)), "");
        assert_eq!(engine.current_cell(), 255);
    }

    #[test]
    fn sixteen_bit_cells_hold_large_values() {
        let (engine, _, _) = run_optimized(config(false, false, 16), &"+".repeat(1000), "");
        assert_eq!(engine.current_cell(), 1000);
        let (engine, _, _) = run_optimized(config(false, false, 16), "-", "");
        assert_eq!(engine.current_cell(), 65_535);
    }

    #[test]
    fn multiplication_loop_prints_at_sign() {
        let (_, result, out) = run_optimized(config(true, false, 32), "++++++++[>++++++++<-]>.", "");
        assert!(result.is_ok());
        assert_eq!(out, "@");
    }

    #[test]
    fn counted_output_repeats_character() {
        let (_, _, out) = run_optimized(EngineConfig::default(), &format!("{}...", "+".repeat(65)), "");
        assert_eq!(out, "AAA");
    }

    #[test]
    fn non_scalar_values_print_replacement_char() {
        let (_, _, out) = run_raw(config(false, true, 8), "-.", "");
        assert_eq!(out, "\u{FFFD}");
    }

    #[test]
    fn reads_and_echoes_characters() {
        let (_, result, out) = run_raw(EngineConfig::default(), ",.,.", "Hé");
        assert!(result.is_ok());
        assert_eq!(out, "Hé");
    }

    #[test]
    fn eof_sets_cell_to_zero() {
        let (engine, result, _) = run_raw(EngineConfig::default(), "+++,", "");
        assert!(result.is_ok());
        assert_eq!(engine.current_cell(), 0);
    }

    #[test]
    fn input_wraps_into_cell_range() {
        // U+20AC does not fit in 8 bits.
        let (engine, _, _) = run_raw(config(false, false, 8), ",", "€");
        assert_eq!(engine.current_cell(), 0x20AC % 256);
    }

    #[test]
    fn merged_input_consumes_count_characters_by_default() {
        let (engine, _, _) = run_optimized(EngineConfig::default(), ",,", "ab");
        assert_eq!(engine.current_cell(), 'b' as i64);
    }

    #[test]
    fn merged_input_reads_once_when_configured() {
        let cfg = EngineConfig::default().with_input_repeat(InputRepeat::Once);
        let (engine, _, out) = run_optimized(cfg, ",,>,.", "abc");
        assert_eq!(engine.tape().get(0), 'a' as i64);
        assert_eq!(out, "b");
    }

    #[test]
    fn state_resets_between_runs() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.run_with_io(&Program::raw(">>+++"), io::empty(), io::sink()).unwrap();
        assert_eq!(engine.pointer(), 2);
        engine.run_with_io(&Program::raw("+"), io::empty(), io::sink()).unwrap();
        assert_eq!(engine.pointer(), 0);
        assert_eq!(engine.tape().nonzero_cells(), vec![(0, 1)]);
    }

    #[test]
    fn step_counter_includes_bracket_fallthrough() {
        // '[' on zero jumps onto ']' which is dispatched once more.
        let mut engine = Engine::new(EngineConfig::default());
        engine.run_with_io(&Program::raw("[]"), io::empty(), io::sink()).unwrap();
        assert_eq!(engine.steps(), 2);
    }

    #[test]
    fn stats_observer_receives_periodic_reports() {
        let cfg = EngineConfig::new(false, false, 8, true)
            .unwrap()
            .with_stats_interval(NonZeroU64::new(4).unwrap());
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();

        let mut engine = Engine::new(cfg);
        engine.set_stats_observer(move |r| sink.lock().unwrap().push(*r));
        engine.run_with_io(&Program::raw("+++++++++"), io::empty(), io::sink()).unwrap();

        let reports = reports.lock().unwrap();
        assert_eq!(reports.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(reports[1].steps, 8);
    }

    #[test]
    fn stats_disabled_never_calls_observer() {
        let cfg = EngineConfig::default().with_stats_interval(NonZeroU64::new(1).unwrap());
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();

        let mut engine = Engine::new(cfg);
        engine.set_stats_observer(move |_| *counter.lock().unwrap() += 1);
        engine.run_with_io(&Program::raw("+++"), io::empty(), io::sink()).unwrap();
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn read_char_handles_truncated_sequences() {
        let mut input: &[u8] = &[0xE2, 0x82];
        assert_eq!(read_char(&mut input).unwrap(), Some(char::REPLACEMENT_CHARACTER));
        let mut input: &[u8] = &[0xFF, b'a'];
        assert_eq!(read_char(&mut input).unwrap(), Some(char::REPLACEMENT_CHARACTER));
        assert_eq!(read_char(&mut input).unwrap(), Some('a'));
        assert_eq!(read_char(&mut input).unwrap(), None);
    }
}
