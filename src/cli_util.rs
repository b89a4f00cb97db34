use std::io::{self, Write};
use crate::{EngineError, Program};

/// Pretty-print an [`EngineError`] with caret positioning.
///
/// `source` is the sanitized source the program was built from; token indices
/// in the error are mapped back into it through the program's offsets.
/// If `program_name` is `Some("bf")`, messages are prefixed with "bf: ...".
pub fn print_engine_error(program_name: Option<&str>, source: &str, program: &Program, err: &EngineError) {
    eprintln!("{}", render_engine_error(program_name, source, program, err));
    let _ = io::stderr().flush();
}

/// Build the message [`print_engine_error`] prints.
pub fn render_engine_error(program_name: Option<&str>, source: &str, program: &Program, err: &EngineError) -> String {
    let prefix_program = |msg: &str| {
        if let Some(p) = program_name {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        EngineError::NegativeAddress { ip, ptr } => {
            let msg = prefix_program(&format!("Runtime error: negative address (ptr={ptr})"));
            with_context(&msg, *ip, source, program.source_offset(*ip))
        }
        EngineError::UnmatchedBracket { ip, kind } => {
            let msg = prefix_program(&format!("Runtime error: unmatched bracket {kind}"));
            with_context(&msg, *ip, source, program.source_offset(*ip))
        }
        EngineError::Io { ip, source: e } => {
            let msg = prefix_program(&format!("I/O error: {e}"));
            with_context(&msg, *ip, source, program.source_offset(*ip))
        }
        EngineError::InvalidCellBits { .. } => prefix_program(&format!("Configuration error: {err}")),
    }
}

/// A concise error line naming the token index, followed by a window of the
/// source with a caret under character `pos`.
fn with_context(prefix: &str, ip: usize, code: &str, pos: usize) -> String {
    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(code, start_char);
    let end_byte = char_to_byte_index(code, end_char);
    let slice = &code[start_byte..end_byte];

    // Caret under the exact position
    let underline = format!("{}^", " ".repeat(pos.saturating_sub(start_char)));

    format!("{prefix} at instruction {ip}\n  {slice}\n  {underline}")
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}
