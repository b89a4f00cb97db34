//! Source sanitizing: strip everything that is not one of the eight Brainfuck
//! instruction characters.

/// The eight instruction characters, in the usual `><+-.,[]` order.
pub const LEGAL_CHARS: [char; 8] = ['>', '<', '+', '-', '.', ',', '[', ']'];

/// Returns true if `c` is a Brainfuck instruction character.
pub fn is_legal(c: char) -> bool {
    matches!(c, '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']')
}

/// Keep only Brainfuck instruction characters, in their original order.
///
/// Never fails; comments, whitespace and digits are simply dropped. The
/// optimizer relies on this having run first.
pub fn sanitize(source: &str) -> String {
    source.chars().filter(|&c| is_legal(c)).collect()
}
