//! Run-length optimization of sanitized source.
//!
//! Maximal runs of the same non-bracket instruction collapse into one
//! [`Token`] carrying the run length. Brackets always stay single, so the jump
//! table of the optimized program pairs the same loops as the raw one.

use crate::token::{Op, Program, Token};

/// Collapse runs of identical instructions into counted tokens.
///
/// Characters that are not instructions are skipped; callers should pass
/// sanitized source so that token offsets line up with what they display.
pub fn optimize_tokens(source: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut run: Option<Token> = None;

    for op in source.chars().filter_map(Op::from_char) {
        match run.as_mut() {
            Some(current) if current.op == op && !op.is_bracket() => {
                current.count += 1;
            }
            _ => {
                if let Some(done) = run.take() {
                    tokens.push(done);
                }
                run = Some(Token::single(op));
            }
        }
    }

    if let Some(done) = run {
        tokens.push(done);
    }

    tokens
}

/// Optimize `source` and build an executable [`Program`] from the result.
pub fn optimize(source: &str) -> Program {
    Program::from_tokens(optimize_tokens(source))
}
