//! Token model shared by the optimizer and the engine.
//!
//! A [`Program`] is an immutable token stream plus the jump table used to
//! resolve loops in constant time.

use std::fmt;

/// One of the eight Brainfuck operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `>`
    Right,
    /// `<`
    Left,
    /// `+`
    Inc,
    /// `-`
    Dec,
    /// `.`
    Out,
    /// `,`
    In,
    /// `[`
    LoopOpen,
    /// `]`
    LoopClose,
}

impl Op {
    /// Map an instruction character to its operation. Anything else is `None`.
    pub fn from_char(c: char) -> Option<Op> {
        Some(match c {
            '>' => Op::Right,
            '<' => Op::Left,
            '+' => Op::Inc,
            '-' => Op::Dec,
            '.' => Op::Out,
            ',' => Op::In,
            '[' => Op::LoopOpen,
            ']' => Op::LoopClose,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Op::Right => '>',
            Op::Left => '<',
            Op::Inc => '+',
            Op::Dec => '-',
            Op::Out => '.',
            Op::In => ',',
            Op::LoopOpen => '[',
            Op::LoopClose => ']',
        }
    }

    pub fn is_bracket(self) -> bool {
        matches!(self, Op::LoopOpen | Op::LoopClose)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// An operation with a repeat count.
///
/// Unoptimized streams carry `count == 1` everywhere; loop tokens always do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub op: Op,
    pub count: usize,
}

impl Token {
    pub fn new(op: Op, count: usize) -> Self {
        Self { op, count }
    }

    pub fn single(op: Op) -> Self {
        Self { op, count: 1 }
    }
}

/// Renders in compressed-source form: `+` for a single op, `3+` for a run.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 1 {
            write!(f, "{}", self.op)
        } else {
            write!(f, "{}{}", self.count, self.op)
        }
    }
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// An immutable token stream ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    tokens: Vec<Token>,
    // jumps[i] holds the matching index for a bracket token at i.
    // None for non-brackets and for brackets without a partner.
    jumps: Vec<Option<usize>>,
    // Offset of each token's first character in the sanitized source, plus
    // one trailing entry holding the total length.
    offsets: Vec<usize>,
}

impl Program {
    /// Build a program from an explicit token stream.
    ///
    /// Unmatched brackets are not an error here; the engine reports them
    /// only when it actually has to jump through one.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut jumps: Vec<Option<usize>> = vec![None; tokens.len()];
        let mut stack: Vec<usize> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            match token.op {
                Op::LoopOpen => stack.push(i),
                Op::LoopClose => {
                    if let Some(open_index) = stack.pop() {
                        jumps[open_index] = Some(i);
                        jumps[i] = Some(open_index);
                    }
                }
                _ => {}
            }
        }

        let mut offsets = Vec::with_capacity(tokens.len() + 1);
        let mut offset = 0usize;
        for token in &tokens {
            offsets.push(offset);
            offset += token.count;
        }
        offsets.push(offset);

        Self { tokens, jumps, offsets }
    }

    /// One token per instruction character, each with count 1.
    ///
    /// Non-instruction characters are skipped, so offsets refer to positions
    /// in the sanitized source.
    pub fn raw(source: &str) -> Self {
        Self::from_tokens(source.chars().filter_map(Op::from_char).map(Token::single).collect())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the bracket matching the one at `ip`, if it has a partner.
    pub fn jump_target(&self, ip: usize) -> Option<usize> {
        self.jumps.get(ip).copied().flatten()
    }

    /// Position of token `ip` in the sanitized source.
    pub fn source_offset(&self, ip: usize) -> usize {
        let end = self.offsets.len() - 1;
        self.offsets[ip.min(end)]
    }

    /// Returns the first unmatched bracket, if any, without running anything.
    pub fn first_unmatched(&self) -> Option<(usize, UnmatchedBracketKind)> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(i, t)| t.op.is_bracket() && self.jumps[*i].is_none())
            .map(|(i, t)| {
                let kind = if t.op == Op::LoopOpen {
                    UnmatchedBracketKind::Open
                } else {
                    UnmatchedBracketKind::Close
                };
                (i, kind)
            })
            .next()
    }
}

/// Renders the whole stream in compressed-source form.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}
