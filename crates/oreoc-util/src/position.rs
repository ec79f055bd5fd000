use std::fmt;

/// A 1-indexed line/column pair identifying a location in source text.
///
/// Mirrors the cursor bookkeeping every stage needs for diagnostics; kept as
/// a plain value type (`Copy`) since every token, parse node, and error
/// carries one around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// The position a fresh cursor starts at.
    pub const fn start() -> Self {
        Position::new(1, 1)
    }

    /// Advance past a single character, tracking line breaks.
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Position::new(self.line + 1, 1)
        } else {
            Position::new(self.line, self.column + 1)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
