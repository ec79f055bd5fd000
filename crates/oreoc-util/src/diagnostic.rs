use std::fmt;

use colored::Colorize;

use crate::Position;

/// Which pipeline stage raised a [`Diagnostic`]. Purely informational — all
/// four kinds share the same rendered shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Lex,
    Parse,
    Semantic,
    Type,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Lex => "lex error",
            Kind::Parse => "parse error",
            Kind::Semantic => "semantic error",
            Kind::Type => "type error",
        };
        f.write_str(name)
    }
}

/// The single error type produced anywhere in the pipeline: a kind, a
/// position, a human message, and the source line the position falls on.
///
/// Every stage stops at the first `Diagnostic` it produces — there is no
/// error recovery past that point, so this type doubles as the compiler's
/// only error representation (it implements [`std::error::Error`] directly
/// rather than being wrapped per-crate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: Kind,
    pub position: Position,
    pub message: String,
    pub context_line: String,
}

impl Diagnostic {
    pub fn new(
        kind: Kind,
        position: Position,
        message: impl Into<String>,
        context_line: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            position,
            message: message.into(),
            context_line: context_line.into(),
        }
    }

    /// Render the diagnostic as `spec.md` §4.7 describes: the kind/
    /// position/message header, then the offending line, then a caret
    /// (`↑`) under the column. Colour is applied only when `color` is
    /// true — callers gate this on `std::io::IsTerminal` so piped output
    /// stays plain.
    pub fn render(&self, color: bool) -> String {
        let caret_col = self.position.column.saturating_sub(1) as usize;
        let caret_line = format!("{}↑", " ".repeat(caret_col));
        let header = format!("{} on line {}: {}", self.kind, self.position, self.message);
        if color {
            format!(
                "{}\n{}\n{}",
                header.red().bold(),
                self.context_line,
                caret_line.cyan()
            )
        } else {
            format!("{}\n{}\n{}", header, self.context_line, caret_line)
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

impl std::error::Error for Diagnostic {}
