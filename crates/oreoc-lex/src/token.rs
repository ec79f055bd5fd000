use std::fmt;

use oreoc_util::Position;

/// A single lexical token.
///
/// Unlike a closed Rust `enum`-of-variants token type, `name` is a plain
/// string: the grammar loader and parser reference terminals by name out of
/// an arbitrary grammar file, so the token vocabulary is data, not part of
/// the Rust type system.
#[derive(Debug, Clone)]
pub struct Token {
    /// The token's category, e.g. `"ID"`, `"NUMBER"`, `":="`, `"WHILE"`.
    pub name: String,
    /// The token's literal text, when it carries one (identifiers, numbers,
    /// strings). Keywords and punctuation carry `None` — their `name`
    /// already says everything about them.
    pub attribute: Option<String>,
    pub position: Position,
    /// The full source line the token starts on, used by later stages to
    /// build a [`oreoc_util::Diagnostic`] without re-reading the file.
    pub context_line: String,
}

impl Token {
    pub fn new(
        name: impl Into<String>,
        attribute: Option<String>,
        position: Position,
        context_line: impl Into<String>,
    ) -> Self {
        Token {
            name: name.into(),
            attribute,
            position,
            context_line: context_line.into(),
        }
    }

    /// Text to show a user for this token: the attribute if there is one,
    /// otherwise the category name.
    pub fn display_text(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.name)
    }
}

/// Equality ignores `position`/`context_line` — two tokens that name and
/// spell the same thing are the same token for grammar-matching purposes,
/// regardless of where they came from.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.attribute == other.attribute
    }
}

impl Eq for Token {}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_text())
    }
}
