/// Word keywords, matched only at a word boundary (not followed by another
/// identifier character) so `whiletrue` lexes as one `ID`, not `WHILE` +
/// `ID`.
///
/// `num`/`str`/`bool` are not listed in the distilled grammar description
/// but are required for typed procedure arguments (`procedure f(NUM x)`) to
/// parse and type-check at all — see `DESIGN.md`.
pub const KEYWORDS: &[(&str, &str)] = &[
    ("program", "PROGRAM"),
    ("begin", "BEGIN"),
    ("end", "END"),
    ("var", "VAR"),
    ("print", "PRINT"),
    ("println", "PRINTLN"),
    ("get", "GET"),
    ("while", "WHILE"),
    ("if", "IF"),
    ("then", "THEN"),
    ("else", "ELSE"),
    ("or", "OR"),
    ("and", "AND"),
    ("not", "NOT"),
    ("true", "TRUE"),
    ("false", "FALSE"),
    ("procedure", "PROCEDURE"),
    ("return", "RETURN"),
    ("num", "NUM"),
    ("str", "STR"),
    ("bool", "BOOL"),
];

pub fn lookup(word: &str) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == word)
        .map(|(_, name)| *name)
}
