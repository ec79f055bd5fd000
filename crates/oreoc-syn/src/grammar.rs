use indexmap::IndexMap;
use oreoc_util::{CompileResult, Diagnostic, Kind, Position};

/// One symbol on the right-hand side of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// Matched by token name, e.g. `"IF"` or `";"`.
    Terminal(String),
    /// Matched by recursively expanding another nonterminal. `kleene`
    /// marks a `name*` repetition.
    NonTerminal { name: String, kleene: bool },
}

/// One alternative right-hand side. An empty vector is the epsilon
/// (empty) production.
pub type Expansion = Vec<Symbol>;

/// The rule table loaded from a grammar file: every nonterminal maps to
/// the ordered list of alternatives a program may expand it into.
///
/// Backed by `IndexMap` rather than a plain hash map so iteration (used
/// only for diagnostics) is deterministic, matching the determinism
/// invariant in `spec.md` §5.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: IndexMap<String, Vec<Expansion>>,
}

impl RuleTable {
    pub fn alternatives(&self, nonterminal: &str) -> Option<&[Expansion]> {
        self.rules.get(nonterminal).map(|v| v.as_slice())
    }

    pub fn contains(&self, nonterminal: &str) -> bool {
        self.rules.contains_key(nonterminal)
    }

    /// Parse a grammar file of the form `name -> alt1 | alt2 | ...`, one
    /// rule per line, `#` starting a comment, `"X"` a terminal, a bare
    /// word a nonterminal (optionally `*`-suffixed for zero-or-more), and
    /// the bare symbol `ε` the epsilon alternative.
    pub fn load(text: &str) -> CompileResult<RuleTable> {
        let mut rules: IndexMap<String, Vec<Expansion>> = IndexMap::new();

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            let (lhs, rhs) = line.split_once("->").ok_or_else(|| {
                grammar_error(line_no, raw_line, "expected '->' in rule")
            })?;
            let lhs = lhs.trim().to_string();
            let mut expansions = Vec::new();
            for alt_text in rhs.split('|') {
                expansions.push(parse_alternative(alt_text, line_no, raw_line)?);
            }
            rules.insert(lhs, expansions);
        }

        validate(&rules, text)?;
        Ok(RuleTable { rules })
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_alternative(alt_text: &str, line_no: usize, raw_line: &str) -> CompileResult<Expansion> {
    let trimmed = alt_text.trim();
    if trimmed == "ε" {
        return Ok(Vec::new());
    }
    let mut symbols = Vec::new();
    for word in trimmed.split_whitespace() {
        if let Some(term) = word.strip_prefix('"').and_then(|w| w.strip_suffix('"')) {
            symbols.push(Symbol::Terminal(term.to_string()));
        } else if let Some(name) = word.strip_suffix('*') {
            symbols.push(Symbol::NonTerminal {
                name: name.to_string(),
                kleene: true,
            });
        } else {
            symbols.push(Symbol::NonTerminal {
                name: word.to_string(),
                kleene: false,
            });
        }
    }
    if symbols.is_empty() {
        return Err(grammar_error(line_no, raw_line, "empty alternative"));
    }
    Ok(symbols)
}

fn validate(rules: &IndexMap<String, Vec<Expansion>>, text: &str) -> CompileResult<()> {
    for expansions in rules.values() {
        for expansion in expansions {
            for symbol in expansion {
                if let Symbol::NonTerminal { name, .. } = symbol {
                    if !rules.contains_key(name) {
                        return Err(Diagnostic::new(
                            Kind::Parse,
                            Position::start(),
                            format!("grammar references undefined nonterminal '{name}'"),
                            text.lines().next().unwrap_or("").to_string(),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

fn grammar_error(line_no: usize, raw_line: &str, message: &str) -> Diagnostic {
    Diagnostic::new(
        Kind::Parse,
        Position::new((line_no + 1) as u32, 1),
        message.to_string(),
        raw_line.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_simple_grammar() {
        let table = RuleTable::load("p -> \"A\" q\nq -> \"B\" | ε\n").unwrap();
        assert!(table.contains("p"));
        assert_eq!(table.alternatives("q").unwrap().len(), 2);
    }

    #[test]
    fn kleene_suffix_is_recognised() {
        let table = RuleTable::load("compound -> statement*\nstatement -> \"X\"\n").unwrap();
        let alt = &table.alternatives("compound").unwrap()[0];
        assert_eq!(
            alt[0],
            Symbol::NonTerminal {
                name: "statement".to_string(),
                kleene: true
            }
        );
    }

    #[test]
    fn undefined_nonterminal_is_rejected() {
        let err = RuleTable::load("p -> missing\n").unwrap_err();
        assert!(err.message.contains("undefined nonterminal"));
    }
}
