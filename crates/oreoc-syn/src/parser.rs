use oreoc_lex::Token;
use oreoc_util::{CompileResult, Diagnostic, Kind, Position};

use crate::grammar::{RuleTable, Symbol};
use crate::tree::{NodeContent, NodeId, Tree};

/// Parse a token stream against a grammar, per `spec.md` §4.3.
///
/// The root nonterminal is always named `p`. Parsing proceeds by
/// depth-first-searching the (growing) tree for the next unprocessed node:
/// a nonterminal is expanded by picking the first alternative whose
/// leftmost symbol's first set contains the next token; a terminal is
/// matched directly against it. There is no backtracking once a choice is
/// made and no error recovery past the first failure.
pub fn parse(tokens: &[Token], table: &RuleTable) -> CompileResult<(Tree, NodeId)> {
    tracing::trace!(tokens = tokens.len(), "parse starting");
    let mut tree = Tree::new();
    let root = tree.new_root("p");
    let mut pos = 0usize;
    let mut last_seen: Option<Token> = None;

    loop {
        let node_id = match tree.next_unprocessed(root) {
            Some(id) => id,
            None => {
                if pos < tokens.len() {
                    let tok = &tokens[pos];
                    return Err(Diagnostic::new(
                        Kind::Parse,
                        tok.position,
                        format!("expected end of file, found '{}'", tok.display_text()),
                        tok.context_line.clone(),
                    ));
                }
                break;
            }
        };

        let is_nonterminal = matches!(tree.node(node_id).content, NodeContent::NonTerminal { .. });

        let Some(current) = tokens.get(pos) else {
            return Err(eof_error(last_seen.as_ref(), &tree, node_id));
        };
        last_seen = Some(current.clone());

        if is_nonterminal {
            expand(&mut tree, node_id, current, table)?;
        } else {
            match_terminal(&mut tree, node_id, current)?;
            pos += 1;
        }
    }

    tracing::debug!(consumed = pos, "parse complete");
    Ok((tree, root))
}

fn eof_error(last: Option<&Token>, tree: &Tree, node_id: NodeId) -> Diagnostic {
    let expected = tree.node(node_id).content.label().to_string();
    match last {
        Some(tok) => {
            let column = tok.context_line.trim_end().len() as u32 + 1;
            Diagnostic::new(
                Kind::Parse,
                Position::new(tok.position.line, column),
                format!("expected '{expected}', found end of file"),
                tok.context_line.clone(),
            )
        }
        None => Diagnostic::new(
            Kind::Parse,
            Position::start(),
            format!("expected '{expected}', found end of file (empty input)"),
            String::new(),
        ),
    }
}

fn match_terminal(tree: &mut Tree, node_id: NodeId, token: &Token) -> CompileResult<()> {
    let expected = match &tree.node(node_id).content {
        NodeContent::Terminal { expected, .. } => expected.clone(),
        NodeContent::NonTerminal { .. } => unreachable!("caller already checked"),
    };
    if token.name == expected {
        tree.node_mut(node_id).content = NodeContent::Terminal {
            expected,
            matched: Some(token.clone()),
        };
        tree.mark_processed(node_id);
        Ok(())
    } else {
        Err(Diagnostic::new(
            Kind::Parse,
            token.position,
            format!("expected '{expected}', found '{}'", token.display_text()),
            token.context_line.clone(),
        ))
    }
}

fn expand(tree: &mut Tree, node_id: NodeId, next: &Token, table: &RuleTable) -> CompileResult<()> {
    let (name, kleene) = match &tree.node(node_id).content {
        NodeContent::NonTerminal { name, kleene } => (name.clone(), *kleene),
        NodeContent::Terminal { .. } => unreachable!("caller already checked"),
    };

    match find_expansion(&name, next, table) {
        None => {
            if kleene {
                tree.destroy(node_id);
                Ok(())
            } else {
                Err(Diagnostic::new(
                    Kind::Parse,
                    next.position,
                    format!("expected '{name}', found '{}'", next.display_text()),
                    next.context_line.clone(),
                ))
            }
        }
        Some(rhs) => {
            tree.mark_processed(node_id);
            if kleene {
                tree.duplicate_kleene_sibling(node_id);
            }
            match rhs {
                Some(symbols) => {
                    for symbol in symbols {
                        tree.add_child(node_id, symbol);
                    }
                }
                None => tree.destroy(node_id),
            }
            Ok(())
        }
    }
}

/// The first-set oracle: does `nonterminal`'s first alternative whose
/// leftmost symbol can start `next` exist? Epsilon alternatives are tried
/// last regardless of where they appear in the rule, so a real match is
/// always preferred over falling through to "matches nothing".
///
/// `None` means no alternative matches at all (a hard parse error, unless
/// the caller is a Kleene nonterminal, in which case it just means "stop
/// repeating"). `Some(None)` means the epsilon alternative was chosen.
/// `Some(Some(rhs))` carries the chosen right-hand side.
fn find_expansion<'t>(
    nonterminal: &str,
    next: &Token,
    table: &'t RuleTable,
) -> Option<Option<&'t [Symbol]>> {
    let alternatives = table.alternatives(nonterminal)?;
    let mut saw_epsilon = false;
    for alternative in alternatives {
        if alternative.is_empty() {
            saw_epsilon = true;
            continue;
        }
        let leftmost_can_start = match &alternative[0] {
            Symbol::Terminal(name) => name == &next.name,
            Symbol::NonTerminal { name, .. } => find_expansion(name, next, table).is_some(),
        };
        if leftmost_can_start {
            return Some(Some(alternative.as_slice()));
        }
    }
    if saw_epsilon {
        Some(None)
    } else {
        None
    }
}
