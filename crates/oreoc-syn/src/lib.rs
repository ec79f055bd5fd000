//! Loads a grammar file into a rule table and parses a token stream
//! against it, producing an arena-backed parse tree.

mod grammar;
mod parser;
mod tree;

pub use grammar::{Expansion, RuleTable, Symbol};
pub use parser::parse;
pub use tree::{Node, NodeContent, NodeId, Tree};

/// The grammar this workspace ships by default, instantiating the EBNF
/// sketch in `spec.md` §6. Used by the CLI when `--grammar` is omitted.
pub const DEFAULT_GRAMMAR: &str = include_str!("../../../grammars/oreo.grammar");

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        RuleTable::load(DEFAULT_GRAMMAR).unwrap()
    }

    #[test]
    fn default_grammar_loads() {
        let t = table();
        assert!(t.contains("p"));
        assert!(t.contains("bool"));
    }

    #[test]
    fn parses_minimal_program() {
        let tokens = oreoc_lex::lex("program p begin end").unwrap();
        let (tree, root) = parse(&tokens, &table()).unwrap();
        assert!(tree.is_non_terminal(root, "p"));
        let compound = tree.get_child(root, "compound").unwrap();
        assert!(tree.children(compound).is_empty());
    }

    #[test]
    fn parses_declaration_and_assignment() {
        let tokens = oreoc_lex::lex("program p begin var x := 1; x := x + 1; end").unwrap();
        let (tree, root) = parse(&tokens, &table()).unwrap();
        let compound = tree.get_child(root, "compound").unwrap();
        assert_eq!(tree.children(compound).len(), 2);
    }

    #[test]
    fn kleene_repetition_produces_one_statement_per_iteration() {
        let tokens = oreoc_lex::lex(
            "program p begin var a; var b; var c; end",
        )
        .unwrap();
        let (tree, root) = parse(&tokens, &table()).unwrap();
        let compound = tree.get_child(root, "compound").unwrap();
        assert_eq!(tree.children(compound).len(), 3);
        for &stmt in tree.children(compound) {
            assert!(tree.is_non_terminal(stmt, "statement"));
            assert!(tree.get_child(stmt, "v").is_some());
        }
    }

    #[test]
    fn comparison_condition_parses_via_bool_cmp() {
        let tokens = oreoc_lex::lex("program p begin while x < 10 var y; end; end").unwrap();
        let (tree, root) = parse(&tokens, &table()).unwrap();
        let compound = tree.get_child(root, "compound").unwrap();
        let stmt = tree.children(compound)[0];
        let w = tree.get_child(stmt, "w").unwrap();
        let bool_node = tree.get_child(w, "bool").unwrap();
        let simple_expr = tree.get_child(bool_node, "simple_expr").unwrap();
        assert!(tree.is_non_terminal(simple_expr, "simple_expr"));
        let bool_cmp = tree.get_child(bool_node, "bool_cmp").unwrap();
        assert!(tree.has_child(bool_cmp, "relative_operator"));
        assert!(tree.has_child(bool_cmp, "expression"));
    }

    #[test]
    fn missing_end_is_a_parse_error_at_eof() {
        let tokens = oreoc_lex::lex("program p begin").unwrap();
        let err = parse(&tokens, &table()).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Parse);
        assert!(err.message.contains("end of file"));
    }

    #[test]
    fn wrong_token_is_a_parse_error() {
        let tokens = oreoc_lex::lex("program p start end").unwrap();
        let err = parse(&tokens, &table()).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Parse);
    }

    #[test]
    fn procedure_definition_parses_typed_arguments() {
        let tokens =
            oreoc_lex::lex("program p begin procedure f(NUM x, STR y) end; end").unwrap();
        let (tree, root) = parse(&tokens, &table()).unwrap();
        let compound = tree.get_child(root, "compound").unwrap();
        let stmt = tree.children(compound)[0];
        assert!(tree.get_child(stmt, "function_definition").is_some());
    }

    proptest::proptest! {
        // Determinism (spec.md §5/§8): parsing the same token stream twice
        // must produce the same tree shape, and Kleene-star repetition must
        // yield exactly one statement per repeated declaration.
        #[test]
        fn kleene_repetition_count_is_deterministic(n in 0usize..20) {
            let decls: String = (0..n).map(|i| format!("var v{i}; ")).collect();
            let source = format!("program p begin {decls}end");
            let tokens = oreoc_lex::lex(&source).unwrap();

            let (tree_a, root_a) = parse(&tokens, &table()).unwrap();
            let (tree_b, root_b) = parse(&tokens, &table()).unwrap();

            let count_a = tree_a.children(tree_a.get_child(root_a, "compound").unwrap()).len();
            let count_b = tree_b.children(tree_b.get_child(root_b, "compound").unwrap()).len();
            proptest::prop_assert_eq!(count_a, n);
            proptest::prop_assert_eq!(count_a, count_b);
        }
    }
}
