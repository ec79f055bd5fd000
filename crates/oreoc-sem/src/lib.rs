//! Name resolution and type checking over a parsed tree.
//!
//! Neither pass mutates the tree built by `oreoc-syn`: each keeps its own
//! side table keyed by `NodeId` (scopes plus a use-site table from
//! resolution, expression types from checking) rather than annotating
//! tree nodes directly, so `oreoc-syn` stays ignorant of what consumes it.

mod resolve;
mod scope;
mod typecheck;
mod types;

use std::collections::HashMap;

use oreoc_syn::{NodeId, Tree};
use oreoc_util::CompileResult;

pub use resolve::{resolve, Bindings, Owner};
pub use scope::{EntryKind, Scope, ScopeEntry, Scopes};
pub use typecheck::{typecheck, Types};
pub use types::Type;

/// The result of running both passes over a tree: every binding, the
/// use-site table resolution produced, and every expression's type.
pub struct Analysis {
    pub scopes: Scopes,
    pub refs: HashMap<NodeId, Owner>,
    pub types: Types,
}

/// Resolve names, then type-check, in one call — the order `spec.md` §4
/// requires (semantic analysis never runs with an untyped scope, and type
/// checking never runs before every name in the program is resolved).
pub fn analyze(tree: &Tree, root: NodeId) -> CompileResult<Analysis> {
    let Bindings { mut scopes, refs } = resolve(tree, root)?;
    let types = typecheck(tree, root, &mut scopes)?;
    Ok(Analysis { scopes, refs, types })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Tree, NodeId) {
        let tokens = oreoc_lex::lex(source).unwrap();
        let table = oreoc_syn::RuleTable::load(oreoc_syn::DEFAULT_GRAMMAR).unwrap();
        oreoc_syn::parse(&tokens, &table).unwrap()
    }

    #[test]
    fn declares_and_types_a_simple_variable() {
        let (tree, root) = parse("program p begin var x := 1; x := x + 1; end");
        let analysis = analyze(&tree, root).unwrap();
        assert_eq!(analysis.scopes.global.get("x").unwrap().final_type(), Some(Type::Num));
    }

    #[test]
    fn use_before_declaration_is_a_semantic_error() {
        let (tree, root) = parse("program p begin x := 1; end");
        let err = analyze(&tree, root).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Semantic);
        assert!(err.message.contains("used before declaration"));
    }

    #[test]
    fn redeclaring_a_variable_is_a_semantic_error() {
        let (tree, root) = parse("program p begin var x; var x; end");
        let err = analyze(&tree, root).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Semantic);
        assert!(err.message.contains("already declared"));
    }

    #[test]
    fn self_reference_in_its_own_initializer_is_use_before_declaration() {
        let (tree, root) = parse("program p begin var x := x + 1; end");
        let err = analyze(&tree, root).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Semantic);
    }

    #[test]
    fn mismatched_types_in_arithmetic_is_a_type_error() {
        let (tree, root) = parse("program p begin var x := 1; var y := \"a\"; var z := x + y; end");
        let err = analyze(&tree, root).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Type);
    }

    #[test]
    fn string_concatenation_with_plus_is_allowed() {
        let (tree, root) = parse("program p begin var x := \"a\" + \"b\"; end");
        let analysis = analyze(&tree, root).unwrap();
        assert_eq!(analysis.scopes.global.get("x").unwrap().final_type(), Some(Type::Str));
    }

    #[test]
    fn while_condition_must_be_bool() {
        let (tree, root) = parse("program p begin while 1 var y; end; end");
        let err = analyze(&tree, root).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Type);
    }

    #[test]
    fn comparison_produces_a_bool_condition() {
        let (tree, root) = parse("program p begin var x := 1; while x < 10 x := x + 1; end; end");
        analyze(&tree, root).unwrap();
    }

    #[test]
    fn get_assigns_str_to_the_target_variable() {
        let (tree, root) = parse("program p begin var x; get x; end");
        let analysis = analyze(&tree, root).unwrap();
        assert_eq!(analysis.scopes.global.get("x").unwrap().final_type(), Some(Type::Str));
    }

    #[test]
    fn procedure_return_type_is_inferred_from_its_body() {
        let (tree, root) = parse("program p begin procedure f(NUM x) return x + 1; end; var y := f(2); end");
        let analysis = analyze(&tree, root).unwrap();
        assert_eq!(analysis.scopes.global.get("f").unwrap().return_type, Some(Type::Num));
        assert_eq!(analysis.scopes.global.get("y").unwrap().final_type(), Some(Type::Num));
    }

    #[test]
    fn a_variable_may_change_type_across_reassignments() {
        let (tree, root) = parse("program p begin var x := 1; x := \"a\"; var y := x; end");
        let analysis = analyze(&tree, root).unwrap();
        assert_eq!(analysis.scopes.global.get("y").unwrap().final_type(), Some(Type::Str));
    }

    #[test]
    fn calling_a_procedure_with_the_wrong_arity_is_a_semantic_error() {
        let (tree, root) = parse("program p begin procedure f(NUM x) return x; end; var y := f(); end");
        let err = analyze(&tree, root).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Semantic);
    }

    #[test]
    fn a_procedure_cannot_see_global_variables() {
        let (tree, root) =
            parse("program p begin var x := 1; procedure f() return x; end; var y := f(); end");
        let err = analyze(&tree, root).unwrap_err();
        assert_eq!(err.kind, oreoc_util::Kind::Semantic);
        assert!(err.message.contains("used before declaration"));
    }

    #[test]
    fn forward_reference_between_procedures_resolves() {
        let (tree, root) = parse(
            "program p begin procedure a(NUM n) return b(n); end; procedure b(NUM n) return n; end; var y := a(1); end",
        );
        analyze(&tree, root).unwrap();
    }

    proptest::proptest! {
        // Scope resolution (spec.md §8): any number of distinct variables,
        // each declared before it's used, always resolves — declaration
        // order is the only thing that matters, not how many there are.
        #[test]
        fn declaring_then_using_n_variables_always_resolves(n in 0usize..20) {
            let decls: String = (0..n).map(|i| format!("var v{i} := {i}; ")).collect();
            let uses: String = (0..n).map(|i| format!("print v{i}; ")).collect();
            let source = format!("program p begin {decls}{uses}end");
            let (tree, root) = parse(&source);
            let analysis = analyze(&tree, root).unwrap();
            proptest::prop_assert_eq!(analysis.scopes.global.len(), n);
        }
    }
}
