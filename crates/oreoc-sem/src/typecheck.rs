//! Bottom-up type assignment over the precedence chain, per `spec.md`
//! §4.5: every expression node's type is computed from its children's
//! types before its parent is visited, and a procedure's return type is
//! inferred from its own `return` statements rather than declared.
//!
//! `owner` is threaded through exactly as it was during name resolution —
//! a variable's scope here is always the one resolution already proved it
//! lives in, so there's no need to consult the name-resolution side table
//! to find it again.

use std::collections::{HashMap, HashSet};

use oreoc_lex::Token;
use oreoc_syn::{NodeContent, NodeId, Tree};
use oreoc_util::{CompileResult, Diagnostic, Kind};

use crate::resolve::Owner;
use crate::scope::Scopes;
use crate::types::Type;

/// Every expression (and procedure-call) node's inferred type, keyed for
/// the CLI's `--print-type` pretty-printer.
pub type Types = HashMap<NodeId, Type>;

pub fn typecheck(tree: &Tree, root: NodeId, scopes: &mut Scopes) -> CompileResult<Types> {
    let mut types = Types::new();
    let compound = tree.get_child(root, "compound").unwrap();
    let statements = tree.children(compound).to_vec();

    // Procedures are checked, in declaration order, before the rest of the
    // program — a call site sees an already-settled return type unless it
    // calls a procedure defined later or mutually recursive with its own,
    // in which case it conservatively types as `Type::Void` (see
    // `DESIGN.md`).
    let mut done = HashSet::new();
    for &stmt in &statements {
        if let Some(def) = tree.get_child(stmt, "function_definition") {
            typecheck_function(tree, def, scopes, &mut types, &mut done)?;
            done.insert(def);
        }
    }

    for &stmt in &statements {
        let mut discarded = None;
        typecheck_statement(tree, stmt, &None, scopes, &mut types, &mut done, &mut discarded)?;
    }

    tracing::debug!(nodes_typed = types.len(), "type checking complete");
    Ok(types)
}

fn typecheck_function(
    tree: &Tree,
    def: NodeId,
    scopes: &mut Scopes,
    types: &mut Types,
    done: &mut HashSet<NodeId>,
) -> CompileResult<()> {
    let id_paren = tree.get_child(def, "ID_PAREN").unwrap();
    let name = tree.matched_token(id_paren).unwrap().attribute.clone().unwrap();
    let owner = Some(name.clone());

    let mut return_type: Option<Type> = None;
    let body = tree.get_child(def, "function_compound").unwrap();
    for &stmt in &tree.children(body).to_vec() {
        typecheck_statement(tree, stmt, &owner, scopes, types, done, &mut return_type)?;
    }

    let resolved = return_type.unwrap_or(Type::Void);
    scopes.global.get_mut(&name).unwrap().return_type = Some(resolved);
    Ok(())
}

fn typecheck_statement(
    tree: &Tree,
    stmt: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    types: &mut Types,
    done: &mut HashSet<NodeId>,
    return_type: &mut Option<Type>,
) -> CompileResult<()> {
    if let Some(v) = tree.get_child(stmt, "v") {
        return typecheck_var_decl(tree, v, owner, scopes, types);
    }
    if let Some(a) = tree.get_child(stmt, "a") {
        return typecheck_assignment(tree, a, owner, scopes, types);
    }
    if let Some(pr) = tree.get_child(stmt, "pr") {
        return typecheck_print_or_get(tree, pr, owner, scopes, types);
    }
    if let Some(i) = tree.get_child(stmt, "i") {
        return typecheck_if(tree, i, owner, scopes, types, done, return_type);
    }
    if let Some(w) = tree.get_child(stmt, "w") {
        return typecheck_while(tree, w, owner, scopes, types, done, return_type);
    }
    if let Some(def) = tree.get_child(stmt, "function_definition") {
        if !done.contains(&def) {
            typecheck_function(tree, def, scopes, types, done)?;
            done.insert(def);
        }
        return Ok(());
    }
    if let Some(ret) = tree.get_child(stmt, "return_statement") {
        return typecheck_return(tree, ret, owner, scopes, types, return_type);
    }
    Ok(())
}

fn typecheck_var_decl(tree: &Tree, v: NodeId, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<()> {
    let id_node = tree.get_child(v, "ID").unwrap();
    let token = tree.matched_token(id_node).unwrap().clone();
    let name = token.attribute.clone().unwrap();

    if let Some(opt) = tree.get_child(v, "optional_var_assign") {
        let assign = tree.get_child(opt, "var_assign").unwrap();
        let expr = tree.get_child(assign, "expression").unwrap();
        let ty = typecheck_expression(tree, expr, owner, scopes, types)?;
        scopes.scope_mut(owner).get_mut(&name).unwrap().assign(token.position, ty);
    }
    Ok(())
}

/// An assignment's type is recorded at its own position, not locked to
/// whatever type an earlier assignment settled on — a variable may
/// legally change type across reassignments at different points in the
/// same scope (see `DESIGN.md`).
fn typecheck_assignment(tree: &Tree, a: NodeId, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<()> {
    let id_node = tree.get_child(a, "ID").unwrap();
    let token = tree.matched_token(id_node).unwrap().clone();
    let name = token.attribute.clone().unwrap();

    let expr = tree.get_child(a, "expression").unwrap();
    let rhs_ty = typecheck_expression(tree, expr, owner, scopes, types)?;

    scopes.scope_mut(owner).get_mut(&name).unwrap().assign(token.position, rhs_ty);
    types.insert(id_node, rhs_ty);
    Ok(())
}

fn typecheck_print_or_get(tree: &Tree, pr: NodeId, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<()> {
    if let Some(expr) = tree.get_child(pr, "expression") {
        typecheck_expression(tree, expr, owner, scopes, types)?;
        return Ok(());
    }
    if let Some(id_node) = tree.get_child(pr, "ID") {
        let token = tree.matched_token(id_node).unwrap().clone();
        let name = token.attribute.clone().unwrap();
        scopes.scope_mut(owner).get_mut(&name).unwrap().assign(token.position, Type::Str);
        types.insert(id_node, Type::Str);
    }
    Ok(())
}

fn typecheck_if(
    tree: &Tree,
    i: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    types: &mut Types,
    done: &mut HashSet<NodeId>,
    return_type: &mut Option<Type>,
) -> CompileResult<()> {
    let condition = tree.get_child(i, "bool").unwrap();
    let cond_ty = typecheck_bool(tree, condition, owner, scopes, types)?;
    if cond_ty != Type::Bool {
        return Err(type_error(
            leftmost_token(tree, condition),
            format!("condition must be bool, found {cond_ty}"),
        ));
    }

    let compound = tree.get_child(i, "compound").unwrap();
    for &stmt in &tree.children(compound).to_vec() {
        typecheck_statement(tree, stmt, owner, scopes, types, done, return_type)?;
    }

    if let Some(else_node) = tree.get_child(i, "optional_else") {
        let else_compound = tree.get_child(else_node, "compound").unwrap();
        for &stmt in &tree.children(else_compound).to_vec() {
            typecheck_statement(tree, stmt, owner, scopes, types, done, return_type)?;
        }
    }
    Ok(())
}

fn typecheck_while(
    tree: &Tree,
    w: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    types: &mut Types,
    done: &mut HashSet<NodeId>,
    return_type: &mut Option<Type>,
) -> CompileResult<()> {
    let condition = tree.get_child(w, "bool").unwrap();
    let cond_ty = typecheck_bool(tree, condition, owner, scopes, types)?;
    if cond_ty != Type::Bool {
        return Err(type_error(
            leftmost_token(tree, condition),
            format!("condition must be bool, found {cond_ty}"),
        ));
    }

    let compound = tree.get_child(w, "compound").unwrap();
    for &stmt in &tree.children(compound).to_vec() {
        typecheck_statement(tree, stmt, owner, scopes, types, done, return_type)?;
    }
    Ok(())
}

fn typecheck_return(
    tree: &Tree,
    ret: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    types: &mut Types,
    return_type: &mut Option<Type>,
) -> CompileResult<()> {
    let expr = tree
        .get_child(ret, "optional_expr")
        .and_then(|opt| tree.get_child(opt, "expression"));
    let ty = match expr {
        Some(e) => typecheck_expression(tree, e, owner, scopes, types)?,
        None => Type::Void,
    };
    if let Some(existing) = *return_type {
        if existing != ty {
            return Err(type_error(
                leftmost_token(tree, ret),
                format!("returns both {existing} and {ty} from the same procedure"),
            ));
        }
    }
    *return_type = Some(ty);
    Ok(())
}

fn typecheck_expression(tree: &Tree, node: NodeId, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<Type> {
    let bool_node = tree.get_child(node, "bool").unwrap();
    let bool_ty = typecheck_bool(tree, bool_node, owner, scopes, types)?;
    let ty = match tree.get_child(node, "and_or_b") {
        Some(tail) => typecheck_and_or_tail(tree, tail, bool_ty, owner, scopes, types)?,
        None => bool_ty,
    };
    types.insert(node, ty);
    Ok(ty)
}

fn typecheck_and_or_tail(
    tree: &Tree,
    tail: NodeId,
    left: Type,
    owner: &Owner,
    scopes: &mut Scopes,
    types: &mut Types,
) -> CompileResult<Type> {
    if left != Type::Bool {
        return Err(type_error(
            leftmost_token(tree, tail),
            format!("'and'/'or' needs bool operands, found {left}"),
        ));
    }
    let rhs_bool = tree.get_child(tail, "bool").unwrap();
    let rhs_ty = typecheck_bool(tree, rhs_bool, owner, scopes, types)?;
    if rhs_ty != Type::Bool {
        return Err(type_error(
            leftmost_token(tree, rhs_bool),
            format!("'and'/'or' needs bool operands, found {rhs_ty}"),
        ));
    }
    match tree.get_child(tail, "and_or_b") {
        Some(next) => typecheck_and_or_tail(tree, next, Type::Bool, owner, scopes, types),
        None => Ok(Type::Bool),
    }
}

fn typecheck_bool(tree: &Tree, node: NodeId, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<Type> {
    let ty = if tree.has_child(node, "NOT") {
        let inner = tree.get_child(node, "bool").unwrap();
        let inner_ty = typecheck_bool(tree, inner, owner, scopes, types)?;
        if inner_ty != Type::Bool {
            return Err(type_error(
                leftmost_token(tree, inner),
                format!("'not' needs a bool operand, found {inner_ty}"),
            ));
        }
        Type::Bool
    } else {
        let simple = tree.get_child(node, "simple_expr").unwrap();
        let simple_ty = typecheck_simple_expr(tree, simple, owner, scopes, types)?;
        match tree.get_child(node, "bool_cmp") {
            Some(cmp) => typecheck_bool_cmp(tree, cmp, simple_ty, owner, scopes, types)?,
            None => simple_ty,
        }
    };
    types.insert(node, ty);
    Ok(ty)
}

/// `bool_cmp`'s presence is what distinguishes a comparison (always
/// `Bool`) from a plain value passed through unchanged — the resolution
/// of the ambiguity `DESIGN.md` records for this nonterminal.
fn typecheck_bool_cmp(tree: &Tree, cmp: NodeId, left: Type, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<Type> {
    let op = relative_operator_of(tree, cmp);
    let rhs = tree.get_child(cmp, "expression").unwrap();
    let rhs_ty = typecheck_expression(tree, rhs, owner, scopes, types)?;
    let ok = if op == "==" {
        left == rhs_ty
    } else {
        left == rhs_ty && matches!(left, Type::Num | Type::Str)
    };
    if !ok {
        return Err(type_error(leftmost_token(tree, cmp), format!("cannot compare {left} and {rhs_ty}")));
    }
    Ok(Type::Bool)
}

fn relative_operator_of(tree: &Tree, cmp: NodeId) -> &'static str {
    let op_node = tree.get_child(cmp, "relative_operator").unwrap();
    for op in ["<=", ">=", "==", "<", ">"] {
        if tree.has_child(op_node, op) {
            return op;
        }
    }
    unreachable!("relative_operator always matches one of its alternatives")
}

fn typecheck_simple_expr(tree: &Tree, node: NodeId, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<Type> {
    let term = tree.get_child(node, "term").unwrap();
    let term_ty = typecheck_term(tree, term, owner, scopes, types)?;
    let ty = match tree.get_child(node, "add_sub") {
        Some(tail) => typecheck_add_sub_tail(tree, tail, term_ty, owner, scopes, types)?,
        None => term_ty,
    };
    types.insert(node, ty);
    Ok(ty)
}

fn typecheck_add_sub_tail(tree: &Tree, tail: NodeId, left: Type, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<Type> {
    let op = if tree.has_child(tail, "+") { "+" } else { "-" };
    let term = tree.get_child(tail, "term").unwrap();
    let term_ty = typecheck_term(tree, term, owner, scopes, types)?;
    let combined = match (op, left, term_ty) {
        ("+", Type::Str, Type::Str) => Type::Str,
        (_, Type::Num, Type::Num) => Type::Num,
        _ => {
            return Err(type_error(
                leftmost_token(tree, tail),
                format!("cannot apply '{op}' to {left} and {term_ty}"),
            ))
        }
    };
    match tree.get_child(tail, "add_sub") {
        Some(next) => typecheck_add_sub_tail(tree, next, combined, owner, scopes, types),
        None => Ok(combined),
    }
}

fn typecheck_term(tree: &Tree, node: NodeId, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<Type> {
    let factor = tree.get_child(node, "factor").unwrap();
    let factor_ty = typecheck_factor(tree, factor, owner, scopes, types)?;
    let ty = match tree.get_child(node, "mul_div") {
        Some(tail) => typecheck_mul_div_tail(tree, tail, factor_ty, owner, scopes, types)?,
        None => factor_ty,
    };
    types.insert(node, ty);
    Ok(ty)
}

fn typecheck_mul_div_tail(tree: &Tree, tail: NodeId, left: Type, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<Type> {
    let op = if tree.has_child(tail, "*") { "*" } else { "/" };
    let factor = tree.get_child(tail, "factor").unwrap();
    let factor_ty = typecheck_factor(tree, factor, owner, scopes, types)?;
    if left != Type::Num || factor_ty != Type::Num {
        return Err(type_error(
            leftmost_token(tree, tail),
            format!("cannot apply '{op}' to {left} and {factor_ty}"),
        ));
    }
    match tree.get_child(tail, "mul_div") {
        Some(next) => typecheck_mul_div_tail(tree, next, Type::Num, owner, scopes, types),
        None => Ok(Type::Num),
    }
}

fn typecheck_factor(tree: &Tree, node: NodeId, owner: &Owner, scopes: &mut Scopes, types: &mut Types) -> CompileResult<Type> {
    let ty = if tree.has_child(node, "NUMBER") {
        Type::Num
    } else if tree.has_child(node, "STRING") {
        Type::Str
    } else if tree.has_child(node, "TRUE") || tree.has_child(node, "FALSE") {
        Type::Bool
    } else if let Some(id_node) = tree.get_child(node, "ID") {
        let token = tree.matched_token(id_node).unwrap().clone();
        let name = token.attribute.clone().unwrap();
        let ty = scopes
            .scope(owner)
            .get(&name)
            .and_then(|e| e.type_at(token.position))
            .ok_or_else(|| type_error(&token, format!("cannot determine the type of '{name}' yet")))?;
        types.insert(id_node, ty);
        ty
    } else if let Some(id_paren) = tree.get_child(node, "ID_PAREN") {
        let token = tree.matched_token(id_paren).unwrap().clone();
        let name = token.attribute.clone().unwrap();
        if let Some(call_args) = tree.get_child(node, "call_args") {
            typecheck_call_args(tree, call_args, &name, owner, scopes, types)?;
        }
        let ty = scopes.global.get(&name).and_then(|e| e.return_type).unwrap_or(Type::Void);
        types.insert(id_paren, ty);
        ty
    } else if let Some(expr) = tree.get_child(node, "expression") {
        typecheck_expression(tree, expr, owner, scopes, types)?
    } else {
        unreachable!("factor always matches one of its alternatives")
    };
    types.insert(node, ty);
    Ok(ty)
}

fn typecheck_call_args(
    tree: &Tree,
    call_args: NodeId,
    proc_name: &str,
    owner: &Owner,
    scopes: &mut Scopes,
    types: &mut Types,
) -> CompileResult<()> {
    let params = scopes.global.get(proc_name).map(|e| e.params.clone()).unwrap_or_default();
    let mut index = 0usize;
    let mut current = Some(call_args);
    while let Some(node) = current {
        let expr = tree.get_child(node, "expression").unwrap();
        let arg_ty = typecheck_expression(tree, expr, owner, scopes, types)?;
        if let Some(&expected) = params.get(index) {
            if expected != arg_ty {
                return Err(type_error(
                    leftmost_token(tree, expr),
                    format!("argument {} to '{proc_name}' should be {expected}, found {arg_ty}", index + 1),
                ));
            }
        }
        index += 1;
        current = tree.get_child(node, "later_call_arg");
    }
    Ok(())
}

/// The first matched token under `node`, used to anchor a type error at a
/// sensible position when the failing check spans several children
/// instead of a single terminal.
fn leftmost_token<'t>(tree: &'t Tree, node: NodeId) -> &'t Token {
    match &tree.node(node).content {
        NodeContent::Terminal { matched: Some(tok), .. } => tok,
        NodeContent::Terminal { matched: None, .. } => unreachable!("node already parsed"),
        NodeContent::NonTerminal { .. } => {
            let first = *tree.children(node).first().expect("a parsed nonterminal has a child");
            leftmost_token(tree, first)
        }
    }
}

fn type_error(token: &Token, message: String) -> Diagnostic {
    Diagnostic::new(Kind::Type, token.position, message, token.context_line.clone())
}
