//! Name resolution: declare-before-use and single-declaration, enforced in
//! one linear walk with no backtracking, per `spec.md` §4.4.
//!
//! Procedures are the one exception to "declare before use" — every
//! procedure defined directly in the program's top-level body is
//! registered (name and parameter types) before any statement is walked,
//! so forward references and direct recursion both resolve. A procedure
//! nested inside an `if`/`while` block is registered inline, at the point
//! it's encountered, like a variable.

use std::collections::{HashMap, HashSet};

use oreoc_lex::Token;
use oreoc_syn::{NodeContent, NodeId, Tree};
use oreoc_util::{CompileResult, Diagnostic, Kind};

use crate::scope::{EntryKind, Scope, ScopeEntry, Scopes};

/// Which scope an identifier resolved against: `None` for the global
/// scope, `Some(name)` for the named procedure's local scope.
pub type Owner = Option<String>;

/// The result of a full resolution pass: every declared binding, plus a
/// side table recording which scope each `ID` use resolved in.
pub struct Bindings {
    pub scopes: Scopes,
    pub refs: HashMap<NodeId, Owner>,
}

pub fn resolve(tree: &Tree, root: NodeId) -> CompileResult<Bindings> {
    let mut scopes = Scopes::default();
    let mut refs = HashMap::new();

    let compound = tree
        .get_child(root, "compound")
        .expect("the grammar's root always has a compound child");
    let statements = tree.children(compound).to_vec();

    let mut hoisted = HashSet::new();
    for &stmt in &statements {
        if let Some(def) = tree.get_child(stmt, "function_definition") {
            register_function(tree, def, &mut scopes)?;
            hoisted.insert(def);
        }
    }

    for &stmt in &statements {
        resolve_statement(tree, stmt, &None, &mut scopes, &mut refs, &hoisted)?;
    }

    tracing::debug!(
        globals = scopes.global.len(),
        procedures = scopes.functions.len(),
        "name resolution complete"
    );
    Ok(Bindings { scopes, refs })
}

fn register_function(tree: &Tree, def_id: NodeId, scopes: &mut Scopes) -> CompileResult<()> {
    let id_paren = tree.get_child(def_id, "ID_PAREN").unwrap();
    let token = tree.matched_token(id_paren).unwrap().clone();
    let name = token.attribute.clone().unwrap();

    if scopes.global.contains_key(&name) {
        return Err(semantic_error(&token, format!("'{name}' is already declared")));
    }

    let mut local = Scope::new();
    let mut params = Vec::new();
    if let Some(args) = tree.get_child(def_id, "func_def_args") {
        collect_func_def_arg(tree, args, &mut local, &mut params)?;
    }

    scopes
        .global
        .insert(name.clone(), ScopeEntry::procedure(&name, token.position, params));
    scopes.functions.insert(name, local);
    Ok(())
}

fn collect_func_def_arg(
    tree: &Tree,
    node_id: NodeId,
    local: &mut Scope,
    params: &mut Vec<crate::types::Type>,
) -> CompileResult<()> {
    let arg_type_node = tree.get_child(node_id, "arg_type").unwrap();
    let ty = arg_type_of(tree, arg_type_node);
    let id_node = tree.get_child(node_id, "ID").unwrap();
    add_param(tree, id_node, ty, local, params)?;
    if let Some(later) = tree.get_child(node_id, "later_func_def_arg") {
        collect_func_def_arg(tree, later, local, params)?;
    }
    Ok(())
}

fn arg_type_of(tree: &Tree, arg_type_node: NodeId) -> crate::types::Type {
    for keyword in ["NUM", "STR", "BOOL"] {
        if tree.has_child(arg_type_node, keyword) {
            return crate::types::Type::from_arg_type(keyword).unwrap();
        }
    }
    unreachable!("arg_type always matches one of NUM/STR/BOOL")
}

fn add_param(
    tree: &Tree,
    id_node: NodeId,
    ty: crate::types::Type,
    local: &mut Scope,
    params: &mut Vec<crate::types::Type>,
) -> CompileResult<()> {
    let token = tree.matched_token(id_node).unwrap().clone();
    let name = token.attribute.clone().unwrap();
    if local.contains_key(&name) {
        return Err(semantic_error(&token, format!("parameter '{name}' is already declared")));
    }
    local.insert(name.clone(), ScopeEntry::parameter(&name, token.position, ty));
    params.push(ty);
    Ok(())
}

fn resolve_statement(
    tree: &Tree,
    stmt: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    refs: &mut HashMap<NodeId, Owner>,
    hoisted: &HashSet<NodeId>,
) -> CompileResult<()> {
    if let Some(v) = tree.get_child(stmt, "v") {
        return resolve_var_decl(tree, v, owner, scopes, refs);
    }
    if let Some(a) = tree.get_child(stmt, "a") {
        return resolve_assignment(tree, a, owner, scopes, refs);
    }
    if let Some(pr) = tree.get_child(stmt, "pr") {
        return resolve_print_or_get(tree, pr, owner, scopes, refs);
    }
    if let Some(i) = tree.get_child(stmt, "i") {
        return resolve_if(tree, i, owner, scopes, refs, hoisted);
    }
    if let Some(w) = tree.get_child(stmt, "w") {
        return resolve_while(tree, w, owner, scopes, refs, hoisted);
    }
    if let Some(def) = tree.get_child(stmt, "function_definition") {
        if !hoisted.contains(&def) {
            register_function(tree, def, scopes)?;
        }
        return resolve_function_body(tree, def, scopes, refs, hoisted);
    }
    if let Some(ret) = tree.get_child(stmt, "return_statement") {
        return resolve_return(tree, ret, owner, scopes, refs);
    }
    Ok(())
}

fn resolve_var_decl(
    tree: &Tree,
    v: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    refs: &mut HashMap<NodeId, Owner>,
) -> CompileResult<()> {
    let id_node = tree.get_child(v, "ID").unwrap();
    let token = tree.matched_token(id_node).unwrap().clone();
    let name = token.attribute.clone().unwrap();

    if let Some(opt) = tree.get_child(v, "optional_var_assign") {
        let assign = tree.get_child(opt, "var_assign").unwrap();
        let expr = tree.get_child(assign, "expression").unwrap();
        walk_expression(tree, expr, owner, scopes, refs)?;
    }

    let scope = scopes.scope_mut(owner);
    if scope.contains_key(&name) {
        return Err(semantic_error(&token, format!("variable '{name}' is already declared")));
    }
    tracing::trace!(name = %name, position = %token.position, "declared variable");
    scope.insert(name.clone(), ScopeEntry::variable(&name, token.position));
    Ok(())
}

fn resolve_assignment(
    tree: &Tree,
    a: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    refs: &mut HashMap<NodeId, Owner>,
) -> CompileResult<()> {
    let id_node = tree.get_child(a, "ID").unwrap();
    let token = tree.matched_token(id_node).unwrap().clone();
    let name = token.attribute.clone().unwrap();

    if !scopes.scope(owner).contains_key(&name) {
        return Err(semantic_error(&token, format!("variable '{name}' used before declaration")));
    }
    refs.insert(id_node, owner.clone());

    let expr = tree.get_child(a, "expression").unwrap();
    walk_expression(tree, expr, owner, scopes, refs)
}

fn resolve_print_or_get(
    tree: &Tree,
    pr: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    refs: &mut HashMap<NodeId, Owner>,
) -> CompileResult<()> {
    if let Some(expr) = tree.get_child(pr, "expression") {
        return walk_expression(tree, expr, owner, scopes, refs);
    }
    if let Some(id_node) = tree.get_child(pr, "ID") {
        let token = tree.matched_token(id_node).unwrap().clone();
        let name = token.attribute.clone().unwrap();
        if !scopes.scope(owner).contains_key(&name) {
            return Err(semantic_error(&token, format!("variable '{name}' used before declaration")));
        }
        refs.insert(id_node, owner.clone());
    }
    Ok(())
}

fn resolve_if(
    tree: &Tree,
    i: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    refs: &mut HashMap<NodeId, Owner>,
    hoisted: &HashSet<NodeId>,
) -> CompileResult<()> {
    let condition = tree.get_child(i, "bool").unwrap();
    walk_expression(tree, condition, owner, scopes, refs)?;

    let compound = tree.get_child(i, "compound").unwrap();
    for &stmt in &tree.children(compound).to_vec() {
        resolve_statement(tree, stmt, owner, scopes, refs, hoisted)?;
    }

    if let Some(else_node) = tree.get_child(i, "optional_else") {
        let else_compound = tree.get_child(else_node, "compound").unwrap();
        for &stmt in &tree.children(else_compound).to_vec() {
            resolve_statement(tree, stmt, owner, scopes, refs, hoisted)?;
        }
    }
    Ok(())
}

fn resolve_while(
    tree: &Tree,
    w: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    refs: &mut HashMap<NodeId, Owner>,
    hoisted: &HashSet<NodeId>,
) -> CompileResult<()> {
    let condition = tree.get_child(w, "bool").unwrap();
    walk_expression(tree, condition, owner, scopes, refs)?;

    let compound = tree.get_child(w, "compound").unwrap();
    for &stmt in &tree.children(compound).to_vec() {
        resolve_statement(tree, stmt, owner, scopes, refs, hoisted)?;
    }
    Ok(())
}

fn resolve_function_body(
    tree: &Tree,
    def: NodeId,
    scopes: &mut Scopes,
    refs: &mut HashMap<NodeId, Owner>,
    hoisted: &HashSet<NodeId>,
) -> CompileResult<()> {
    let id_paren = tree.get_child(def, "ID_PAREN").unwrap();
    let name = tree.matched_token(id_paren).unwrap().attribute.clone().unwrap();
    let owner = Some(name);

    let body = tree.get_child(def, "function_compound").unwrap();
    for &stmt in &tree.children(body).to_vec() {
        resolve_statement(tree, stmt, &owner, scopes, refs, hoisted)?;
    }
    Ok(())
}

fn resolve_return(
    tree: &Tree,
    ret: NodeId,
    owner: &Owner,
    scopes: &mut Scopes,
    refs: &mut HashMap<NodeId, Owner>,
) -> CompileResult<()> {
    if let Some(expr) = tree
        .get_child(ret, "optional_expr")
        .and_then(|opt| tree.get_child(opt, "expression"))
    {
        return walk_expression(tree, expr, owner, scopes, refs);
    }
    Ok(())
}

/// Recursively resolve every `ID`/`ID_PAREN` reference under `node`,
/// whatever nonterminal it is — the precedence chain (`expression` down to
/// `factor`) is walked generically rather than symbol-by-symbol, since
/// every stop on it is "recurse into every child" except the one place a
/// name actually gets looked up.
fn walk_expression(
    tree: &Tree,
    node: NodeId,
    owner: &Owner,
    scopes: &Scopes,
    refs: &mut HashMap<NodeId, Owner>,
) -> CompileResult<()> {
    match &tree.node(node).content {
        NodeContent::Terminal { expected, matched } => {
            if expected == "ID" {
                let token = matched.as_ref().expect("terminal already matched by parse time");
                let name = token.attribute.clone().unwrap();
                if !scopes.scope(owner).contains_key(&name) {
                    return Err(semantic_error(token, format!("variable '{name}' used before declaration")));
                }
                refs.insert(node, owner.clone());
            }
            Ok(())
        }
        NodeContent::NonTerminal { name, .. } => {
            if name == "factor" {
                if let Some(id_paren) = tree.get_child(node, "ID_PAREN") {
                    return resolve_call(tree, node, id_paren, owner, scopes, refs);
                }
            }
            for &child in tree.children(node).to_vec().iter() {
                walk_expression(tree, child, owner, scopes, refs)?;
            }
            Ok(())
        }
    }
}

fn resolve_call(
    tree: &Tree,
    factor: NodeId,
    id_paren: NodeId,
    owner: &Owner,
    scopes: &Scopes,
    refs: &mut HashMap<NodeId, Owner>,
) -> CompileResult<()> {
    let token = tree.matched_token(id_paren).unwrap().clone();
    let name = token.attribute.clone().unwrap();
    let arity = match scopes.global.get(&name) {
        Some(entry) if entry.kind == EntryKind::Procedure => entry.params.len(),
        Some(_) => return Err(semantic_error(&token, format!("'{name}' is not a procedure"))),
        None => return Err(semantic_error(&token, format!("procedure '{name}' used before declaration"))),
    };

    let call_args = tree.get_child(factor, "call_args");
    let args = call_args.map(|c| count_call_args(tree, c)).unwrap_or(0);
    if args != arity {
        return Err(semantic_error(
            &token,
            format!("'{name}' expects {arity} argument(s), found {args}"),
        ));
    }

    if let Some(c) = call_args {
        walk_expression(tree, c, owner, scopes, refs)?;
    }
    Ok(())
}

fn count_call_args(tree: &Tree, call_args: NodeId) -> usize {
    let mut count = 1;
    let mut current = tree.get_child(call_args, "later_call_arg");
    while let Some(node) = current {
        count += 1;
        current = tree.get_child(node, "later_call_arg");
    }
    count
}

fn semantic_error(token: &Token, message: String) -> Diagnostic {
    Diagnostic::new(Kind::Semantic, token.position, message, token.context_line.clone())
}
