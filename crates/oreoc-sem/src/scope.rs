//! Name bindings.
//!
//! A disjoint global scope plus one flat scope per procedure — no nested
//! block scopes, and a procedure cannot see the variables around its
//! definition. This is a deliberate departure from the teacher's
//! `RibId`-parented scope chain (see `DESIGN.md`): this language has no
//! closures and no block-local shadowing to chain over, so every `var`
//! declared anywhere in a procedure's body (including inside `if`/`while`
//! blocks) lands in that one scope.

use indexmap::IndexMap;
use oreoc_util::Position;

use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Variable,
    Parameter,
    Procedure,
}

#[derive(Debug, Clone)]
pub struct ScopeEntry {
    pub name: String,
    pub kind: EntryKind,
    pub declared_at: Position,
    /// Every assignment checked so far, in the order checked, each paired
    /// with the position it occurred at. A use resolves to the type of the
    /// most recent assignment at or before its own position — identifier
    /// typing is position-dependent, not a single type fixed for the whole
    /// scope, so a variable may legally change type across reassignments
    /// (see `DESIGN.md`).
    assignments: Vec<(Position, Type)>,
    /// A procedure's own return type, set once its return statements have
    /// been checked. `None` for anything but a `Procedure` entry.
    pub return_type: Option<Type>,
    /// Parameter types, in declaration order. Empty for anything but a
    /// `Procedure` entry.
    pub params: Vec<Type>,
}

impl ScopeEntry {
    pub fn variable(name: &str, declared_at: Position) -> Self {
        ScopeEntry {
            name: name.to_string(),
            kind: EntryKind::Variable,
            declared_at,
            assignments: Vec::new(),
            return_type: None,
            params: Vec::new(),
        }
    }

    pub fn parameter(name: &str, declared_at: Position, ty: Type) -> Self {
        ScopeEntry {
            name: name.to_string(),
            kind: EntryKind::Parameter,
            declared_at,
            assignments: vec![(declared_at, ty)],
            return_type: None,
            params: Vec::new(),
        }
    }

    pub fn procedure(name: &str, declared_at: Position, params: Vec<Type>) -> Self {
        ScopeEntry {
            name: name.to_string(),
            kind: EntryKind::Procedure,
            declared_at,
            assignments: Vec::new(),
            return_type: None,
            params,
        }
    }

    /// Record that `ty` was assigned at `at`. Assignments are expected to
    /// be recorded in position order, since type checking walks the
    /// program in source order.
    pub fn assign(&mut self, at: Position, ty: Type) {
        self.assignments.push((at, ty));
    }

    /// The type in effect at `use_at`: the type of the most recent
    /// assignment at or before that position, or `None` if the variable
    /// hasn't been assigned yet by that point.
    pub fn type_at(&self, use_at: Position) -> Option<Type> {
        self.assignments.iter().rev().find(|(pos, _)| *pos <= use_at).map(|(_, ty)| *ty)
    }

    /// The type of the most recent assignment, irrespective of position.
    pub fn final_type(&self) -> Option<Type> {
        self.assignments.last().map(|(_, ty)| *ty)
    }
}

/// A flat set of bindings, keyed by name in declaration order — ordered so
/// pretty-printing and diagnostics are deterministic.
pub type Scope = IndexMap<String, ScopeEntry>;

/// Every scope in a program: the global one, and one per procedure, keyed
/// by procedure name.
#[derive(Debug, Clone, Default)]
pub struct Scopes {
    pub global: Scope,
    pub functions: IndexMap<String, Scope>,
}

impl Scopes {
    /// The scope a name resolves in: `None` is the global scope, `Some`
    /// the named procedure's local one.
    pub fn scope(&self, owner: &Option<String>) -> &Scope {
        match owner {
            None => &self.global,
            Some(name) => self
                .functions
                .get(name)
                .expect("a procedure's scope is created when it's registered"),
        }
    }

    pub fn scope_mut(&mut self, owner: &Option<String>) -> &mut Scope {
        match owner {
            None => &mut self.global,
            Some(name) => self
                .functions
                .get_mut(name)
                .expect("a procedure's scope is created when it's registered"),
        }
    }
}
