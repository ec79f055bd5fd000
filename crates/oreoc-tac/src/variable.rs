//! TAC operands: labels and variables.
//!
//! A [`VarId`] is an arena handle into the emitter's variable table rather
//! than a value that carries its own name, matching the arena-of-handles
//! shape the rest of this pipeline uses instead of `Rc<RefCell<_>>`. Every
//! source name is interned once and reused for every later reference to
//! it (see `DESIGN.md` for why this implementation always copies on
//! assignment rather than eliding into a renamed temporary).

use oreoc_util::{Idx, Interner, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(u32);

impl Idx for VarId {
    fn new(index: usize) -> Self {
        VarId(index as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A variable is either a source-named one (`v_` prefix) or a compiler
/// temporary (`t_` prefix, numbered by order of creation).
#[derive(Debug, Clone, Copy)]
pub enum VarSlot {
    Named(Symbol),
    Temp(u32),
}

impl VarSlot {
    pub fn render(&self, interner: &Interner) -> String {
        match self {
            VarSlot::Named(sym) => format!("v_{}", interner.resolve(*sym)),
            VarSlot::Temp(n) => format!("t_{n}"),
        }
    }
}

/// A jump target. Display renders it as `L{n}_{tag}`, matching the
/// original's `Label.__repr__`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    id: u32,
    tag: String,
}

impl Label {
    pub(crate) fn new(id: u32, tag: impl Into<String>) -> Self {
        Label { id, tag: tag.into() }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}_{}", self.id, self.tag)
    }
}
