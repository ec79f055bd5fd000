//! Shared primitives used by every stage of the `oreoc` pipeline: source
//! positions, the uniform diagnostic type, a string interner for named TAC
//! variables, and an arena index-vector used by the parse tree.
//!
//! None of these types know anything about the source language's grammar or
//! semantics — they exist so the lexer, parser, semantic analyser, and TAC
//! emitter can all report errors and hand around identifiers the same way.

mod diagnostic;
mod index_vec;
mod interner;
mod position;

pub use diagnostic::{Diagnostic, Kind};
pub use index_vec::{Idx, IndexVec};
pub use interner::{Interner, Symbol};
pub use position::Position;

/// Result alias used throughout the pipeline: every stage either produces a
/// value or a single [`Diagnostic`] (the pipeline stops at the first error,
/// per the no-error-recovery design).
pub type CompileResult<T> = Result<T, Diagnostic>;
