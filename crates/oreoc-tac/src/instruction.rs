//! The TAC instruction set: one flat list of [`Instruction`]/[`Label`]
//! items, no basic blocks, ported from `TacInstruction`/`binary_ops`/
//! `unary_ops` in the original's `tac.py`.

use crate::variable::{Label, VarId};

/// A literal operand. TAC has no boolean type — `TRUE`/`FALSE` are folded
/// to `1`/`0` before they ever reach an instruction, matching the
/// original's `TRUE_TAC`/`FALSE_TAC` constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Num(i64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    And,
    Or,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Lt => "<",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
}

impl UnOp {
    fn symbol(self) -> &'static str {
        match self {
            UnOp::Not => "not",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(Literal),
    Variable(VarId),
}

/// One argument to a procedure call, in source order.
pub type Args = Vec<Operand>;

/// One instruction. `Read` has no counterpart in `tac.py` — it's the
/// resolution of the `get` Open Question (see `DESIGN.md`).
#[derive(Debug, Clone)]
pub enum Instruction {
    /// `result = value;`
    Copy { result: VarId, value: Operand },
    /// `result = lhs op rhs;`
    Binary {
        result: VarId,
        op: BinOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// `result = op arg;`
    Unary { result: VarId, op: UnOp, arg: Operand },
    /// `result = read str;`
    Read { result: VarId },
    /// `Goto target;`
    Goto { target: Label },
    /// `IfZ condition Goto target;`
    IfFalseGoto { condition: Operand, target: Label },
    /// `result = call name(args...);` — not a form `tac.py` defines (its
    /// `factor` handling raises `NotImplementedError` for `ID_PAREN`); see
    /// `DESIGN.md` for why procedure calls get a TAC form here.
    Call { result: VarId, name: String, args: Args },
    /// `return value;` or `return;`.
    Return { value: Option<Operand> },
}

impl Instruction {
    pub fn result(&self) -> Option<VarId> {
        match self {
            Instruction::Copy { result, .. }
            | Instruction::Binary { result, .. }
            | Instruction::Unary { result, .. }
            | Instruction::Read { result }
            | Instruction::Call { result, .. } => Some(*result),
            Instruction::Goto { .. } | Instruction::IfFalseGoto { .. } | Instruction::Return { .. } => None,
        }
    }
}

pub(crate) fn op_symbol(op: BinOp) -> &'static str {
    op.symbol()
}

pub(crate) fn unop_symbol(op: UnOp) -> &'static str {
    op.symbol()
}
