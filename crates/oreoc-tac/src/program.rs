//! The emitted program: one flat instruction/label list per compiled
//! unit (the top-level body, plus one per procedure), and the variable
//! table needed to render operands back to source-shaped text.

use indexmap::IndexMap;
use oreoc_util::{IndexVec, Interner};

use crate::instruction::{op_symbol, unop_symbol, Instruction, Literal, Operand};
use crate::variable::{Label, VarId, VarSlot};

#[derive(Debug, Clone)]
pub enum Item {
    Label(Label),
    Instruction(Instruction),
}

/// A compiled program: the instructions that run unconditionally at
/// program entry, plus one instruction list per procedure, addressed by
/// name. Procedures are kept separate rather than inlined in source
/// order — see `DESIGN.md` — since a flat single list has no way to
/// express "this block only runs when called".
pub struct Program {
    pub entry: Vec<Item>,
    pub procedures: IndexMap<String, Vec<Item>>,
    pub(crate) variables: IndexVec<VarId, VarSlot>,
    pub(crate) interner: Interner,
}

impl Program {
    fn render_var(&self, id: VarId) -> String {
        self.variables[id].render(&self.interner)
    }

    fn render_operand(&self, operand: &Operand) -> String {
        match operand {
            Operand::Literal(Literal::Num(n)) => n.to_string(),
            Operand::Literal(Literal::Str(s)) => format!("\"{s}\""),
            Operand::Variable(id) => self.render_var(*id),
        }
    }

    fn render_instruction(&self, instruction: &Instruction) -> String {
        match instruction {
            Instruction::Copy { result, value } => {
                format!("{} = {};", self.render_var(*result), self.render_operand(value))
            }
            Instruction::Binary { result, op, lhs, rhs } => format!(
                "{} = {} {} {};",
                self.render_var(*result),
                self.render_operand(lhs),
                op_symbol(*op),
                self.render_operand(rhs)
            ),
            Instruction::Unary { result, op, arg } => {
                format!("{} = {} {};", self.render_var(*result), unop_symbol(*op), self.render_operand(arg))
            }
            Instruction::Read { result } => format!("{} = read str;", self.render_var(*result)),
            Instruction::Goto { target } => format!("Goto {target};"),
            Instruction::IfFalseGoto { condition, target } => {
                format!("IfZ {} Goto {target};", self.render_operand(condition))
            }
            Instruction::Call { result, name, args } => {
                let rendered = args.iter().map(|a| self.render_operand(a)).collect::<Vec<_>>().join(", ");
                format!("{} = call {name}({rendered});", self.render_var(*result))
            }
            Instruction::Return { value } => match value {
                Some(v) => format!("return {};", self.render_operand(v)),
                None => "return;".to_string(),
            },
        }
    }

    fn render_items(&self, items: &[Item], out: &mut String) {
        for item in items {
            match item {
                Item::Label(label) => out.push_str(&format!("{label}:\n")),
                Item::Instruction(instruction) => {
                    out.push('\t');
                    out.push_str(&self.render_instruction(instruction));
                    out.push('\n');
                }
            }
        }
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        self.render_items(&self.entry, &mut out);
        for (name, items) in &self.procedures {
            out.push_str(&format!("proc {name}:\n"));
            self.render_items(items, &mut out);
        }
        write!(f, "{}", out.trim_end())
    }
}
