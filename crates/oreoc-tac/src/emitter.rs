//! Tree-to-TAC lowering, ported statement-by-statement and
//! expression-by-expression from the original's `oreo_to_tac` /
//! `_compile_*` methods — adapted to this grammar's precedence chain
//! (`bool`/`bool_cmp` in place of the original's `comp_e`, see
//! `DESIGN.md`) rather than its generic `_compile_optional_combiner`
//! walk, which assumed a tree shape this grammar doesn't have.

use std::collections::HashMap;

use indexmap::IndexMap;
use oreoc_syn::{NodeId, Tree};
use oreoc_util::{IndexVec, Interner};

use crate::instruction::{BinOp, Instruction, Literal, Operand, UnOp};
use crate::program::{Item, Program};
use crate::variable::{Label, VarId, VarSlot};

/// Lower an analysed, type-checked tree to TAC. Counters are local to one
/// `Emitter`, so two compilations never share label/temporary numbering.
pub fn emit(tree: &Tree, root: NodeId) -> Program {
    let mut emitter = Emitter::new(tree);
    let compound = tree
        .get_child(root, "compound")
        .expect("the grammar's root always has a compound child");
    let entry = emitter.emit_block(&tree.children(compound).to_vec());
    tracing::debug!(
        entry_items = entry.len(),
        procedures = emitter.procedures.len(),
        variables = emitter.variables.len(),
        "tac emission complete"
    );
    Program {
        entry,
        procedures: emitter.procedures,
        variables: emitter.variables,
        interner: emitter.interner,
    }
}

struct Emitter<'t> {
    tree: &'t Tree,
    interner: Interner,
    variables: IndexVec<VarId, VarSlot>,
    named: HashMap<String, VarId>,
    temp_counter: u32,
    label_counter: u32,
    procedures: IndexMap<String, Vec<Item>>,
}

impl<'t> Emitter<'t> {
    fn new(tree: &'t Tree) -> Self {
        Emitter {
            tree,
            interner: Interner::new(),
            variables: IndexVec::new(),
            named: HashMap::new(),
            temp_counter: 0,
            label_counter: 0,
            procedures: IndexMap::new(),
        }
    }

    fn get_or_create_named(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.named.get(name) {
            return id;
        }
        let symbol = self.interner.intern(name);
        let id = self.variables.push(VarSlot::Named(symbol));
        self.named.insert(name.to_string(), id);
        id
    }

    fn new_temp(&mut self) -> VarId {
        self.temp_counter += 1;
        self.variables.push(VarSlot::Temp(self.temp_counter))
    }

    fn new_label(&mut self, tag: &str) -> Label {
        self.label_counter += 1;
        Label::new(self.label_counter, tag)
    }

    fn emit_block(&mut self, stmts: &[NodeId]) -> Vec<Item> {
        let mut items = Vec::new();
        for &stmt in stmts {
            self.emit_statement(stmt, &mut items);
        }
        items
    }

    fn emit_statement(&mut self, stmt: NodeId, sink: &mut Vec<Item>) {
        if let Some(v) = self.tree.get_child(stmt, "v") {
            return self.emit_var_decl(v, sink);
        }
        if let Some(a) = self.tree.get_child(stmt, "a") {
            return self.emit_assignment(a, sink);
        }
        if let Some(pr) = self.tree.get_child(stmt, "pr") {
            return self.emit_print_or_get(pr, sink);
        }
        if let Some(i) = self.tree.get_child(stmt, "i") {
            return self.emit_if(i, sink);
        }
        if let Some(w) = self.tree.get_child(stmt, "w") {
            return self.emit_while(w, sink);
        }
        if let Some(def) = self.tree.get_child(stmt, "function_definition") {
            let (name, items) = self.emit_function(def);
            tracing::trace!(procedure = %name, items = items.len(), "emitted procedure body");
            self.procedures.insert(name, items);
            return;
        }
        if let Some(ret) = self.tree.get_child(stmt, "return_statement") {
            return self.emit_return(ret, sink);
        }
    }

    fn emit_function(&mut self, def: NodeId) -> (String, Vec<Item>) {
        let id_paren = self.tree.get_child(def, "ID_PAREN").unwrap();
        let name = self.tree.matched_token(id_paren).unwrap().attribute.clone().unwrap();
        let body = self.tree.get_child(def, "function_compound").unwrap();
        let items = self.emit_block(&self.tree.children(body).to_vec());
        (name, items)
    }

    fn emit_var_decl(&mut self, v: NodeId, sink: &mut Vec<Item>) {
        let id_node = self.tree.get_child(v, "ID").unwrap();
        let name = self.tree.matched_token(id_node).unwrap().attribute.clone().unwrap();
        if let Some(opt) = self.tree.get_child(v, "optional_var_assign") {
            let assign = self.tree.get_child(opt, "var_assign").unwrap();
            let expr = self.tree.get_child(assign, "expression").unwrap();
            let value = self.emit_expression(expr, sink);
            let dest = self.get_or_create_named(&name);
            sink.push(Item::Instruction(Instruction::Copy { result: dest, value }));
        }
    }

    /// Always emits an explicit copy, never eliding into a renamed
    /// temporary — see `DESIGN.md` for why this deviates from
    /// `_compile_assignment`'s rename trick.
    fn emit_assignment(&mut self, a: NodeId, sink: &mut Vec<Item>) {
        let id_node = self.tree.get_child(a, "ID").unwrap();
        let name = self.tree.matched_token(id_node).unwrap().attribute.clone().unwrap();
        let expr = self.tree.get_child(a, "expression").unwrap();
        let value = self.emit_expression(expr, sink);
        let dest = self.get_or_create_named(&name);
        sink.push(Item::Instruction(Instruction::Copy { result: dest, value }));
    }

    fn emit_print_or_get(&mut self, pr: NodeId, sink: &mut Vec<Item>) {
        if let Some(expr) = self.tree.get_child(pr, "expression") {
            // The value is computed for its side effects (any instructions
            // needed to produce it); print itself has no TAC form, same as
            // the original — only `get` gets one, see below.
            self.emit_expression(expr, sink);
            return;
        }
        if let Some(id_node) = self.tree.get_child(pr, "ID") {
            let name = self.tree.matched_token(id_node).unwrap().attribute.clone().unwrap();
            let dest = self.get_or_create_named(&name);
            sink.push(Item::Instruction(Instruction::Read { result: dest }));
        }
    }

    fn emit_if(&mut self, i: NodeId, sink: &mut Vec<Item>) {
        let condition = self.tree.get_child(i, "bool").unwrap();
        let cond = self.emit_bool(condition, sink);
        let false_label = self.new_label("if_false");
        sink.push(Item::Instruction(Instruction::IfFalseGoto {
            condition: cond,
            target: false_label.clone(),
        }));

        let compound = self.tree.get_child(i, "compound").unwrap();
        for &stmt in &self.tree.children(compound).to_vec() {
            self.emit_statement(stmt, sink);
        }

        if let Some(else_node) = self.tree.get_child(i, "optional_else") {
            let end_label = self.new_label("else_end");
            sink.push(Item::Instruction(Instruction::Goto { target: end_label.clone() }));
            sink.push(Item::Label(false_label));
            let else_compound = self.tree.get_child(else_node, "compound").unwrap();
            for &stmt in &self.tree.children(else_compound).to_vec() {
                self.emit_statement(stmt, sink);
            }
            sink.push(Item::Label(end_label));
        } else {
            sink.push(Item::Label(false_label));
        }
    }

    fn emit_while(&mut self, w: NodeId, sink: &mut Vec<Item>) {
        let start_label = self.new_label("while_start");
        let end_label = self.new_label("while_end");
        sink.push(Item::Label(start_label.clone()));

        let condition = self.tree.get_child(w, "bool").unwrap();
        let cond = self.emit_bool(condition, sink);
        sink.push(Item::Instruction(Instruction::IfFalseGoto {
            condition: cond,
            target: end_label.clone(),
        }));

        let compound = self.tree.get_child(w, "compound").unwrap();
        for &stmt in &self.tree.children(compound).to_vec() {
            self.emit_statement(stmt, sink);
        }
        sink.push(Item::Instruction(Instruction::Goto { target: start_label }));
        sink.push(Item::Label(end_label));
    }

    fn emit_return(&mut self, ret: NodeId, sink: &mut Vec<Item>) {
        let expr = self
            .tree
            .get_child(ret, "optional_expr")
            .and_then(|opt| self.tree.get_child(opt, "expression"));
        let value = expr.map(|e| self.emit_expression(e, sink));
        sink.push(Item::Instruction(Instruction::Return { value }));
    }

    fn emit_expression(&mut self, node: NodeId, sink: &mut Vec<Item>) -> Operand {
        let bool_node = self.tree.get_child(node, "bool").unwrap();
        let left = self.emit_bool(bool_node, sink);
        match self.tree.get_child(node, "and_or_b") {
            Some(tail) => self.emit_and_or_tail(tail, left, sink),
            None => left,
        }
    }

    fn emit_and_or_tail(&mut self, tail: NodeId, left: Operand, sink: &mut Vec<Item>) -> Operand {
        let op = if self.tree.has_child(tail, "AND") { BinOp::And } else { BinOp::Or };
        let rhs_bool = self.tree.get_child(tail, "bool").unwrap();
        let rhs = self.emit_bool(rhs_bool, sink);
        let combined = self.emit_binary(op, left, rhs, sink);
        match self.tree.get_child(tail, "and_or_b") {
            Some(next) => self.emit_and_or_tail(next, combined, sink),
            None => combined,
        }
    }

    fn emit_bool(&mut self, node: NodeId, sink: &mut Vec<Item>) -> Operand {
        if self.tree.has_child(node, "NOT") {
            let inner = self.tree.get_child(node, "bool").unwrap();
            let value = self.emit_bool(inner, sink);
            return self.emit_unary(UnOp::Not, value, sink);
        }
        let simple = self.tree.get_child(node, "simple_expr").unwrap();
        let left = self.emit_simple_expr(simple, sink);
        match self.tree.get_child(node, "bool_cmp") {
            Some(cmp) => self.emit_bool_cmp(cmp, left, sink),
            None => left,
        }
    }

    fn emit_bool_cmp(&mut self, cmp: NodeId, left: Operand, sink: &mut Vec<Item>) -> Operand {
        let op = relative_operator_of(self.tree, cmp);
        let rhs_node = self.tree.get_child(cmp, "expression").unwrap();
        let rhs = self.emit_expression(rhs_node, sink);
        self.compile_rel_op(left, rhs, op, sink)
    }

    /// Ported from `_compile_rel_op`: `<`/`==` emit directly, `>` flips
    /// operands into a `<`, and `<=`/`>=` synthesise a strict comparison
    /// OR'd with equality.
    fn compile_rel_op(&mut self, lhs: Operand, rhs: Operand, op: &str, sink: &mut Vec<Item>) -> Operand {
        match op {
            "<" => self.emit_binary(BinOp::Lt, lhs, rhs, sink),
            "==" => self.emit_binary(BinOp::Eq, lhs, rhs, sink),
            ">" => self.emit_binary(BinOp::Lt, rhs, lhs, sink),
            "<=" | ">=" => {
                let strict = if op == "<=" { "<" } else { ">" };
                let strict_truth = self.compile_rel_op(lhs.clone(), rhs.clone(), strict, sink);
                let equality = self.compile_rel_op(lhs, rhs, "==", sink);
                self.emit_binary(BinOp::Or, strict_truth, equality, sink)
            }
            _ => unreachable!("relative_operator always matches one of its alternatives"),
        }
    }

    fn emit_simple_expr(&mut self, node: NodeId, sink: &mut Vec<Item>) -> Operand {
        let term = self.tree.get_child(node, "term").unwrap();
        let left = self.emit_term(term, sink);
        match self.tree.get_child(node, "add_sub") {
            Some(tail) => self.emit_add_sub_tail(tail, left, sink),
            None => left,
        }
    }

    fn emit_add_sub_tail(&mut self, tail: NodeId, left: Operand, sink: &mut Vec<Item>) -> Operand {
        let op = if self.tree.has_child(tail, "+") { BinOp::Add } else { BinOp::Sub };
        let term = self.tree.get_child(tail, "term").unwrap();
        let right = self.emit_term(term, sink);
        let combined = self.emit_binary(op, left, right, sink);
        match self.tree.get_child(tail, "add_sub") {
            Some(next) => self.emit_add_sub_tail(next, combined, sink),
            None => combined,
        }
    }

    fn emit_term(&mut self, node: NodeId, sink: &mut Vec<Item>) -> Operand {
        let factor = self.tree.get_child(node, "factor").unwrap();
        let left = self.emit_factor(factor, sink);
        match self.tree.get_child(node, "mul_div") {
            Some(tail) => self.emit_mul_div_tail(tail, left, sink),
            None => left,
        }
    }

    fn emit_mul_div_tail(&mut self, tail: NodeId, left: Operand, sink: &mut Vec<Item>) -> Operand {
        let op = if self.tree.has_child(tail, "*") { BinOp::Mul } else { BinOp::Div };
        let factor = self.tree.get_child(tail, "factor").unwrap();
        let right = self.emit_factor(factor, sink);
        let combined = self.emit_binary(op, left, right, sink);
        match self.tree.get_child(tail, "mul_div") {
            Some(next) => self.emit_mul_div_tail(next, combined, sink),
            None => combined,
        }
    }

    fn emit_factor(&mut self, node: NodeId, sink: &mut Vec<Item>) -> Operand {
        if let Some(num) = self.tree.get_child(node, "NUMBER") {
            let text = self.tree.matched_token(num).unwrap().attribute.clone().unwrap();
            let value: i64 = text.parse().expect("lexer's NUMBER pattern only matches digit runs");
            return Operand::Literal(Literal::Num(value));
        }
        if let Some(s) = self.tree.get_child(node, "STRING") {
            let text = self.tree.matched_token(s).unwrap().attribute.clone().unwrap();
            return Operand::Literal(Literal::Str(text));
        }
        if self.tree.has_child(node, "TRUE") {
            return Operand::Literal(Literal::Num(1));
        }
        if self.tree.has_child(node, "FALSE") {
            return Operand::Literal(Literal::Num(0));
        }
        if let Some(id_node) = self.tree.get_child(node, "ID") {
            let name = self.tree.matched_token(id_node).unwrap().attribute.clone().unwrap();
            return Operand::Variable(self.get_or_create_named(&name));
        }
        if let Some(id_paren) = self.tree.get_child(node, "ID_PAREN") {
            let name = self.tree.matched_token(id_paren).unwrap().attribute.clone().unwrap();
            let mut args = Vec::new();
            if let Some(call_args) = self.tree.get_child(node, "call_args") {
                self.emit_call_args(call_args, &mut args, sink);
            }
            let dest = self.new_temp();
            sink.push(Item::Instruction(Instruction::Call { result: dest, name, args }));
            return Operand::Variable(dest);
        }
        if let Some(expr) = self.tree.get_child(node, "expression") {
            return self.emit_expression(expr, sink);
        }
        unreachable!("factor always matches one of its alternatives")
    }

    fn emit_call_args(&mut self, node: NodeId, args: &mut Vec<Operand>, sink: &mut Vec<Item>) {
        let expr = self.tree.get_child(node, "expression").unwrap();
        args.push(self.emit_expression(expr, sink));
        if let Some(later) = self.tree.get_child(node, "later_call_arg") {
            self.emit_call_args(later, args, sink);
        }
    }

    fn emit_binary(&mut self, op: BinOp, lhs: Operand, rhs: Operand, sink: &mut Vec<Item>) -> Operand {
        let dest = self.new_temp();
        sink.push(Item::Instruction(Instruction::Binary { result: dest, op, lhs, rhs }));
        Operand::Variable(dest)
    }

    fn emit_unary(&mut self, op: UnOp, arg: Operand, sink: &mut Vec<Item>) -> Operand {
        let dest = self.new_temp();
        sink.push(Item::Instruction(Instruction::Unary { result: dest, op, arg }));
        Operand::Variable(dest)
    }
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
