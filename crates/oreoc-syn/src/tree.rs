use oreoc_lex::Token;
use oreoc_util::{Idx, IndexVec};

use crate::grammar::Symbol;

/// A handle into a [`Tree`]'s arena. Kept as an opaque `u32` rather than a
/// pointer/`Rc` so the tree has no cycles and no shared ownership to reason
/// about — exactly the "arena of nodes with integer handles" shape
/// `spec.md` recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl Idx for NodeId {
    fn new(index: usize) -> Self {
        NodeId(index as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a parse tree node stands for: either a nonterminal awaiting
/// expansion (or already expanded into `children`), or a terminal slot
/// awaiting (or holding) the token it matched.
#[derive(Debug, Clone)]
pub enum NodeContent {
    NonTerminal { name: String, kleene: bool },
    Terminal { expected: String, matched: Option<Token> },
}

impl NodeContent {
    pub fn label(&self) -> &str {
        match self {
            NodeContent::NonTerminal { name, .. } => name,
            NodeContent::Terminal { expected, .. } => expected,
        }
    }

    pub(crate) fn from_symbol(symbol: &Symbol) -> Self {
        match symbol {
            Symbol::Terminal(name) => NodeContent::Terminal {
                expected: name.clone(),
                matched: None,
            },
            Symbol::NonTerminal { name, kleene } => NodeContent::NonTerminal {
                name: name.clone(),
                kleene: *kleene,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub content: NodeContent,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub processed: bool,
}

/// The arena-backed parse tree. Every stage after the syntax analyser
/// addresses nodes by `NodeId` and keeps its own side table of annotations
/// (scope, type, TAC result) rather than the tree carrying them directly —
/// see `DESIGN.md` / `SPEC_FULL.md` §3.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: IndexVec<NodeId, Node>,
}

impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    pub fn new_root(&mut self, name: &str) -> NodeId {
        self.nodes.push(Node {
            content: NodeContent::NonTerminal {
                name: name.to_string(),
                kleene: false,
            },
            parent: None,
            children: Vec::new(),
            processed: false,
        })
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn is_non_terminal(&self, id: NodeId, name: &str) -> bool {
        matches!(&self.nodes[id].content, NodeContent::NonTerminal { name: n, .. } if n == name)
    }

    pub fn is_terminal(&self, id: NodeId, name: &str) -> bool {
        matches!(&self.nodes[id].content, NodeContent::Terminal { expected, .. } if expected == name)
    }

    pub fn matched_token(&self, id: NodeId) -> Option<&Token> {
        match &self.nodes[id].content {
            NodeContent::Terminal { matched, .. } => matched.as_ref(),
            NodeContent::NonTerminal { .. } => None,
        }
    }

    /// The first child matching `name`, whether terminal or nonterminal.
    pub fn get_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].content.label() == name)
    }

    pub fn has_child(&self, id: NodeId, name: &str) -> bool {
        self.get_child(id, name).is_some()
    }

    /// Depth-first search for the first unprocessed node, root first.
    pub fn next_unprocessed(&self, id: NodeId) -> Option<NodeId> {
        if !self.nodes[id].processed {
            return Some(id);
        }
        for &child in &self.nodes[id].children {
            if let Some(found) = self.next_unprocessed(child) {
                return Some(found);
            }
        }
        None
    }

    pub fn mark_processed(&mut self, id: NodeId) {
        self.nodes[id].processed = true;
    }

    /// Remove `id` from its parent's children, pruning it (and everything
    /// under it, since nothing else references it) from the live tree.
    /// Used both for a Kleene nonterminal that ran out of repetitions and
    /// for an epsilon production, which contributes nothing to the tree.
    pub fn destroy(&mut self, id: NodeId) {
        self.nodes[id].processed = true;
        if let Some(parent) = self.nodes[id].parent {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }

    pub fn add_child(&mut self, parent: NodeId, symbol: &Symbol) -> NodeId {
        let child = self.nodes.push(Node {
            content: NodeContent::from_symbol(symbol),
            parent: Some(parent),
            children: Vec::new(),
            processed: false,
        });
        self.nodes[parent].children.push(child);
        child
    }

    /// Insert a fresh, unprocessed copy of a Kleene nonterminal right after
    /// itself in its parent's child list — the "sibling clone" mechanism
    /// `spec.md` §4.3 uses to realise `X*` without a loop construct.
    pub fn duplicate_kleene_sibling(&mut self, id: NodeId) -> NodeId {
        let (name, kleene, parent) = match &self.nodes[id].content {
            NodeContent::NonTerminal { name, kleene } => {
                (name.clone(), *kleene, self.nodes[id].parent)
            }
            NodeContent::Terminal { .. } => unreachable!("only nonterminals repeat"),
        };
        let parent = parent.expect("a Kleene node always has a parent");
        let duplicate = self.nodes.push(Node {
            content: NodeContent::NonTerminal { name, kleene },
            parent: Some(parent),
            children: Vec::new(),
            processed: false,
        });
        let siblings = &mut self.nodes[parent].children;
        let position = siblings.iter().position(|&c| c == id).unwrap();
        siblings.insert(position + 1, duplicate);
        duplicate
    }

    /// Render the tree as an indented listing, optionally annotating each
    /// node with its resolved scope and/or type.
    pub fn pretty_print(
        &self,
        root: NodeId,
        print_scope: bool,
        print_type: bool,
        scope_of: &dyn Fn(NodeId) -> Option<String>,
        type_of: &dyn Fn(NodeId) -> Option<String>,
    ) -> String {
        let mut out = String::new();
        self.pretty_print_node(root, 0, print_scope, print_type, scope_of, type_of, &mut out);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn pretty_print_node(
        &self,
        id: NodeId,
        depth: usize,
        print_scope: bool,
        print_type: bool,
        scope_of: &dyn Fn(NodeId) -> Option<String>,
        type_of: &dyn Fn(NodeId) -> Option<String>,
        out: &mut String,
    ) {
        let indent = "  ".repeat(depth);
        let node = &self.nodes[id];
        let mut line = match &node.content {
            NodeContent::NonTerminal { name, .. } => format!("{indent}{name}"),
            NodeContent::Terminal { expected, matched } => match matched {
                Some(tok) => format!("{indent}{expected}({})", tok.display_text()),
                None => format!("{indent}{expected}(?)"),
            },
        };
        if print_scope {
            if let Some(scope) = scope_of(id) {
                line.push_str(&format!("  [scope: {scope}]"));
            }
        }
        if print_type {
            if let Some(ty) = type_of(id) {
                line.push_str(&format!("  [type: {ty}]"));
            }
        }
        out.push_str(&line);
        out.push('\n');
        for &child in &node.children {
            self.pretty_print_node(child, depth + 1, print_scope, print_type, scope_of, type_of, out);
        }
    }
}
