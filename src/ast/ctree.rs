//! Arena-backed ctree
//!
//! The decompiled function body is stored as a flat arena of items addressed by
//! [`NodeId`]. Items reference their operands and child statements by id, so a node
//! keeps its identity while its contents are rewritten in place. Nodes carry no parent
//! pointer; parents are found by walking down from the root, which always reflects the
//! latest mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Effective address inside the analysed binary
pub type Ea = u64;

/// Address used when an item has no meaningful location
pub const BADADDR: Ea = u64::MAX;

/// Identity of an item inside a [`CTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binary expression operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogAnd,
    LogOr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::LogAnd => "&&",
            BinaryOp::LogOr => "||",
        }
    }
}

/// Unary expression operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    BitNot,
    LogNot,
    /// Address-of (`&x`)
    Ref,
    /// Dereference (`*x`)
    Ptr,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::LogNot => "!",
            UnaryOp::Ref => "&",
            UnaryOp::Ptr => "*",
        }
    }
}

/// Expression operator together with its operands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ExprKind {
    /// Reference to a local variable by its index in the variable table
    Var { idx: usize },
    Num { value: u64 },
    /// Global object (function, data) referenced by address
    Obj { ea: Ea },
    /// Named helper or intrinsic
    Helper { name: String },
    Asg { x: NodeId, y: NodeId },
    Binary { kind: BinaryOp, x: NodeId, y: NodeId },
    Unary { kind: UnaryOp, x: NodeId },
    Call { callee: NodeId, args: Vec<NodeId> },
}

impl ExprKind {
    /// Operands in evaluation order
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            ExprKind::Var { .. }
            | ExprKind::Num { .. }
            | ExprKind::Obj { .. }
            | ExprKind::Helper { .. } => Vec::new(),
            ExprKind::Asg { x, y } | ExprKind::Binary { x, y, .. } => vec![*x, *y],
            ExprKind::Unary { x, .. } => vec![*x],
            ExprKind::Call { callee, args } => {
                let mut operands = Vec::with_capacity(args.len() + 1);
                operands.push(*callee);
                operands.extend(args.iter().copied());
                operands
            }
        }
    }

    fn operands_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            ExprKind::Var { .. }
            | ExprKind::Num { .. }
            | ExprKind::Obj { .. }
            | ExprKind::Helper { .. } => Vec::new(),
            ExprKind::Asg { x, y } | ExprKind::Binary { x, y, .. } => vec![x, y],
            ExprKind::Unary { x, .. } => vec![x],
            ExprKind::Call { callee, args } => {
                let mut operands = Vec::with_capacity(args.len() + 1);
                operands.push(callee);
                operands.extend(args.iter_mut());
                operands
            }
        }
    }
}

/// An expression node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CExpr {
    #[serde(default = "bad_address")]
    pub ea: Ea,
    #[serde(flatten)]
    pub kind: ExprKind,
}

impl CExpr {
    pub fn new(ea: Ea, kind: ExprKind) -> Self {
        Self { ea, kind }
    }

    /// Variable index if this is a bare variable reference
    pub fn var_idx(&self) -> Option<usize> {
        match self.kind {
            ExprKind::Var { idx } => Some(idx),
            _ => None,
        }
    }

    /// Left and right operands if this is an assignment
    pub fn as_asg(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            ExprKind::Asg { x, y } => Some((x, y)),
            _ => None,
        }
    }
}

/// Statement kind together with its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InsnKind {
    /// No-op placeholder
    Empty,
    Block {
        stmts: Vec<NodeId>,
    },
    /// Expression statement
    Expr {
        expr: NodeId,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    Return {
        expr: Option<NodeId>,
    },
    Break,
    Continue,
}

impl InsnKind {
    /// Children (expressions and statements) in traversal order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            InsnKind::Empty | InsnKind::Break | InsnKind::Continue => Vec::new(),
            InsnKind::Block { stmts } => stmts.clone(),
            InsnKind::Expr { expr } => vec![*expr],
            InsnKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![*cond, *then_branch];
                children.extend(else_branch.iter().copied());
                children
            }
            InsnKind::While { cond, body } => vec![*cond, *body],
            InsnKind::Return { expr } => expr.iter().copied().collect(),
        }
    }
}

/// A statement node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CInsn {
    #[serde(default = "bad_address")]
    pub ea: Ea,
    #[serde(flatten)]
    pub kind: InsnKind,
}

impl CInsn {
    pub fn new(ea: Ea, kind: InsnKind) -> Self {
        Self { ea, kind }
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, InsnKind::Block { .. })
    }
}

/// Any ctree item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum CItem {
    Expr(CExpr),
    Insn(CInsn),
}

impl CItem {
    pub fn ea(&self) -> Ea {
        match self {
            CItem::Expr(e) => e.ea,
            CItem::Insn(i) => i.ea,
        }
    }

    pub fn is_expr(&self) -> bool {
        matches!(self, CItem::Expr(_))
    }

    pub fn children(&self) -> Vec<NodeId> {
        match self {
            CItem::Expr(e) => e.kind.operands(),
            CItem::Insn(i) => i.kind.children(),
        }
    }
}

fn bad_address() -> Ea {
    BADADDR
}

/// Problems found while validating a deserialized tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CTreeError {
    #[error("node {0} is out of range")]
    DanglingNode(NodeId),
    #[error("root {0} is not a block statement")]
    RootNotBlock(NodeId),
    #[error("node {child} has more than one parent ({first} and {second})")]
    SharedNode {
        child: NodeId,
        first: NodeId,
        second: NodeId,
    },
    #[error("node {child} under {parent} has the wrong item kind")]
    WrongItemKind { child: NodeId, parent: NodeId },
}

/// Function body tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CTree {
    nodes: Vec<CItem>,
    root: NodeId,
}

impl Default for CTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CTree {
    /// Create a tree whose root is an empty block at `BADADDR`
    pub fn new() -> Self {
        Self {
            nodes: vec![CItem::Insn(CInsn::new(
                BADADDR,
                InsnKind::Block { stmts: Vec::new() },
            ))],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of arena slots, including detached nodes
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&CItem> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut CItem> {
        self.nodes.get_mut(id.index())
    }

    pub fn expr(&self, id: NodeId) -> Option<&CExpr> {
        match self.get(id) {
            Some(CItem::Expr(e)) => Some(e),
            _ => None,
        }
    }

    pub fn expr_mut(&mut self, id: NodeId) -> Option<&mut CExpr> {
        match self.get_mut(id) {
            Some(CItem::Expr(e)) => Some(e),
            _ => None,
        }
    }

    pub fn insn(&self, id: NodeId) -> Option<&CInsn> {
        match self.get(id) {
            Some(CItem::Insn(i)) => Some(i),
            _ => None,
        }
    }

    pub fn insn_mut(&mut self, id: NodeId) -> Option<&mut CInsn> {
        match self.get_mut(id) {
            Some(CItem::Insn(i)) => Some(i),
            _ => None,
        }
    }

    /// Variable index of a bare variable reference
    pub fn var_idx(&self, id: NodeId) -> Option<usize> {
        self.expr(id).and_then(CExpr::var_idx)
    }

    pub fn add_expr(&mut self, expr: CExpr) -> NodeId {
        self.push(CItem::Expr(expr))
    }

    pub fn add_insn(&mut self, insn: CInsn) -> NodeId {
        self.push(CItem::Insn(insn))
    }

    fn push(&mut self, item: CItem) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(item);
        id
    }

    /// Direct children of an item
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).map(CItem::children).unwrap_or_default()
    }

    /// Find the parent of `target` by walking down from the root.
    ///
    /// Detached nodes and the root itself have no parent.
    pub fn find_parent_of(&self, target: NodeId) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let children = self.children(id);
            if children.contains(&target) {
                return Some(id);
            }
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// Copy the subtree rooted at `id`.
    ///
    /// Operands are allocated as fresh nodes; the returned root is not yet placed
    /// anywhere, so the caller decides which slot receives it.
    pub fn deep_copy_expr(&mut self, id: NodeId) -> Option<CExpr> {
        let mut copy = self.expr(id)?.clone();
        for operand in copy.kind.operands_mut() {
            let child = self.deep_copy_expr(*operand)?;
            *operand = self.add_expr(child);
        }
        Some(copy)
    }

    /// Overwrite the contents of `target` with `replacement`, keeping the identity of
    /// `target`. The old operands become detached.
    pub fn replace_expr(&mut self, target: NodeId, replacement: CExpr) -> bool {
        match self.expr_mut(target) {
            Some(slot) => {
                *slot = replacement;
                true
            }
            None => false,
        }
    }

    /// Remove `child` from the statement list of `block`, matching by identity
    pub fn block_erase(&mut self, block: NodeId, child: NodeId) -> bool {
        let Some(CInsn {
            kind: InsnKind::Block { stmts },
            ..
        }) = self.insn_mut(block)
        else {
            return false;
        };
        match stmts.iter().position(|s| *s == child) {
            Some(pos) => {
                stmts.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Append a statement to a block
    pub fn block_push(&mut self, block: NodeId, stmt: NodeId) -> bool {
        match self.insn_mut(block) {
            Some(CInsn {
                kind: InsnKind::Block { stmts },
                ..
            }) => {
                stmts.push(stmt);
                true
            }
            _ => false,
        }
    }

    /// Statements of a block, empty for anything else
    pub fn block_stmts(&self, block: NodeId) -> &[NodeId] {
        match self.insn(block) {
            Some(CInsn {
                kind: InsnKind::Block { stmts },
                ..
            }) => stmts.as_slice(),
            _ => &[],
        }
    }

    /// Check the single-parent shape of a tree loaded from outside
    pub fn validate(&self) -> Result<(), CTreeError> {
        if !self.get(self.root).map(|i| matches!(i, CItem::Insn(c) if c.is_block())).unwrap_or(false) {
            return Err(CTreeError::RootNotBlock(self.root));
        }
        let mut seen: HashMap<NodeId, NodeId> = HashMap::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let item = self.get(id).ok_or(CTreeError::DanglingNode(id))?;
            for child in item.children() {
                let child_item = self.get(child).ok_or(CTreeError::DanglingNode(child))?;
                if !Self::child_kind_ok(item, child, child_item) {
                    return Err(CTreeError::WrongItemKind { child, parent: id });
                }
                if let Some(first) = seen.insert(child, id) {
                    return Err(CTreeError::SharedNode {
                        child,
                        first,
                        second: id,
                    });
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    fn child_kind_ok(parent: &CItem, child: NodeId, child_item: &CItem) -> bool {
        match parent {
            CItem::Expr(_) => child_item.is_expr(),
            CItem::Insn(insn) => match &insn.kind {
                InsnKind::Block { .. } => !child_item.is_expr(),
                InsnKind::Expr { .. } | InsnKind::Return { .. } => child_item.is_expr(),
                InsnKind::If { cond, .. } | InsnKind::While { cond, .. } => {
                    (child == *cond) == child_item.is_expr()
                }
                InsnKind::Empty | InsnKind::Break | InsnKind::Continue => false,
            },
        }
    }
}
