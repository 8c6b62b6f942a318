//! Ctree construction helpers
//!
//! Hosts translating their own trees, the CLI fixtures and the tests all build
//! function bodies through [`CTreeBuilder`].

use super::ctree::{
    BinaryOp, CExpr, CInsn, CTree, Ea, ExprKind, InsnKind, NodeId, UnaryOp, BADADDR,
};

/// Ids of the pieces making up `var = var;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyStmt {
    pub stmt: NodeId,
    pub asg: NodeId,
    pub dst: NodeId,
    pub src: NodeId,
}

/// Builder for a [`CTree`] whose root block is filled with `push_stmt`
#[derive(Debug, Default)]
pub struct CTreeBuilder {
    tree: CTree,
}

impl CTreeBuilder {
    pub fn new() -> Self {
        Self { tree: CTree::new() }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn tree(&self) -> &CTree {
        &self.tree
    }

    pub fn finish(self) -> CTree {
        self.tree
    }

    fn expr(&mut self, kind: ExprKind) -> NodeId {
        self.tree.add_expr(CExpr::new(BADADDR, kind))
    }

    pub fn var(&mut self, idx: usize) -> NodeId {
        self.expr(ExprKind::Var { idx })
    }

    pub fn num(&mut self, value: u64) -> NodeId {
        self.expr(ExprKind::Num { value })
    }

    pub fn obj(&mut self, ea: Ea) -> NodeId {
        self.expr(ExprKind::Obj { ea })
    }

    pub fn helper(&mut self, name: impl Into<String>) -> NodeId {
        self.expr(ExprKind::Helper { name: name.into() })
    }

    pub fn asg(&mut self, ea: Ea, x: NodeId, y: NodeId) -> NodeId {
        self.tree.add_expr(CExpr::new(ea, ExprKind::Asg { x, y }))
    }

    pub fn binary(&mut self, kind: BinaryOp, x: NodeId, y: NodeId) -> NodeId {
        self.expr(ExprKind::Binary { kind, x, y })
    }

    pub fn add(&mut self, x: NodeId, y: NodeId) -> NodeId {
        self.binary(BinaryOp::Add, x, y)
    }

    pub fn unary(&mut self, kind: UnaryOp, x: NodeId) -> NodeId {
        self.expr(ExprKind::Unary { kind, x })
    }

    pub fn addr_of(&mut self, x: NodeId) -> NodeId {
        self.unary(UnaryOp::Ref, x)
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.expr(ExprKind::Call { callee, args })
    }

    /// Add any statement kind
    pub fn insn(&mut self, ea: Ea, kind: InsnKind) -> NodeId {
        self.tree.add_insn(CInsn::new(ea, kind))
    }

    pub fn expr_stmt(&mut self, ea: Ea, expr: NodeId) -> NodeId {
        self.tree.add_insn(CInsn::new(ea, InsnKind::Expr { expr }))
    }

    pub fn ret(&mut self, ea: Ea, expr: Option<NodeId>) -> NodeId {
        self.tree.add_insn(CInsn::new(ea, InsnKind::Return { expr }))
    }

    pub fn block(&mut self, ea: Ea, stmts: Vec<NodeId>) -> NodeId {
        self.tree.add_insn(CInsn::new(ea, InsnKind::Block { stmts }))
    }

    pub fn if_stmt(
        &mut self,
        ea: Ea,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    ) -> NodeId {
        self.tree.add_insn(CInsn::new(
            ea,
            InsnKind::If {
                cond,
                then_branch,
                else_branch,
            },
        ))
    }

    pub fn while_stmt(&mut self, ea: Ea, cond: NodeId, body: NodeId) -> NodeId {
        self.tree
            .add_insn(CInsn::new(ea, InsnKind::While { cond, body }))
    }

    /// Build the statement `dst = src;` over two variable indices
    pub fn copy_stmt(&mut self, ea: Ea, dst: usize, src: usize) -> CopyStmt {
        let dst_node = self.var(dst);
        let src_node = self.var(src);
        let asg = self.asg(ea, dst_node, src_node);
        let stmt = self.expr_stmt(ea, asg);
        CopyStmt {
            stmt,
            asg,
            dst: dst_node,
            src: src_node,
        }
    }

    /// Append a statement to the root block
    pub fn push_stmt(&mut self, stmt: NodeId) -> &mut Self {
        let root = self.tree.root();
        self.tree.block_push(root, stmt);
        self
    }

    /// Append a statement to a nested block
    pub fn push_into(&mut self, block: NodeId, stmt: NodeId) -> &mut Self {
        self.tree.block_push(block, stmt);
        self
    }
}
