//! Ctree pattern matchers used by the merge pass
//!
//! Every matcher stops at its first hit. Not finding anything is a normal outcome
//! ("precondition not met"), never an error.

use crate::ast::{
    apply_to, apply_to_mut, CExpr, CTree, CtreeVisitor, CtreeVisitorMut, ExprKind, NodeId,
    UnaryOp, VisitResult,
};

/// Replaces the first bare reference to a variable with a fresh copy of an expression.
///
/// One application rewrites at most one node; run it again on the whole tree until
/// `found` stays `None`.
#[derive(Debug)]
pub struct VarSwitcher {
    old_idx: usize,
    replacement: NodeId,
    /// Node that was rewritten by the last application
    pub found: Option<NodeId>,
}

impl VarSwitcher {
    pub fn new(old_idx: usize, replacement: NodeId) -> Self {
        Self {
            old_idx,
            replacement,
            found: None,
        }
    }

    /// Rewrite one occurrence under `start`, returning the rewritten node
    pub fn apply(mut self, tree: &mut CTree, start: NodeId) -> Option<NodeId> {
        apply_to_mut(&mut self, tree, start);
        self.found
    }
}

impl CtreeVisitorMut for VarSwitcher {
    fn visit_expr(&mut self, tree: &mut CTree, id: NodeId) -> VisitResult {
        if tree.var_idx(id) != Some(self.old_idx) {
            return VisitResult::Continue;
        }
        match tree.deep_copy_expr(self.replacement) {
            Some(copy) => {
                tree.replace_expr(id, copy);
                self.found = Some(id);
                VisitResult::Stop
            }
            None => {
                log::error!(
                    "replacement expression {} is not an expression, leaving {} alone",
                    self.replacement,
                    id
                );
                VisitResult::Stop
            }
        }
    }
}

/// Looks for an assignment to a variable other than the one being eliminated.
///
/// The comparison on the right-hand side is by node identity: a second `v = w`
/// elsewhere in the function is a different node and counts as a conflict.
#[derive(Debug)]
pub struct ConflictingWriteFinder {
    var_idx: usize,
    expected_rhs: NodeId,
    pub found: Option<NodeId>,
}

impl ConflictingWriteFinder {
    pub fn new(var_idx: usize, expected_rhs: NodeId) -> Self {
        Self {
            var_idx,
            expected_rhs,
            found: None,
        }
    }

    pub fn apply(mut self, tree: &CTree, start: NodeId) -> Option<NodeId> {
        apply_to(&mut self, tree, start);
        self.found
    }
}

impl CtreeVisitor for ConflictingWriteFinder {
    fn visit_expr(&mut self, tree: &CTree, id: NodeId, expr: &CExpr) -> VisitResult {
        match expr.as_asg() {
            Some((x, y)) if tree.var_idx(x) == Some(self.var_idx) && y != self.expected_rhs => {
                self.found = Some(id);
                VisitResult::Stop
            }
            _ => VisitResult::Continue,
        }
    }
}

/// Looks for `&v`, which would let the variable be written behind our back
#[derive(Debug)]
pub struct AddressTakenFinder {
    var_idx: usize,
    pub found: Option<NodeId>,
}

impl AddressTakenFinder {
    pub fn new(var_idx: usize) -> Self {
        Self {
            var_idx,
            found: None,
        }
    }

    pub fn apply(mut self, tree: &CTree, start: NodeId) -> Option<NodeId> {
        apply_to(&mut self, tree, start);
        self.found
    }
}

impl CtreeVisitor for AddressTakenFinder {
    fn visit_expr(&mut self, tree: &CTree, id: NodeId, expr: &CExpr) -> VisitResult {
        match expr.kind {
            ExprKind::Unary {
                kind: UnaryOp::Ref,
                x,
            } if tree.var_idx(x) == Some(self.var_idx) => {
                self.found = Some(id);
                VisitResult::Stop
            }
            _ => VisitResult::Continue,
        }
    }
}

/// Finds the first `v = w` where `v` is the given variable and `w` is any variable
#[derive(Debug)]
pub struct AssignmentFinder {
    var_idx: usize,
    pub found: Option<NodeId>,
}

impl AssignmentFinder {
    pub fn new(var_idx: usize) -> Self {
        Self {
            var_idx,
            found: None,
        }
    }

    pub fn apply(mut self, tree: &CTree, start: NodeId) -> Option<NodeId> {
        apply_to(&mut self, tree, start);
        self.found
    }
}

impl CtreeVisitor for AssignmentFinder {
    fn visit_expr(&mut self, tree: &CTree, id: NodeId, expr: &CExpr) -> VisitResult {
        match expr.as_asg() {
            Some((x, y))
                if tree.var_idx(x) == Some(self.var_idx) && tree.var_idx(y).is_some() =>
            {
                self.found = Some(id);
                VisitResult::Stop
            }
            _ => VisitResult::Continue,
        }
    }
}
