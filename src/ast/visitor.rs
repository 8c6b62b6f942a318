//! Ctree traversal primitives
//!
//! Traversal is pre-order: a statement is visited before its expressions and child
//! statements, an expression before its operands (left to right). Visitors return
//! [`VisitResult::Stop`] to end the walk at the first match.
//!
//! Read-only visitors get a shared tree. [`CtreeVisitorMut`] may rewrite the node it is
//! currently visiting, and must then stop; callers that need every occurrence rewritten
//! start a fresh walk after each mutation.

use super::ctree::{CExpr, CInsn, CItem, CTree, NodeId};

/// Outcome of visiting one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitResult {
    Continue,
    Stop,
}

/// Read-only ctree visitor
pub trait CtreeVisitor {
    fn visit_expr(&mut self, _tree: &CTree, _id: NodeId, _expr: &CExpr) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_insn(&mut self, _tree: &CTree, _id: NodeId, _insn: &CInsn) -> VisitResult {
        VisitResult::Continue
    }
}

/// Visitor allowed to rewrite the expression it is visiting
pub trait CtreeVisitorMut {
    fn visit_expr(&mut self, tree: &mut CTree, id: NodeId) -> VisitResult;
}

/// Walk the subtree rooted at `start`.
///
/// Returns `true` when the visitor stopped the traversal.
pub fn apply_to<V>(visitor: &mut V, tree: &CTree, start: NodeId) -> bool
where
    V: CtreeVisitor + ?Sized,
{
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        let Some(item) = tree.get(id) else {
            log::warn!("ctree walk reached dangling node {}", id);
            continue;
        };
        let result = match item {
            CItem::Expr(expr) => visitor.visit_expr(tree, id, expr),
            CItem::Insn(insn) => visitor.visit_insn(tree, id, insn),
        };
        if result == VisitResult::Stop {
            return true;
        }
        stack.extend(item.children().into_iter().rev());
    }
    false
}

/// Walk the subtree rooted at `start`, offering every expression to a mutating visitor.
///
/// The children of a node are read after the visitor returns, so a visitor that
/// rewrote a node and continued would descend into the new contents. Visitors in this
/// crate always stop right after rewriting.
pub fn apply_to_mut<V>(visitor: &mut V, tree: &mut CTree, start: NodeId) -> bool
where
    V: CtreeVisitorMut + ?Sized,
{
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        let is_expr = match tree.get(id) {
            Some(item) => item.is_expr(),
            None => {
                log::warn!("ctree walk reached dangling node {}", id);
                continue;
            }
        };
        if is_expr && visitor.visit_expr(tree, id) == VisitResult::Stop {
            return true;
        }
        stack.extend(tree.children(id).into_iter().rev());
    }
    false
}

/// Every expression under `start` satisfying `predicate`, in visit order
pub fn collect_exprs<F>(tree: &CTree, start: NodeId, mut predicate: F) -> Vec<NodeId>
where
    F: FnMut(&CTree, NodeId, &CExpr) -> bool,
{
    struct Collector<'p, F> {
        predicate: &'p mut F,
        hits: Vec<NodeId>,
    }

    impl<F> CtreeVisitor for Collector<'_, F>
    where
        F: FnMut(&CTree, NodeId, &CExpr) -> bool,
    {
        fn visit_expr(&mut self, tree: &CTree, id: NodeId, expr: &CExpr) -> VisitResult {
            if (self.predicate)(tree, id, expr) {
                self.hits.push(id);
            }
            VisitResult::Continue
        }
    }

    let mut collector = Collector {
        predicate: &mut predicate,
        hits: Vec::new(),
    };
    apply_to(&mut collector, tree, start);
    collector.hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::CTreeBuilder;
    use crate::ast::ctree::InsnKind;

    #[derive(Default)]
    struct OrderRecorder {
        order: Vec<NodeId>,
        stop_at: Option<NodeId>,
    }

    impl CtreeVisitor for OrderRecorder {
        fn visit_expr(&mut self, _tree: &CTree, id: NodeId, _expr: &CExpr) -> VisitResult {
            self.order.push(id);
            if Some(id) == self.stop_at {
                VisitResult::Stop
            } else {
                VisitResult::Continue
            }
        }

        fn visit_insn(&mut self, _tree: &CTree, id: NodeId, _insn: &CInsn) -> VisitResult {
            self.order.push(id);
            VisitResult::Continue
        }
    }

    #[test]
    fn test_pre_order_and_early_stop() {
        let mut b = CTreeBuilder::new();
        let copy = b.copy_stmt(0x10, 1, 2);
        b.push_stmt(copy.stmt);
        let x = b.var(1);
        let ret = b.ret(0x14, Some(x));
        b.push_stmt(ret);
        let tree = b.finish();

        let mut all = OrderRecorder::default();
        assert!(!apply_to(&mut all, &tree, tree.root()));
        assert_eq!(
            all.order,
            vec![tree.root(), copy.stmt, copy.asg, copy.dst, copy.src, ret, x]
        );

        let mut early = OrderRecorder {
            stop_at: Some(copy.dst),
            ..Default::default()
        };
        assert!(apply_to(&mut early, &tree, tree.root()));
        assert_eq!(early.order.last(), Some(&copy.dst));
        assert!(!early.order.contains(&ret));
    }

    #[test]
    fn test_empty_statement_hides_its_expression() {
        let mut b = CTreeBuilder::new();
        let copy = b.copy_stmt(0x10, 1, 2);
        b.push_stmt(copy.stmt);
        let mut tree = b.finish();
        tree.insn_mut(copy.stmt).unwrap().kind = InsnKind::Empty;

        let hits = collect_exprs(&tree, tree.root(), |_, _, e| e.var_idx().is_some());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_collect_in_visit_order() {
        let mut b = CTreeBuilder::new();
        let a = b.var(3);
        let c = b.var(3);
        let sum = b.add(a, c);
        let stmt = b.expr_stmt(0x20, sum);
        b.push_stmt(stmt);
        let tree = b.finish();

        assert_eq!(
            collect_exprs(&tree, tree.root(), |_, _, e| e.var_idx() == Some(3)),
            vec![a, c]
        );
    }
}
