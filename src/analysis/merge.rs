//! Superfluous variable merge
//!
//! Given `v1 = v2;` where `v1` is written nowhere else, every read of `v1` is replaced
//! by its own copy of `v2` and the assignment statement is removed from its block.
//! The only supported shape is
//!
//! ```text
//! block -> expression statement -> asg -> var1
//!                                     \-> var2
//! ```
//!
//! All checks run before the first mutation; a refused merge leaves the tree exactly
//! as it was.

use thiserror::Error;

use super::matchers::{AddressTakenFinder, ConflictingWriteFinder, VarSwitcher};
use crate::ast::{print_expr, CInsn, InsnKind, NodeId};
use crate::cfunc::CFunc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("{0} is not a `var = var` assignment")]
    NotAnAssignment(NodeId),
    #[error("parent of assignment {asg} is not an expression statement")]
    ParentNotExpression { asg: NodeId },
    #[error("expression statement {stmt} is not directly inside a block")]
    ParentNotBlock { stmt: NodeId },
    #[error("variable v{var} is assigned to itself")]
    SelfAssignment { var: usize },
    #[error(
        "merging vars with multiple assignments is not supported (v{var} is also written at {at}), maybe a split will help"
    )]
    MultipleAssignments { var: usize, at: NodeId },
    #[error("address of v{var} is taken at {at}")]
    AddressTaken { var: usize, at: NodeId },
}

impl MergeError {
    /// Whether the tree did not have the supported nesting
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            MergeError::ParentNotExpression { .. } | MergeError::ParentNotBlock { .. }
        )
    }
}

/// What a successful merge did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Variable that no longer appears in the body
    pub removed_var: usize,
    /// Variable substituted at every former read
    pub replacement_var: usize,
    /// Number of reads rewritten
    pub replaced: usize,
    /// Expression statement taken out of `block`
    pub removed_stmt: NodeId,
    pub block: NodeId,
}

/// Eliminate the variable defined by the copy `asg`.
///
/// The caller must hold the function exclusively; the tree is mutated in place.
/// Durable bookkeeping is the caller's job.
pub fn merge_var(cfunc: &mut CFunc, asg: NodeId) -> Result<MergeOutcome, MergeError> {
    let tree = &mut cfunc.body;

    let (x, y) = tree
        .expr(asg)
        .and_then(|e| e.as_asg())
        .ok_or(MergeError::NotAnAssignment(asg))?;
    let (Some(removed_var), Some(replacement_var)) = (tree.var_idx(x), tree.var_idx(y)) else {
        return Err(MergeError::NotAnAssignment(asg));
    };

    // make sure we're dealing with block -> expr -> asg
    let pe = tree
        .find_parent_of(asg)
        .filter(|p| matches!(tree.insn(*p).map(|i| &i.kind), Some(InsnKind::Expr { .. })))
        .ok_or_else(|| {
            log::error!("parent of assignment {} is not an expression", asg);
            MergeError::ParentNotExpression { asg }
        })?;
    log::debug!("found expr parent {}", pe);

    let pb = tree
        .find_parent_of(pe)
        .filter(|p| tree.insn(*p).map(CInsn::is_block).unwrap_or(false))
        .ok_or_else(|| {
            log::error!("expression parent {} is not a block", pe);
            MergeError::ParentNotBlock { stmt: pe }
        })?;
    log::debug!("found block parent {}", pb);

    if removed_var == replacement_var {
        return Err(MergeError::SelfAssignment { var: removed_var });
    }

    // hide the statement while scanning so the assignment itself is neither reported
    // as a second write nor rewritten
    let saved = match tree.insn_mut(pe) {
        Some(insn) => std::mem::replace(&mut insn.kind, InsnKind::Empty),
        None => return Err(MergeError::ParentNotExpression { asg }),
    };
    let root = tree.root();

    let conflict = ConflictingWriteFinder::new(removed_var, y)
        .apply(tree, root)
        .map(|at| MergeError::MultipleAssignments {
            var: removed_var,
            at,
        })
        .or_else(|| {
            AddressTakenFinder::new(removed_var)
                .apply(tree, root)
                .map(|at| MergeError::AddressTaken {
                    var: removed_var,
                    at,
                })
        });
    if let Some(err) = conflict {
        log::warn!("{}", err);
        if let Some(insn) = tree.insn_mut(pe) {
            insn.kind = saved;
        }
        return Err(err);
    }

    log::debug!(
        "removing assignment @ {:#x}, replacing all instances of \"{}\" with \"{}\"",
        tree.expr(asg).map(|e| e.ea).unwrap_or_default(),
        print_expr(tree, &cfunc.lvars, x),
        print_expr(tree, &cfunc.lvars, y)
    );

    // each rewrite restarts the walk from the root
    let mut replaced = 0;
    while VarSwitcher::new(removed_var, y)
        .apply(tree, root)
        .is_some()
    {
        replaced += 1;
    }

    if let Some(insn) = tree.insn_mut(pe) {
        insn.kind = saved;
    }

    if !tree.block_erase(pb, pe) {
        log::warn!("statement {} vanished from block {}", pe, pb);
    }

    Ok(MergeOutcome {
        removed_var,
        replacement_var,
        replaced,
        removed_stmt: pe,
        block: pb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CTreeBuilder, LVars};

    fn cfunc(b: CTreeBuilder) -> CFunc {
        CFunc::new(0x1000, b.finish(), LVars::new())
    }

    #[test]
    fn test_merge_inside_nested_block() {
        let mut b = CTreeBuilder::new();
        let cond = b.var(0);
        let copy = b.copy_stmt(0x10, 1, 2);
        let v1 = b.var(1);
        let ret = b.ret(0x14, Some(v1));
        let inner = b.block(0x10, vec![copy.stmt, ret]);
        let if_stmt = b.if_stmt(0x08, cond, inner, None);
        b.push_stmt(if_stmt);
        let mut f = cfunc(b);

        let outcome = merge_var(&mut f, copy.asg).unwrap();
        assert_eq!(outcome.block, inner);
        assert_eq!(outcome.replaced, 1);
        assert_eq!(f.body.block_stmts(inner), &[ret]);
        assert_eq!(f.body.var_idx(v1), Some(2));
    }

    #[test]
    fn test_assignment_used_as_condition_is_structural_mismatch() {
        let mut b = CTreeBuilder::new();
        let x = b.var(1);
        let y = b.var(2);
        let asg = b.asg(0x10, x, y);
        let body = b.block(0x10, vec![]);
        let while_stmt = b.while_stmt(0x10, asg, body);
        b.push_stmt(while_stmt);
        let mut f = cfunc(b);
        let before = f.clone();

        let err = merge_var(&mut f, asg).unwrap_err();
        assert_eq!(err, MergeError::ParentNotExpression { asg });
        assert!(err.is_structural());
        assert_eq!(f, before);
    }

    #[test]
    fn test_expression_statement_outside_block() {
        let mut b = CTreeBuilder::new();
        let cond = b.var(0);
        let copy = b.copy_stmt(0x10, 1, 2);
        let if_stmt = b.if_stmt(0x08, cond, copy.stmt, None);
        b.push_stmt(if_stmt);
        let mut f = cfunc(b);

        assert_eq!(
            merge_var(&mut f, copy.asg),
            Err(MergeError::ParentNotBlock { stmt: copy.stmt })
        );
    }

    #[test]
    fn test_address_taken_refused() {
        let mut b = CTreeBuilder::new();
        let copy = b.copy_stmt(0x10, 1, 2);
        let f_obj = b.obj(0x4000);
        let v1 = b.var(1);
        let r = b.addr_of(v1);
        let call = b.call(f_obj, vec![r]);
        let call_stmt = b.expr_stmt(0x14, call);
        b.push_stmt(copy.stmt).push_stmt(call_stmt);
        let mut f = cfunc(b);
        let before = f.clone();

        assert_eq!(
            merge_var(&mut f, copy.asg),
            Err(MergeError::AddressTaken { var: 1, at: r })
        );
        assert_eq!(f, before);
    }

    #[test]
    fn test_self_assignment_refused() {
        let mut b = CTreeBuilder::new();
        let copy = b.copy_stmt(0x10, 1, 1);
        b.push_stmt(copy.stmt);
        let mut f = cfunc(b);

        assert_eq!(
            merge_var(&mut f, copy.asg),
            Err(MergeError::SelfAssignment { var: 1 })
        );
    }

    #[test]
    fn test_non_assignment_refused() {
        let mut b = CTreeBuilder::new();
        let v = b.var(1);
        let stmt = b.expr_stmt(0x10, v);
        b.push_stmt(stmt);
        let mut f = cfunc(b);

        assert_eq!(merge_var(&mut f, v), Err(MergeError::NotAnAssignment(v)));
    }
}
