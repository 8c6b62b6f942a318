//! Eligibility checks for superfluous-variable elimination
//!
//! Only `varX = varY` copies qualify. The check for other writes to `varX` needs a
//! full walk of the function and is left to [`merge_var`](super::merge_var), which does
//! it right before mutating.

use crate::ast::{CTree, NodeId};

/// Check that `asg` has the shape of an eliminable copy.
///
/// When `selected` is given it must be the assignee, i.e. the user pointed at the
/// variable being defined rather than at the source.
pub fn assignment_is_superfluous(tree: &CTree, asg: NodeId, selected: Option<NodeId>) -> bool {
    let Some((x, y)) = tree.expr(asg).and_then(|e| e.as_asg()) else {
        log::debug!("{} is not an assignment", asg);
        return false;
    };

    // for now only varX = varY
    if tree.var_idx(x).is_none() || tree.var_idx(y).is_none() {
        log::debug!("selected assignment is too complex");
        return false;
    }

    if let Some(selected) = selected {
        if selected != x {
            log::debug!("selected var is not the assignee");
            return false;
        }
    }

    true
}

/// Resolve the item under the cursor to an eliminable assignment.
///
/// `selection` is `None` when the cursor is not on a ctree item at all.
pub fn find_var_asg(tree: &CTree, selection: Option<NodeId>) -> Option<NodeId> {
    let Some(selected) = selection else {
        log::debug!("selection is not a ctree item");
        return None;
    };

    if tree.var_idx(selected).is_none() {
        log::debug!("selection {} is not a var", selected);
        return None;
    }

    let Some(parent) = tree.find_parent_of(selected) else {
        log::debug!("selection var {} has no parent", selected);
        return None;
    };

    if tree.expr(parent).and_then(|e| e.as_asg()).is_none() {
        log::debug!("selection var parent is not an assignment");
        return None;
    }

    assignment_is_superfluous(tree, parent, Some(selected)).then_some(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::CTreeBuilder;

    #[test]
    fn test_copy_is_superfluous_only_from_assignee() {
        let mut b = CTreeBuilder::new();
        let copy = b.copy_stmt(0x10, 1, 2);
        b.push_stmt(copy.stmt);
        let tree = b.finish();

        assert!(assignment_is_superfluous(&tree, copy.asg, None));
        assert!(assignment_is_superfluous(&tree, copy.asg, Some(copy.dst)));
        assert!(!assignment_is_superfluous(&tree, copy.asg, Some(copy.src)));

        assert_eq!(find_var_asg(&tree, Some(copy.dst)), Some(copy.asg));
        assert_eq!(find_var_asg(&tree, Some(copy.src)), None);
        assert_eq!(find_var_asg(&tree, None), None);
        assert_eq!(find_var_asg(&tree, Some(copy.asg)), None);
    }

    #[test]
    fn test_non_variable_rhs_is_rejected() {
        let mut b = CTreeBuilder::new();
        let x = b.var(1);
        let y = b.var(2);
        let one = b.num(1);
        let sum = b.add(y, one);
        let asg = b.asg(0x10, x, sum);
        let stmt = b.expr_stmt(0x10, asg);
        b.push_stmt(stmt);
        let tree = b.finish();

        assert!(!assignment_is_superfluous(&tree, asg, None));
        assert_eq!(find_var_asg(&tree, Some(x)), None);
    }

    #[test]
    fn test_variable_outside_assignment() {
        let mut b = CTreeBuilder::new();
        let v = b.var(1);
        let ret = b.ret(0x20, Some(v));
        b.push_stmt(ret);
        let detached = b.var(1);
        let tree = b.finish();

        assert_eq!(find_var_asg(&tree, Some(v)), None);
        assert_eq!(find_var_asg(&tree, Some(detached)), None);
    }
}
