//! Ctree analysis and rewriting
//!
//! This module provides the superfluous-variable machinery:
//! - Pattern matchers over the ctree
//! - Eligibility checks for a selected assignment
//! - The merge pass that substitutes the copy and removes the dead assignment

pub mod matchers;
pub mod merge;
pub mod safety;

pub use matchers::{AddressTakenFinder, AssignmentFinder, ConflictingWriteFinder, VarSwitcher};
pub use merge::{merge_var, MergeError, MergeOutcome};
pub use safety::{assignment_is_superfluous, find_var_asg};
