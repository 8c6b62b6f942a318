//! Ctree module
//!
//! This module provides the decompiled-code tree the rewrite passes operate on.
//! The module is organized into sub-modules by functionality:
//!
//! - `ctree`: arena-backed statement/expression tree with identity-stable nodes
//! - `lvars`: local variable table and rebuild-stable variable locators
//! - `visitor`: pre-order traversal with early termination
//! - `builder`: tree construction helpers
//! - `printer`: pseudo-C rendering

pub mod builder;
pub mod ctree;
pub mod lvars;
pub mod printer;
pub mod visitor;

// Re-export the main types for public API
pub use builder::{CTreeBuilder, CopyStmt};
pub use ctree::{
    BinaryOp, CExpr, CInsn, CItem, CTree, CTreeError, Ea, ExprKind, InsnKind, NodeId,
    UnaryOp, BADADDR,
};
pub use lvars::{LVar, LVarLocator, LVars, VarLocation, SUPERFLUOUS_COMMENT};
pub use printer::{print_expr, print_function, print_insn};
pub use visitor::{
    apply_to, apply_to_mut, collect_exprs, CtreeVisitor, CtreeVisitorMut, VisitResult,
};
