//! sf-lvars-rs: superfluous local variable elimination for decompiled code
//!
//! This library merges `v = w` copy variables into their source in a decompiler
//! ctree, remembers which variables the user marked, and replays those merges each
//! time the function is decompiled again.

pub mod analysis;
pub mod ast;
pub mod cfunc;
pub mod cli;
pub mod config;
pub mod error;
pub mod plugin;
pub mod registry;

pub use error::{Error as SfLVarsError, Result as SfLVarsResult};

// Re-export commonly used types
pub use analysis::{merge_var, MergeError, MergeOutcome};
pub use ast::{CTree, CTreeBuilder, LVar, LVars, NodeId, VarLocation};
pub use cfunc::CFunc;
pub use config::PluginConfig;
pub use plugin::Session;
pub use registry::{FileStore, MemoryStore, NodeStore, SfLVar, SuperfluousRegistry};
