//! Decompiled function representation
//!
//! A [`CFunc`] owns the body tree and the variable table for one decompilation pass.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ast::{CTree, Ea, LVars};
use crate::error::{Error, Result};

/// One decompiled function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CFunc {
    pub entry_ea: Ea,
    pub body: CTree,
    pub lvars: LVars,
}

impl CFunc {
    pub fn new(entry_ea: Ea, body: CTree, lvars: LVars) -> Self {
        Self {
            entry_ea,
            body,
            lvars,
        }
    }

    /// Parse a JSON function dump and check its tree shape
    pub fn from_json(json: &str) -> Result<Self> {
        let cfunc: CFunc = serde_json::from_str(json)?;
        cfunc
            .body
            .validate()
            .map_err(|e| Error::invalid_args(format!("malformed function body: {}", e)))?;
        Ok(cfunc)
    }

    /// Load a JSON function dump from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
