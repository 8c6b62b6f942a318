//! Local variable table
//!
//! Expressions reference variables by index into [`LVars`]. Indices are only valid for
//! one decompilation of a function; [`LVarLocator`] identifies the same variable across
//! rebuilds.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ctree::{Ea, BADADDR};

/// Comment placed on variables that were merged away
pub const SUPERFLUOUS_COMMENT: &str = "SUPERFLUOUS";

/// Storage location of a local variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VarLocation {
    /// No known location
    Bad,
    Register { reg: u32 },
    Stack { offset: i64 },
}

impl VarLocation {
    const KIND_BAD: u32 = 0;
    const KIND_REGISTER: u32 = 1;
    const KIND_STACK: u32 = 2;

    /// Encode as a fixed-size `(kind, value)` descriptor
    pub fn to_descriptor(self) -> (u32, u64) {
        match self {
            VarLocation::Bad => (Self::KIND_BAD, 0),
            VarLocation::Register { reg } => (Self::KIND_REGISTER, reg as u64),
            VarLocation::Stack { offset } => (Self::KIND_STACK, offset as u64),
        }
    }

    /// Decode a descriptor produced by [`VarLocation::to_descriptor`]
    pub fn from_descriptor(kind: u32, value: u64) -> Option<Self> {
        match kind {
            Self::KIND_BAD => Some(VarLocation::Bad),
            Self::KIND_REGISTER => u32::try_from(value)
                .ok()
                .map(|reg| VarLocation::Register { reg }),
            Self::KIND_STACK => Some(VarLocation::Stack {
                offset: value as i64,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for VarLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarLocation::Bad => write!(f, "<bad>"),
            VarLocation::Register { reg } => write!(f, "reg{}", reg),
            VarLocation::Stack { offset } if *offset < 0 => {
                write!(f, "stack-{:#x}", offset.unsigned_abs())
            }
            VarLocation::Stack { offset } => write!(f, "stack+{:#x}", offset),
        }
    }
}

/// Rebuild-stable identity of a variable: where it lives and where it is first defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LVarLocator {
    pub location: VarLocation,
    pub defea: Ea,
}

impl LVarLocator {
    pub fn new(location: VarLocation, defea: Ea) -> Self {
        Self { location, defea }
    }
}

impl Default for LVarLocator {
    fn default() -> Self {
        Self::new(VarLocation::Bad, BADADDR)
    }
}

/// A local variable of the decompiled function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LVar {
    pub name: String,
    pub location: VarLocation,
    pub defea: Ea,
    /// Width in bytes
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default)]
    pub comment: String,
    /// Whether the variable is shown in the variable list
    #[serde(default = "default_used")]
    pub used: bool,
}

fn default_width() -> u32 {
    4
}

fn default_used() -> bool {
    true
}

impl LVar {
    pub fn new(name: impl Into<String>, location: VarLocation, defea: Ea, width: u32) -> Self {
        Self {
            name: name.into(),
            location,
            defea,
            width,
            comment: String::new(),
            used: true,
        }
    }

    pub fn locator(&self) -> LVarLocator {
        LVarLocator::new(self.location, self.defea)
    }

    pub fn is_superfluous(&self) -> bool {
        self.comment == SUPERFLUOUS_COMMENT || !self.used
    }
}

/// Variable table of one decompiled function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LVars {
    vars: Vec<LVar>,
}

impl LVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable, returning its index
    pub fn push(&mut self, lvar: LVar) -> usize {
        self.vars.push(lvar);
        self.vars.len() - 1
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&LVar> {
        self.vars.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut LVar> {
        self.vars.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LVar> {
        self.vars.iter()
    }

    /// Find the variable a locator refers to
    pub fn find(&self, locator: &LVarLocator) -> Option<&LVar> {
        self.vars.iter().find(|v| v.locator() == *locator)
    }

    /// Index of the variable a locator refers to
    pub fn find_index(&self, locator: &LVarLocator) -> Option<usize> {
        self.vars.iter().position(|v| v.locator() == *locator)
    }

    /// Index of the variable called `name`
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.name == name)
    }

    /// Display name of a variable, `v<idx>` when the table has no entry
    pub fn name_of(&self, idx: usize) -> String {
        self.get(idx)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| format!("v{}", idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_round_trip_for_negative_stack_offset() {
        let loc = VarLocation::Stack { offset: -0x28 };
        let (kind, value) = loc.to_descriptor();
        assert_eq!(VarLocation::from_descriptor(kind, value), Some(loc));
        assert_eq!(loc.to_string(), "stack-0x28");
    }

    #[test]
    fn test_unknown_descriptor_kind() {
        assert_eq!(VarLocation::from_descriptor(9, 0), None);
        assert_eq!(VarLocation::from_descriptor(1, u64::MAX), None);
    }

    #[test]
    fn test_find_by_locator_then_index() {
        let mut lvars = LVars::new();
        lvars.push(LVar::new("v1", VarLocation::Register { reg: 0 }, 0x1000, 4));
        lvars.push(LVar::new("v2", VarLocation::Stack { offset: -8 }, 0x1004, 8));

        let locator = LVarLocator::new(VarLocation::Stack { offset: -8 }, 0x1004);
        let lvar = lvars.find(&locator).unwrap();
        assert_eq!(lvar.name, "v2");
        assert_eq!(lvar.width, 8);
        assert_eq!(lvars.find_index(&locator), Some(1));

        let missing = LVarLocator::new(VarLocation::Stack { offset: -8 }, 0x2000);
        assert!(lvars.find(&missing).is_none());
        assert_eq!(lvars.name_of(7), "v7");
    }
}
