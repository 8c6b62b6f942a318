//! Superfluous variable registry
//!
//! Remembers which (function, variable) pairs were merged so the merge can be replayed
//! whenever the function is decompiled again. Every successful `add`/`remove` rewrites
//! the whole record set to the backing store.

pub mod record;
pub mod store;

pub use record::{decode_records, encode_records, SfLVar, RECORD_SIZE};
pub use store::{FileStore, MemoryStore, NodeStore};

use crate::analysis::{merge_var, AssignmentFinder, MergeOutcome};
use crate::ast::Ea;
use crate::cfunc::CFunc;
use crate::error::Result;

/// Default storage node name
pub const DEFAULT_NODE_NAME: &str = "$ hexrays sf_lvars";

/// Result of replaying the saved records of one function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Successful merges, in record order
    pub merged: Vec<MergeOutcome>,
    /// Records whose variable could not be found in the variable table
    pub unresolved: Vec<SfLVar>,
    /// Records whose defining copy was missing or could not be merged
    pub failed: Vec<SfLVar>,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.failed.is_empty()
    }
}

/// Set of superfluous variables backed by a [`NodeStore`]
pub struct SuperfluousRegistry {
    records: Vec<SfLVar>,
    store: Box<dyn NodeStore>,
    node: String,
}

impl std::fmt::Debug for SuperfluousRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperfluousRegistry")
            .field("node", &self.node)
            .field("records", &self.records)
            .finish()
    }
}

impl SuperfluousRegistry {
    /// Open the registry stored under `node`, loading any saved records
    pub fn open(store: Box<dyn NodeStore>, node: impl Into<String>) -> Result<Self> {
        let mut registry = Self {
            records: Vec::new(),
            store,
            node: node.into(),
        };
        registry.load()?;
        Ok(registry)
    }

    /// Reload the record set from the store
    pub fn load(&mut self) -> Result<()> {
        let count = self.store.altval(&self.node)? as usize;
        self.records = if count == 0 {
            Vec::new()
        } else {
            let blob = self.store.blob(&self.node)?.unwrap_or_default();
            decode_records(&blob, count, &self.node)?
        };
        log::debug!(
            "loaded {} superfluous variable records from '{}'",
            self.records.len(),
            self.node
        );
        Ok(())
    }

    /// Write `records` (blob, then count) and adopt them once the store accepted both
    fn commit(&mut self, records: Vec<SfLVar>) -> Result<()> {
        let blob = encode_records(&records)?;
        self.store.set_blob(&self.node, &blob)?;
        self.store.set_altval(&self.node, records.len() as u64)?;
        self.records = records;
        Ok(())
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn records(&self) -> &[SfLVar] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, record: &SfLVar) -> bool {
        self.records.contains(record)
    }

    /// Records belonging to the function at `func_ea`
    pub fn for_function(&self, func_ea: Ea) -> impl Iterator<Item = &SfLVar> {
        self.records.iter().filter(move |r| r.func_ea == func_ea)
    }

    /// Add a record; returns `false` (and changes nothing) if it is already present.
    ///
    /// When the store rejects the write the in-memory set is left as it was.
    pub fn add(&mut self, record: SfLVar) -> Result<bool> {
        if self.contains(&record) {
            log::warn!("lvar is already marked superfluous ({})", record);
            return Ok(false);
        }
        log::debug!("adding superfluous variable ({})", record);
        let mut records = self.records.clone();
        records.push(record);
        self.commit(records)?;
        Ok(true)
    }

    /// Remove a record; returns `false` (and changes nothing) if it is not present
    pub fn remove(&mut self, record: &SfLVar) -> Result<bool> {
        let Some(pos) = self.records.iter().position(|r| r == record) else {
            log::warn!("lvar is not marked superfluous ({})", record);
            return Ok(false);
        };
        let mut records = self.records.clone();
        records.remove(pos);
        self.commit(records)?;
        Ok(true)
    }

    /// Forget every record and delete the storage node
    pub fn reset(&mut self) -> Result<()> {
        self.records.clear();
        self.store.kill(&self.node)
    }

    /// Give the backing store back (session teardown)
    pub fn into_store(self) -> Box<dyn NodeStore> {
        self.store
    }

    /// Re-apply every saved merge for `cfunc`.
    ///
    /// Records that cannot be resolved or merged are logged and skipped; the rest of
    /// the replay goes on.
    pub fn replay(&self, cfunc: &mut CFunc) -> ReplayReport {
        let mut report = ReplayReport::default();

        for record in self.for_function(cfunc.entry_ea) {
            let Some(vidx) = cfunc.lvars.find_index(&record.locator) else {
                log::warn!("unable to find saved superfluous variable ({})", record);
                report.unresolved.push(*record);
                continue;
            };

            let root = cfunc.body.root();
            let Some(asg) = AssignmentFinder::new(vidx).apply(&cfunc.body, root) else {
                log::warn!(
                    "unable to find superfluous lvar's initial assignment ({})",
                    record
                );
                report.failed.push(*record);
                continue;
            };

            match merge_var(cfunc, asg) {
                Ok(outcome) => report.merged.push(outcome),
                Err(err) => {
                    log::warn!("replay of ({}) failed: {}", record, err);
                    report.failed.push(*record);
                }
            }
        }

        report
    }
}
