//! Named-node key/value storage
//!
//! A node holds one binary blob and one integer slot, which is all the registry
//! needs: the encoded records and their count.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Storage for named nodes
pub trait NodeStore {
    /// Whether anything is stored under `node`
    fn exists(&self, node: &str) -> bool;

    /// Blob stored under `node`, `None` when absent
    fn blob(&self, node: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite the blob of `node`
    fn set_blob(&mut self, node: &str, data: &[u8]) -> Result<()>;

    /// Integer slot of `node`, zero when absent
    fn altval(&self, node: &str) -> Result<u64>;

    fn set_altval(&mut self, node: &str, value: u64) -> Result<()>;

    /// Delete everything stored under `node`
    fn kill(&mut self, node: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NodeData {
    blob: Option<Vec<u8>>,
    altval: u64,
}

/// In-memory store for hosts that persist on their own, and for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: HashMap<String, NodeData>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations performed so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl NodeStore for MemoryStore {
    fn exists(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    fn blob(&self, node: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.nodes.get(node).and_then(|n| n.blob.clone()))
    }

    fn set_blob(&mut self, node: &str, data: &[u8]) -> Result<()> {
        self.nodes.entry(node.to_string()).or_default().blob = Some(data.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn altval(&self, node: &str) -> Result<u64> {
        Ok(self.nodes.get(node).map(|n| n.altval).unwrap_or(0))
    }

    fn set_altval(&mut self, node: &str, value: u64) -> Result<()> {
        self.nodes.entry(node.to_string()).or_default().altval = value;
        self.writes += 1;
        Ok(())
    }

    fn kill(&mut self, node: &str) -> Result<()> {
        self.nodes.remove(node);
        self.writes += 1;
        Ok(())
    }
}

/// Directory-backed store: `<node>.blob` holds the blob, `<node>.alt` the
/// integer slot as 8 little-endian bytes
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_stem(node: &str) -> String {
        node.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }

    fn blob_path(&self, node: &str) -> PathBuf {
        self.dir.join(format!("{}.blob", Self::file_stem(node)))
    }

    fn alt_path(&self, node: &str) -> PathBuf {
        self.dir.join(format!("{}.alt", Self::file_stem(node)))
    }

    fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_optional(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl NodeStore for FileStore {
    fn exists(&self, node: &str) -> bool {
        self.blob_path(node).exists() || self.alt_path(node).exists()
    }

    fn blob(&self, node: &str) -> Result<Option<Vec<u8>>> {
        Self::read_optional(&self.blob_path(node))
    }

    fn set_blob(&mut self, node: &str, data: &[u8]) -> Result<()> {
        fs::write(self.blob_path(node), data)?;
        Ok(())
    }

    fn altval(&self, node: &str) -> Result<u64> {
        let Some(data) = Self::read_optional(&self.alt_path(node))? else {
            return Ok(0);
        };
        let bytes: [u8; 8] = data.as_slice().try_into().map_err(|_| {
            crate::error::Error::corrupt_store(
                node,
                format!("count slot holds {} bytes instead of 8", data.len()),
            )
        })?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn set_altval(&mut self, node: &str, value: u64) -> Result<()> {
        fs::write(self.alt_path(node), value.to_le_bytes())?;
        Ok(())
    }

    fn kill(&mut self, node: &str) -> Result<()> {
        Self::remove_optional(&self.blob_path(node))?;
        Self::remove_optional(&self.alt_path(node))
    }
}
