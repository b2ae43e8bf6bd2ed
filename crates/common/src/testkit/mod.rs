//! Fixture builder for gateway tests
//!
//! Builds small DAGs directly into a [`MemoryBlocks`] so tests can exercise
//! resolution and streaming without any external store.
//!
//! # Example
//!
//! ```rust,ignore
//! use common::testkit::DagBuilder;
//!
//! let dag = DagBuilder::new().with_chunk_size(4);
//! let readme = dag.file(b"hello world")?;
//! let root = dag.dir([("README.md", readme)])?;
//!
//! let store = dag.dag();
//! let node = store.get_node(&root).await?;
//! ```

use std::path::Path;

use crate::blocks::{FsBlocks, MemoryBlocks};
use crate::dag::{ChunkLink, Dag, DirEntry, UnixfsNode};
use crate::linked_data::{BlockEncoded, Cid, CodecError, LD_CBOR_CODEC, LD_RAW_CODEC};

pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

#[derive(Clone, Debug)]
pub struct DagBuilder {
    blocks: MemoryBlocks,
    chunk_size: usize,
}

impl Default for DagBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DagBuilder {
    pub fn new() -> Self {
        Self {
            blocks: MemoryBlocks::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Split file content into chunks of at most `chunk_size` bytes
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn blocks(&self) -> MemoryBlocks {
        self.blocks.clone()
    }

    /// A [`Dag`] reading from the blocks built so far (and any added later)
    pub fn dag(&self) -> Dag {
        Dag::new(self.blocks.clone())
    }

    /// A single raw leaf
    pub fn raw(&self, data: &[u8]) -> Result<Cid, CodecError> {
        self.blocks.put(LD_RAW_CODEC, data.to_vec())
    }

    /// A chunked file node over raw leaves
    pub fn file(&self, data: &[u8]) -> Result<Cid, CodecError> {
        let chunks = data
            .chunks(self.chunk_size)
            .map(|chunk| {
                Ok(ChunkLink {
                    cid: self.raw(chunk)?,
                    size: chunk.len() as u64,
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;
        self.node(&UnixfsNode::File { chunks })
    }

    /// A directory whose entries keep the given order
    pub fn dir<I, S>(&self, entries: I) -> Result<Cid, CodecError>
    where
        I: IntoIterator<Item = (S, Cid)>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, cid)| DirEntry {
                name: name.into(),
                cid,
            })
            .collect();
        self.node(&UnixfsNode::Directory { entries })
    }

    pub fn symlink(&self, target: &str) -> Result<Cid, CodecError> {
        self.node(&UnixfsNode::Symlink {
            target: target.to_string(),
        })
    }

    /// A block under a codec the gateway does not understand
    pub fn foreign(&self, codec: u64, data: &[u8]) -> Result<Cid, CodecError> {
        self.blocks.put(codec, data.to_vec())
    }

    /// Overwrite the bytes stored for `cid` without updating its digest
    pub fn corrupt(&self, cid: &Cid, data: &[u8]) {
        self.blocks.insert(*cid, data.to_vec());
    }

    /// Write every block built so far into `root`, laid out the way
    ///  [`FsBlocks`] expects to find them
    pub fn export(&self, root: &Path) -> std::io::Result<FsBlocks> {
        std::fs::create_dir_all(root)?;
        let store = FsBlocks::new(root);
        for (cid, data) in self.blocks.snapshot() {
            std::fs::write(store.block_path(&cid), &data)?;
        }
        Ok(store)
    }

    fn node(&self, node: &UnixfsNode) -> Result<Cid, CodecError> {
        self.blocks.put(LD_CBOR_CODEC, node.encode()?)
    }
}
