//! DAG access for the gateway
//!
//! [`DagStore`] is the capability the HTTP layer is written against: fetch a
//! node by CID, look up a named child of a directory, enumerate a directory,
//! and open a file as a seekable byte stream. [`Dag`] implements it on top of
//! any [`BlockStore`].
//!
//! # Node kinds
//!
//! Every node is classified into a closed [`Kind`]:
//!
//! ```text
//! raw block ............................ RawLeaf
//! dag-cbor UnixfsNode::File ............ RegularFile   (ordered raw chunks)
//! dag-cbor UnixfsNode::Directory ....... Directory     (ordered named links)
//! dag-cbor UnixfsNode::Symlink ......... Symlink
//! anything else ........................ Unsupported
//! ```
//!
//! # Integrity
//!
//! Blocks addressed by a BLAKE3 multihash are checked against their digest as
//! they are read. A mismatch surfaces as a fetch failure, never as content.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncSeek};

use crate::blocks::{BlockStore, BlockStoreError};
use crate::linked_data::{verify, Cid};

mod node;
mod reader;

pub use node::{ChunkLink, DagNode, DirEntry, Kind, NodeData, UnixfsNode};
pub use reader::DagReader;

/// A byte source that supports both sequential reads and absolute seeks
pub trait SeekableStream: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T> SeekableStream for T where T: AsyncRead + AsyncSeek + Send + Unpin {}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("node not found: {0}")]
    NotFound(Cid),
    #[error("no child named {0:?}")]
    ChildNotFound(String),
    #[error("node {0} is not a directory")]
    NotADirectory(Cid),
    #[error("node {0} is not a file")]
    NotAFile(Cid),
    #[error("fetch failed: {0}")]
    Fetch(#[source] BlockStoreError),
}

#[async_trait]
pub trait DagStore: Send + Sync {
    /// Fetch and decode the node addressed by `cid`
    async fn get_node(&self, cid: &Cid) -> Result<DagNode, StoreError>;

    /// Resolve the child named `name` of a directory node
    async fn get_child(&self, dir: &DagNode, name: &str) -> Result<DagNode, StoreError>;

    /// Enumerate the direct children of a directory, in DAG order
    async fn list_children(&self, dir: &DagNode) -> Result<Vec<DirEntry>, StoreError>;

    /// Open the full content of a file-like node as a seekable stream
    async fn open_stream(&self, file: &DagNode) -> Result<Box<dyn SeekableStream>, StoreError>;

    /// Check that the underlying storage is reachable
    async fn ready(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// [`DagStore`] over a shared [`BlockStore`]
#[derive(Clone, Debug)]
pub struct Dag {
    blocks: Arc<dyn BlockStore>,
}

impl Dag {
    pub fn new(blocks: impl BlockStore + 'static) -> Self {
        Self {
            blocks: Arc::new(blocks),
        }
    }

    pub fn from_shared(blocks: Arc<dyn BlockStore>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &Arc<dyn BlockStore> {
        &self.blocks
    }

    async fn get_block(&self, cid: &Cid) -> Result<Bytes, BlockStoreError> {
        let data = self.blocks.get(cid).await?;
        if !verify(cid, &data) {
            return Err(BlockStoreError::Corrupt(*cid));
        }
        Ok(data)
    }
}

#[async_trait]
impl DagStore for Dag {
    async fn get_node(&self, cid: &Cid) -> Result<DagNode, StoreError> {
        match self.get_block(cid).await {
            Ok(block) => Ok(DagNode::decode(*cid, block)),
            Err(BlockStoreError::NotFound(cid)) => Err(StoreError::NotFound(cid)),
            Err(e) => Err(StoreError::Fetch(e)),
        }
    }

    async fn get_child(&self, dir: &DagNode, name: &str) -> Result<DagNode, StoreError> {
        let entries = dir
            .entries()
            .ok_or_else(|| StoreError::NotADirectory(*dir.cid()))?;
        let entry = entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| StoreError::ChildNotFound(name.to_string()))?;

        // the link exists, so a missing block means linked content is
        //  unavailable rather than a bad name
        self.get_block(&entry.cid)
            .await
            .map(|block| DagNode::decode(entry.cid, block))
            .map_err(StoreError::Fetch)
    }

    async fn list_children(&self, dir: &DagNode) -> Result<Vec<DirEntry>, StoreError> {
        dir.entries()
            .map(|entries| entries.to_vec())
            .ok_or_else(|| StoreError::NotADirectory(*dir.cid()))
    }

    async fn open_stream(&self, file: &DagNode) -> Result<Box<dyn SeekableStream>, StoreError> {
        match file.data() {
            NodeData::RawLeaf(data) => Ok(Box::new(Cursor::new(data.clone()))),
            NodeData::File(chunks) => Ok(Box::new(DagReader::new(
                self.blocks.clone(),
                chunks.clone(),
            ))),
            NodeData::Directory(_) | NodeData::Symlink(_) | NodeData::Unsupported { .. } => {
                Err(StoreError::NotAFile(*file.cid()))
            }
        }
    }

    async fn ready(&self) -> Result<(), StoreError> {
        self.blocks.ready().await.map_err(StoreError::Fetch)
    }
}
