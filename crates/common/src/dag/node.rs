use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::linked_data::{BlockEncoded, Cid, LD_CBOR_CODEC, LD_RAW_CODEC};

/**
 * Nodes
 * =====
 * Every block the gateway reads decodes into exactly one node.
 *  - raw blocks are leaves: their bytes are file content
 *  - DAG-CBOR blocks carry a `UnixfsNode`, which is a directory
 *    (ordered named links), a file (ordered links to raw chunks),
 *    or a symlink
 *  - anything else is kept around as `Unsupported` so callers can
 *    report it instead of guessing
 */

/// A named link out of a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub cid: Cid,
}

/// A link to one raw chunk of a file, with its length in bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkLink {
    pub cid: Cid,
    pub size: u64,
}

/// The DAG-CBOR schema for non-leaf nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnixfsNode {
    Directory { entries: Vec<DirEntry> },
    File { chunks: Vec<ChunkLink> },
    Symlink { target: String },
}

impl BlockEncoded for UnixfsNode {}

/// Decoded payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Directory(Vec<DirEntry>),
    File(Vec<ChunkLink>),
    RawLeaf(Bytes),
    Symlink(String),
    Unsupported { codec: u64 },
}

/// What a node is, independent of its payload.
///  Adding a variant here should break every dispatch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Directory,
    RegularFile,
    RawLeaf,
    Symlink,
    Unsupported,
}

impl Kind {
    /// Whether nodes of this kind can be opened as a byte stream
    pub fn is_file(&self) -> bool {
        matches!(self, Kind::RegularFile | Kind::RawLeaf)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DagNode {
    cid: Cid,
    data: NodeData,
}

impl DagNode {
    pub fn new(cid: Cid, data: NodeData) -> Self {
        Self { cid, data }
    }

    /// Decode a block according to the codec in its identifier
    pub fn decode(cid: Cid, block: Bytes) -> Self {
        let data = match cid.codec() {
            LD_RAW_CODEC => NodeData::RawLeaf(block),
            LD_CBOR_CODEC => match UnixfsNode::decode(&block) {
                Ok(UnixfsNode::Directory { entries }) => NodeData::Directory(entries),
                Ok(UnixfsNode::File { chunks }) => NodeData::File(chunks),
                Ok(UnixfsNode::Symlink { target }) => NodeData::Symlink(target),
                Err(e) => {
                    tracing::debug!(cid = %cid, "dag-cbor block is not a unixfs node: {}", e);
                    NodeData::Unsupported {
                        codec: LD_CBOR_CODEC,
                    }
                }
            },
            codec => NodeData::Unsupported { codec },
        };
        Self { cid, data }
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn kind(&self) -> Kind {
        match &self.data {
            NodeData::Directory(_) => Kind::Directory,
            NodeData::File(_) => Kind::RegularFile,
            NodeData::RawLeaf(_) => Kind::RawLeaf,
            NodeData::Symlink(_) => Kind::Symlink,
            NodeData::Unsupported { .. } => Kind::Unsupported,
        }
    }

    /// Directory entries, in DAG order, if this is a directory
    pub fn entries(&self) -> Option<&[DirEntry]> {
        match &self.data {
            NodeData::Directory(entries) => Some(entries),
            _ => None,
        }
    }

    /// Total content length for file-like nodes
    pub fn size(&self) -> Option<u64> {
        match &self.data {
            NodeData::File(chunks) => Some(chunks.iter().map(|c| c.size).sum()),
            NodeData::RawLeaf(data) => Some(data.len() as u64),
            _ => None,
        }
    }
}
