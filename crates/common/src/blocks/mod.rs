//! Block storage
//!
//! The gateway only ever reads blocks. A [`BlockStore`] hands back the raw
//! bytes for a CID, or says it does not have them. Everything above this
//! layer (node decoding, path walking, file streaming) lives in
//! [`crate::dag`].
//!
//! Two implementations ship with the crate:
//! - [`MemoryBlocks`]: a shared in-process map, used by tests and as the
//!   fallback store when no repository is configured
//! - [`FsBlocks`]: a directory with one file per block, named by the
//!   block's canonical CID string

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::linked_data::{Cid, CodecError};

mod fs;
mod memory;

pub use fs::FsBlocks;
pub use memory::MemoryBlocks;

#[async_trait]
pub trait BlockStore: Debug + Send + Sync {
    /// Fetch the bytes of a single block
    async fn get(&self, cid: &Cid) -> Result<Bytes, BlockStoreError>;

    /// Check that the backing storage is reachable
    async fn ready(&self) -> Result<(), BlockStoreError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlockStoreError {
    #[error("block not found: {0}")]
    NotFound(Cid),
    #[error("block {0} does not match its digest")]
    Corrupt(Cid),
    #[error("block store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("block store error: {0}")]
    Default(#[from] anyhow::Error),
}

impl BlockStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlockStoreError::NotFound(_))
    }
}
