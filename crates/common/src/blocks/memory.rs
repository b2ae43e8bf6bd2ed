use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::linked_data::{cid_for, Cid, CodecError};

use super::{BlockStore, BlockStoreError};

/// In-process block store. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryBlocks {
    inner: Arc<RwLock<HashMap<Cid, Bytes>>>,
}

impl fmt::Debug for MemoryBlocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBlocks")
            .field("blocks", &self.len())
            .finish()
    }
}

impl MemoryBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `data` with the given codec and store it under the resulting CID
    pub fn put(&self, codec: u64, data: impl Into<Bytes>) -> Result<Cid, CodecError> {
        let data = data.into();
        let cid = cid_for(codec, &data)?;
        self.insert(cid, data);
        Ok(cid)
    }

    /// Store `data` under an arbitrary CID. No digest check is made here,
    ///  readers verify on the way out.
    pub fn insert(&self, cid: Cid, data: impl Into<Bytes>) {
        self.inner.write().insert(cid, data.into());
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.inner.read().contains_key(cid)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// A copy of every stored block, in no particular order
    pub fn snapshot(&self) -> Vec<(Cid, Bytes)> {
        self.inner
            .read()
            .iter()
            .map(|(cid, data)| (*cid, data.clone()))
            .collect()
    }
}

#[async_trait]
impl BlockStore for MemoryBlocks {
    async fn get(&self, cid: &Cid) -> Result<Bytes, BlockStoreError> {
        self.inner
            .read()
            .get(cid)
            .cloned()
            .ok_or(BlockStoreError::NotFound(*cid))
    }
}
