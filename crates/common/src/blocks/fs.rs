use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::linked_data::Cid;

use super::{BlockStore, BlockStoreError};

/// Read-only block store over a directory of block files.
///  Each block lives at `<root>/<cid>` where `<cid>` is the
///  canonical string form of its identifier.
#[derive(Clone, Debug)]
pub struct FsBlocks {
    root: PathBuf,
}

impl FsBlocks {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn block_path(&self, cid: &Cid) -> PathBuf {
        self.root.join(cid.to_string())
    }
}

#[async_trait]
impl BlockStore for FsBlocks {
    async fn get(&self, cid: &Cid) -> Result<Bytes, BlockStoreError> {
        let path = self.block_path(cid);
        tracing::trace!("FsBlocks::get reading {:?}", path);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlockStoreError::NotFound(*cid)),
            Err(e) => Err(BlockStoreError::Io(e)),
        }
    }

    async fn ready(&self) -> Result<(), BlockStoreError> {
        let metadata = tokio::fs::metadata(&self.root).await?;
        if !metadata.is_dir() {
            return Err(BlockStoreError::Io(std::io::Error::other(format!(
                "{} is not a directory",
                self.root.display()
            ))));
        }
        Ok(())
    }
}
