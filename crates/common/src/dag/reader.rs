use std::future::Future;
use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use crate::blocks::{BlockStore, BlockStoreError};
use crate::linked_data::verify;

use super::node::ChunkLink;

type ChunkFuture = Pin<Box<dyn Future<Output = Result<Bytes, BlockStoreError>> + Send>>;

/// Seekable reader over a chunked file.
///  Chunks are fetched lazily, one at a time, as the read position
///  enters them. Seeking only moves the cursor; nothing is fetched
///  until the next read.
pub struct DagReader {
    blocks: Arc<dyn BlockStore>,
    chunks: Vec<ChunkLink>,
    // start offset of each chunk within the file
    offsets: Vec<u64>,
    size: u64,
    pos: u64,
    loaded: Option<(usize, Bytes)>,
    pending: Option<(usize, ChunkFuture)>,
}

impl DagReader {
    pub fn new(blocks: Arc<dyn BlockStore>, chunks: Vec<ChunkLink>) -> Self {
        let mut offsets = Vec::with_capacity(chunks.len());
        let mut size = 0u64;
        for chunk in &chunks {
            offsets.push(size);
            size += chunk.size;
        }

        Self {
            blocks,
            chunks,
            offsets,
            size,
            pos: 0,
            loaded: None,
            pending: None,
        }
    }

    // only called with pos < size, so there is at least one chunk
    fn chunk_index(&self, pos: u64) -> usize {
        self.offsets.partition_point(|&start| start <= pos) - 1
    }

    fn fetch(&self, index: usize) -> ChunkFuture {
        let blocks = self.blocks.clone();
        let cid = self.chunks[index].cid;
        Box::pin(async move {
            let data = blocks.get(&cid).await?;
            if !verify(&cid, &data) {
                return Err(BlockStoreError::Corrupt(cid));
            }
            Ok(data)
        })
    }
}

impl AsyncRead for DagReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            if this.pos >= this.size || buf.remaining() == 0 {
                return Poll::Ready(Ok(()));
            }

            let index = this.chunk_index(this.pos);

            if let Some((loaded_index, data)) = &this.loaded {
                if *loaded_index == index {
                    let within = (this.pos - this.offsets[index]) as usize;
                    let n = buf.remaining().min(data.len() - within);
                    buf.put_slice(&data[within..within + n]);
                    this.pos += n as u64;
                    return Poll::Ready(Ok(()));
                }
            }

            let fetched = match this.pending.as_mut() {
                Some((pending_index, fut)) if *pending_index == index => {
                    Some(ready!(fut.as_mut().poll(cx)))
                }
                _ => None,
            };

            match fetched {
                Some(result) => {
                    this.pending = None;
                    let data = result.map_err(io::Error::other)?;
                    if data.len() as u64 != this.chunks[index].size {
                        return Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!(
                                "chunk {} is {} bytes, expected {}",
                                this.chunks[index].cid,
                                data.len(),
                                this.chunks[index].size
                            ),
                        )));
                    }
                    this.loaded = Some((index, data));
                }
                None => {
                    this.pending = Some((index, this.fetch(index)));
                }
            }
        }
    }
}

impl AsyncSeek for DagReader {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        let this = self.get_mut();
        let target = match position {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(delta) => this.size as i128 + delta as i128,
            SeekFrom::Current(delta) => this.pos as i128 + delta as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative offset",
            ));
        }
        // past the end is allowed, reads there return EOF
        this.pos = u64::try_from(target).unwrap_or(u64::MAX);
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Poll::Ready(Ok(self.pos))
    }
}
