/**
 * Block storage.
 *  A minimal get-by-CID interface with an in-memory
 *  and an on-disk (read-only) implementation.
 */
pub mod blocks;
/**
 * The DAG as the gateway sees it: nodes decoded
 *  from blocks, classified into a closed set of
 *  kinds, plus a seekable reader over chunked files.
 */
pub mod dag;
/**
 * Internal wrapper around IPLD, renamed to
 *  something a little more down-to-earth.
 * Content identifiers, codecs and block encoding.
 */
pub mod linked_data;
/**
 * Deterministic content-type detection from
 *  the leading bytes of a file.
 */
pub mod sniff;
/**
 * Fixture builders for tests.
 */
pub mod testkit;
/**
 * Build version information.
 */
pub mod version;

pub mod prelude {
    pub use crate::blocks::{BlockStore, BlockStoreError, FsBlocks, MemoryBlocks};
    pub use crate::dag::{Dag, DagNode, DagStore, DirEntry, Kind, SeekableStream, StoreError};
    pub use crate::linked_data::{parse_cid, Cid, CidError};
    pub use crate::version::build_info;
}
