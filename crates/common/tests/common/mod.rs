//! Shared test utilities for dag integration tests
#![allow(dead_code)]

use common::linked_data::Cid;
use common::testkit::DagBuilder;

/// Chunk size used by the fixture so small files still span several chunks
pub const CHUNK_SIZE: usize = 8;

pub struct Fixture {
    pub builder: DagBuilder,
    pub root: Cid,
    pub docs: Cid,
    pub guide: Cid,
    pub guide_bytes: Vec<u8>,
    pub readme: Cid,
}

/// Build a small tree:
///
/// ```text
/// root/
///   README.md      raw leaf
///   docs/
///     guide.txt    chunked file
///   latest -> docs symlink
/// ```
pub fn setup_fixture() -> Fixture {
    let builder = DagBuilder::new().with_chunk_size(CHUNK_SIZE);

    let guide_bytes: Vec<u8> = (0..100u8).collect();
    let guide = builder.file(&guide_bytes).unwrap();
    let docs = builder.dir([("guide.txt", guide)]).unwrap();
    let readme = builder.raw(b"# readme\n").unwrap();
    let latest = builder.symlink("docs").unwrap();
    let root = builder
        .dir([("README.md", readme), ("docs", docs), ("latest", latest)])
        .unwrap();

    Fixture {
        builder,
        root,
        docs,
        guide,
        guide_bytes,
        readme,
    }
}
