//! Thin wrapper around the IPLD pieces we rely on: content identifiers,
//! the two block codecs the gateway understands, and DAG-CBOR block
//! encoding for our own node types.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use cid::Cid;
pub use multihash::Multihash;

/// Multicodec for raw leaf blocks (file bytes, no framing)
pub const LD_RAW_CODEC: u64 = 0x55;
/// Multicodec for DAG-CBOR encoded nodes
pub const LD_CBOR_CODEC: u64 = 0x71;
/// Multihash code for BLAKE3 (32 byte digest)
pub const BLAKE3_HASH_CODE: u64 = 0x1e;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode block: {0}")]
    Encode(String),
    #[error("failed to decode block: {0}")]
    Decode(String),
    #[error("multihash error: {0}")]
    Multihash(#[from] multihash::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("invalid content identifier {input:?}: {reason}")]
pub struct CidError {
    input: String,
    reason: String,
}

/// Parse a path segment into a content identifier.
///  Accepts both CIDv0 (base58btc `Qm...`) and multibase encoded CIDv1.
pub fn parse_cid(input: &str) -> Result<Cid, CidError> {
    Cid::try_from(input).map_err(|e| CidError {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Compute the CIDv1 for a block with the given codec, hashed with BLAKE3
pub fn cid_for(codec: u64, data: &[u8]) -> Result<Cid, CodecError> {
    let digest = blake3::hash(data);
    let hash = Multihash::<64>::wrap(BLAKE3_HASH_CODE, digest.as_bytes())?;
    Ok(Cid::new_v1(codec, hash))
}

/// Check a block's bytes against the digest in its identifier.
///  Only BLAKE3 digests can be checked here; blocks addressed with any
///  other hash function are accepted as-is.
pub fn verify(cid: &Cid, data: &[u8]) -> bool {
    let hash = cid.hash();
    if hash.code() != BLAKE3_HASH_CODE {
        return true;
    }
    hash.digest() == blake3::hash(data).as_bytes()
}

/// Types that are stored in the DAG as DAG-CBOR blocks
pub trait BlockEncoded: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        serde_ipld_dagcbor::from_slice(data).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
