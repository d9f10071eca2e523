//! Wire shapes of the chunk store contract.
//!
//! Digests travel as lowercase hex strings. The RPC envelope (framing,
//! authentication, transport) is outside this crate; these types are the
//! payload shapes it carries. Binary chunk data rides alongside the JSON
//! body rather than inside it, mirroring how the store endpoints split
//! parameters from payload.

use std::collections::BTreeSet;

use bytes::Bytes;
use eddy_types::Digest;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Parameters of a `CheckExists` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckExistsParams {
    /// Digests to probe, as lowercase hex.
    pub digests: BTreeSet<String>,
}

/// Return value of a `CheckExists` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckExistsReturn {
    /// Digests the store already holds.
    pub existing: BTreeSet<String>,
    /// Digests the store does not hold.
    pub missing: BTreeSet<String>,
}

/// Parameters of a `PutChunk` call. The chunk bytes are the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutChunkParams {
    /// Declared digest of the payload, as lowercase hex.
    pub digest: String,
}

/// Parameters of a `GetChunk` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChunkParams {
    /// Digest of the requested chunk, as lowercase hex.
    pub digest: String,
}

/// A request to the chunk store, with any binary payload out-of-band.
#[derive(Debug, Clone)]
pub enum ChunkRequest {
    /// Probe which digests exist.
    CheckExists(CheckExistsParams),
    /// Upload one chunk.
    PutChunk(PutChunkParams, Bytes),
    /// Download one chunk.
    GetChunk(GetChunkParams),
}

/// A response from the chunk store.
#[derive(Debug, Clone)]
pub enum ChunkResponse {
    /// Partitioned existence report.
    CheckExists(CheckExistsReturn),
    /// The chunk was stored (or already present).
    PutChunk,
    /// The requested chunk's bytes.
    GetChunk(Bytes),
}

/// Encode a digest set as lowercase hex strings.
pub fn to_hex_set(digests: &BTreeSet<Digest>) -> BTreeSet<String> {
    digests.iter().map(Digest::to_string).collect()
}

/// Decode a set of hex strings back into digests.
pub fn from_hex_set(hex: &BTreeSet<String>) -> Result<BTreeSet<Digest>, StoreError> {
    hex.iter()
        .map(|s| s.parse::<Digest>().map_err(StoreError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_exists_json_shape() {
        let digest = Digest::from_data(b"wire chunk");
        let params = CheckExistsParams {
            digests: [digest.to_string()].into_iter().collect(),
        };

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value["digests"][0],
            serde_json::Value::String(digest.to_string())
        );

        let back: CheckExistsParams = serde_json::from_value(value).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn test_return_roundtrip() {
        let ret = CheckExistsReturn {
            existing: [Digest::from_data(b"a").to_string()].into_iter().collect(),
            missing: [Digest::from_data(b"b").to_string()].into_iter().collect(),
        };
        let json = serde_json::to_string(&ret).unwrap();
        let back: CheckExistsReturn = serde_json::from_str(&json).unwrap();
        assert_eq!(ret, back);
    }

    #[test]
    fn test_hex_set_roundtrip() {
        let digests: BTreeSet<_> = [Digest::from_data(b"x"), Digest::from_data(b"y")]
            .into_iter()
            .collect();
        let hex = to_hex_set(&digests);
        assert_eq!(from_hex_set(&hex).unwrap(), digests);
    }

    #[test]
    fn test_malformed_hex_rejected() {
        let hex: BTreeSet<String> = ["zz".to_string()].into_iter().collect();
        let err = from_hex_set(&hex).unwrap_err();
        assert!(matches!(err, StoreError::MalformedDigest(_)));
    }
}
