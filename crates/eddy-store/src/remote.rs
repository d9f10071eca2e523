//! Remote chunk store client.
//!
//! [`RemoteChunkStore`] implements [`ChunkStore`] by translating each
//! operation into the wire shapes of [`crate::wire`] and dispatching
//! them through a [`ChunkRpc`]. The RPC envelope itself (framing,
//! transport, retries) lives behind that seam; [`LoopbackRpc`] is the
//! in-process adapter used by tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use eddy_types::Digest;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{ChunkStore, ExistsReport};
use crate::wire::{
    CheckExistsParams, CheckExistsReturn, ChunkRequest, ChunkResponse, GetChunkParams,
    PutChunkParams, from_hex_set, to_hex_set,
};

/// The transport seam for chunk store calls.
#[async_trait::async_trait]
pub trait ChunkRpc: Send + Sync {
    /// Dispatch one request and return its response.
    async fn call(&self, request: ChunkRequest) -> Result<ChunkResponse, StoreError>;
}

/// A [`ChunkStore`] speaking the wire contract over a [`ChunkRpc`].
pub struct RemoteChunkStore<R> {
    rpc: R,
}

impl<R: ChunkRpc> RemoteChunkStore<R> {
    /// Wrap an RPC seam.
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }
}

#[async_trait::async_trait]
impl<R: ChunkRpc> ChunkStore for RemoteChunkStore<R> {
    async fn check_exists(&self, digests: &BTreeSet<Digest>) -> Result<ExistsReport, StoreError> {
        let params = CheckExistsParams {
            digests: to_hex_set(digests),
        };
        debug!(count = digests.len(), "checking chunk existence remotely");
        match self.rpc.call(ChunkRequest::CheckExists(params)).await? {
            ChunkResponse::CheckExists(ret) => Ok(ExistsReport {
                existing: from_hex_set(&ret.existing)?,
                missing: from_hex_set(&ret.missing)?,
            }),
            _ => Err(StoreError::UnexpectedResponse("CheckExists")),
        }
    }

    async fn put(&self, digest: Digest, data: Bytes) -> Result<(), StoreError> {
        let params = PutChunkParams {
            digest: digest.to_string(),
        };
        match self.rpc.call(ChunkRequest::PutChunk(params, data)).await? {
            ChunkResponse::PutChunk => Ok(()),
            _ => Err(StoreError::UnexpectedResponse("PutChunk")),
        }
    }

    async fn get(&self, digest: Digest) -> Result<Bytes, StoreError> {
        let params = GetChunkParams {
            digest: digest.to_string(),
        };
        match self.rpc.call(ChunkRequest::GetChunk(params)).await? {
            ChunkResponse::GetChunk(data) => Ok(data),
            _ => Err(StoreError::UnexpectedResponse("GetChunk")),
        }
    }
}

/// In-process RPC adapter dispatching to a local [`ChunkStore`].
pub struct LoopbackRpc {
    store: Arc<dyn ChunkStore>,
}

impl LoopbackRpc {
    /// Dispatch to the given store.
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ChunkRpc for LoopbackRpc {
    async fn call(&self, request: ChunkRequest) -> Result<ChunkResponse, StoreError> {
        match request {
            ChunkRequest::CheckExists(params) => {
                let digests = from_hex_set(&params.digests)?;
                let report = self.store.check_exists(&digests).await?;
                Ok(ChunkResponse::CheckExists(CheckExistsReturn {
                    existing: to_hex_set(&report.existing),
                    missing: to_hex_set(&report.missing),
                }))
            }
            ChunkRequest::PutChunk(params, data) => {
                let digest: Digest = params.digest.parse()?;
                self.store.put(digest, data).await?;
                Ok(ChunkResponse::PutChunk)
            }
            ChunkRequest::GetChunk(params) => {
                let digest: Digest = params.digest.parse()?;
                let data = self.store.get(digest).await?;
                Ok(ChunkResponse::GetChunk(data))
            }
        }
    }
}
