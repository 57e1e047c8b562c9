//! Chunked bulk operations.
//!
//! This module provides the `Chunker`, which runs bulk operations against a
//! backend with a per-call item limit:
//! - `delete_many` - Delete many keys
//! - `put_many` - Store many records, writing backend-assigned keys back
//! - `get_many` - Fetch many records into a caller-supplied slice
//!
//! Requests over the limit are split into windows that run one after another,
//! never concurrently, so writes to the same key keep their order. Per-item
//! failures from every window are merged into one `MultiError` aligned with
//! the caller's input.

mod delete;
mod get;
mod put;
mod window;

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::errors::StoreError;

pub use window::windows;

/// Default maximum items per get call.
pub const DEFAULT_GET_CHUNK: usize = 1000;

/// Default maximum items per put call.
pub const DEFAULT_PUT_CHUNK: usize = 500;

/// Default maximum items per delete call.
pub const DEFAULT_DELETE_CHUNK: usize = 500;

/// Blocking bulk operations of a key/value backend.
///
/// A call may fail as a whole (any `StoreError`) or per item, in which case
/// it returns `StoreError::Partial` holding one result per submitted key.
pub trait Backend {
    type Key;
    type Record;

    fn delete_many(&self, keys: &[Self::Key]) -> Result<(), StoreError>;

    /// Store `records` under `keys`.
    ///
    /// The backend may replace entries of `keys` with the keys it assigned.
    fn put_many(&self, keys: &mut [Self::Key], records: &[Self::Record])
    -> Result<(), StoreError>;

    /// Load the records stored under `keys` into `records`.
    fn get_many(&self, keys: &[Self::Key], records: &mut [Self::Record])
    -> Result<(), StoreError>;
}

/// Async bulk operations of a key/value backend.
///
/// Same contract as [`Backend`].
pub trait AsyncBackend: Send + Sync {
    type Key: Send + Sync;
    type Record: Send + Sync;

    fn delete_many(
        &self,
        keys: &[Self::Key],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn put_many(
        &self,
        keys: &mut [Self::Key],
        records: &[Self::Record],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_many(
        &self,
        keys: &[Self::Key],
        records: &mut [Self::Record],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Per-operation item limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    pub get: usize,
    pub put: usize,
    pub delete: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            get: DEFAULT_GET_CHUNK,
            put: DEFAULT_PUT_CHUNK,
            delete: DEFAULT_DELETE_CHUNK,
        }
    }
}

impl ChunkConfig {
    /// DynamoDB limits: 100 keys per BatchGetItem, 25 requests per BatchWriteItem.
    pub fn dynamodb() -> Self {
        Self {
            get: 100,
            put: 25,
            delete: 25,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.get == 0 {
            return Err(StoreError::InvalidChunkSize { operation: "get" });
        }
        if self.put == 0 {
            return Err(StoreError::InvalidChunkSize { operation: "put" });
        }
        if self.delete == 0 {
            return Err(StoreError::InvalidChunkSize {
                operation: "delete",
            });
        }
        Ok(())
    }
}

/// Splits bulk operations into backend-sized windows.
#[derive(Debug, Clone)]
pub struct Chunker<B> {
    backend: B,
    config: ChunkConfig,
}

impl<B> Chunker<B> {
    /// Create a chunker with the default limits.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: ChunkConfig::default(),
        }
    }

    /// Create a chunker with explicit limits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChunkSize` if any limit is zero.
    pub fn with_config(backend: B, config: ChunkConfig) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

/// Reject record slices that do not line up with the keys.
fn check_lengths(keys: usize, records: usize) -> Result<(), StoreError> {
    if keys != records {
        return Err(StoreError::InputMismatch { keys, records });
    }
    Ok(())
}
