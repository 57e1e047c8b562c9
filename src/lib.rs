//! dynobatch - chunked bulk operations and backoff retries for key/value stores.
//!
//! Two independent building blocks:
//! - [`Chunker`] splits oversized get/put/delete calls into windows the backend
//!   accepts, runs them in order, and merges per-item failures into one
//!   [`MultiError`] aligned with the caller's input.
//! - [`BackoffRetrier`] re-runs a fallible operation with randomized
//!   exponential backoff while its error reports itself retriable.
//!
//! Backends plug in through [`Backend`] / [`AsyncBackend`]. An in-memory
//! backend and a DynamoDB backend ship with the crate.

pub mod batch_operations;
pub mod config;
pub mod dynamo;
pub mod errors;
pub mod logging;
pub mod memory;
pub mod pairs;
pub mod retry;

pub use batch_operations::{AsyncBackend, Backend, ChunkConfig, Chunker};
pub use config::{RetrySettings, Settings};
pub use errors::{IsRetriable, ItemError, MultiError, StoreError};
pub use memory::MemoryBackend;
pub use pairs::Pairs;
pub use retry::{retry, retry_async, BackoffRetrier, RetryOptions, Sleeper, ThreadSleeper};
