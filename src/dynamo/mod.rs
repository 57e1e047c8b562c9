//! DynamoDB backend.
//!
//! Implements `Backend` and `AsyncBackend` for a single table over
//! BatchGetItem and BatchWriteItem. Items DynamoDB leaves unprocessed come
//! back as per-position `ItemError::Unprocessed`, so callers can resubmit just
//! those positions.

mod backend;
mod client;

pub use backend::{item_matches_key, DynamoBackend, Item};
pub use client::{build_client, connect, DynamoConfig, DEFAULT_REGION};
