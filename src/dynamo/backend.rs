//! Bulk operations against one DynamoDB table.
//!
//! A single call never exceeds what the caller passes in; pair this backend
//! with `ChunkConfig::dynamodb()` so the chunker keeps every call within
//! BatchGetItem (100 keys) and BatchWriteItem (25 requests).

use aws_sdk_dynamodb::types::{
    AttributeValue, DeleteRequest, KeysAndAttributes, PutRequest, WriteRequest,
};
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::client::{build_client, DynamoConfig, RUNTIME};
use crate::batch_operations::{AsyncBackend, Backend};
use crate::errors::{map_sdk_error, ItemError, MultiError, StoreError};

/// A DynamoDB item or key: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

#[derive(Debug, Clone)]
pub struct DynamoBackend {
    client: Client,
    runtime: Arc<Runtime>,
    table: String,
}

impl DynamoBackend {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            runtime: RUNTIME.clone(),
            table: table.into(),
        }
    }

    /// Build a client from `config` on the shared runtime.
    pub fn connect(config: &DynamoConfig, table: impl Into<String>) -> Self {
        let client = RUNTIME.block_on(build_client(config));
        Self::new(client, table)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// True if every attribute of `key` is present in `item` with the same value.
pub fn item_matches_key(item: &Item, key: &Item) -> bool {
    key.iter().all(|(name, value)| item.get(name) == Some(value))
}

/// Per-position report for a write call given what DynamoDB left unprocessed.
fn unprocessed_writes(requests: &[WriteRequest], unprocessed: &[WriteRequest]) -> Result<(), StoreError> {
    if unprocessed.is_empty() {
        return Ok(());
    }
    Err(StoreError::Partial(MultiError::from_errors(
        requests
            .iter()
            .map(|r| unprocessed.contains(r).then_some(ItemError::Unprocessed)),
    )))
}

/// Place fetched items at the positions of their keys.
///
/// Keys with no item are `Unprocessed` if DynamoDB handed them back,
/// `NotFound` otherwise.
fn place_items(
    keys: &[Item],
    records: &mut [Item],
    found: &[Item],
    unprocessed: &[Item],
) -> Result<(), StoreError> {
    let mut failed = false;
    let results: Vec<Option<ItemError>> = keys
        .iter()
        .zip(records.iter_mut())
        .map(|(key, slot)| {
            if let Some(item) = found.iter().find(|item| item_matches_key(item, key)) {
                *slot = item.clone();
                return None;
            }
            failed = true;
            if unprocessed.contains(key) {
                Some(ItemError::Unprocessed)
            } else {
                Some(ItemError::NotFound)
            }
        })
        .collect();

    if failed {
        return Err(StoreError::Partial(MultiError::from_errors(results)));
    }
    Ok(())
}

async fn execute_write(
    client: &Client,
    table: &str,
    requests: Vec<WriteRequest>,
) -> Result<(), StoreError> {
    if requests.is_empty() {
        return Ok(());
    }

    let output = client
        .batch_write_item()
        .request_items(table, requests.clone())
        .send()
        .await
        .map_err(|e| map_sdk_error(e, Some(table)))?;

    let unprocessed = output
        .unprocessed_items()
        .and_then(|items| items.get(table))
        .map(Vec::as_slice)
        .unwrap_or_default();
    unprocessed_writes(&requests, unprocessed)
}

async fn execute_delete_many(client: &Client, table: &str, keys: &[Item]) -> Result<(), StoreError> {
    let mut requests = Vec::with_capacity(keys.len());
    for key in keys {
        let delete_request = DeleteRequest::builder()
            .set_key(Some(key.clone()))
            .build()
            .map_err(|e| StoreError::Validation(format!("failed to build delete request: {}", e)))?;
        requests.push(
            WriteRequest::builder()
                .delete_request(delete_request)
                .build(),
        );
    }
    execute_write(client, table, requests).await
}

async fn execute_put_many(client: &Client, table: &str, records: &[Item]) -> Result<(), StoreError> {
    let mut requests = Vec::with_capacity(records.len());
    for record in records {
        let put_request = PutRequest::builder()
            .set_item(Some(record.clone()))
            .build()
            .map_err(|e| StoreError::Validation(format!("failed to build put request: {}", e)))?;
        requests.push(WriteRequest::builder().put_request(put_request).build());
    }
    execute_write(client, table, requests).await
}

async fn execute_get_many(
    client: &Client,
    table: &str,
    keys: &[Item],
    records: &mut [Item],
) -> Result<(), StoreError> {
    if keys.len() != records.len() {
        return Err(StoreError::InputMismatch {
            keys: keys.len(),
            records: records.len(),
        });
    }
    if keys.is_empty() {
        return Ok(());
    }

    let request = KeysAndAttributes::builder()
        .set_keys(Some(keys.to_vec()))
        .build()
        .map_err(|e| StoreError::Validation(format!("failed to build get request: {}", e)))?;

    let output = client
        .batch_get_item()
        .request_items(table, request)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, Some(table)))?;

    let found = output
        .responses()
        .and_then(|responses| responses.get(table))
        .map(Vec::as_slice)
        .unwrap_or_default();
    let unprocessed = output
        .unprocessed_keys()
        .and_then(|pending| pending.get(table))
        .map(|pending| pending.keys())
        .unwrap_or_default();

    place_items(keys, records, found, unprocessed)
}

/// DynamoDB never assigns keys, so put leaves the key slice as given.
impl Backend for DynamoBackend {
    type Key = Item;
    type Record = Item;

    fn delete_many(&self, keys: &[Item]) -> Result<(), StoreError> {
        self.runtime
            .block_on(execute_delete_many(&self.client, &self.table, keys))
    }

    fn put_many(&self, keys: &mut [Item], records: &[Item]) -> Result<(), StoreError> {
        if keys.len() != records.len() {
            return Err(StoreError::InputMismatch {
                keys: keys.len(),
                records: records.len(),
            });
        }
        self.runtime
            .block_on(execute_put_many(&self.client, &self.table, records))
    }

    fn get_many(&self, keys: &[Item], records: &mut [Item]) -> Result<(), StoreError> {
        self.runtime
            .block_on(execute_get_many(&self.client, &self.table, keys, records))
    }
}

// ========== ASYNC ==========

impl AsyncBackend for DynamoBackend {
    type Key = Item;
    type Record = Item;

    async fn delete_many(&self, keys: &[Item]) -> Result<(), StoreError> {
        execute_delete_many(&self.client, &self.table, keys).await
    }

    async fn put_many(&self, keys: &mut [Item], records: &[Item]) -> Result<(), StoreError> {
        if keys.len() != records.len() {
            return Err(StoreError::InputMismatch {
                keys: keys.len(),
                records: records.len(),
            });
        }
        execute_put_many(&self.client, &self.table, records).await
    }

    async fn get_many(&self, keys: &[Item], records: &mut [Item]) -> Result<(), StoreError> {
        execute_get_many(&self.client, &self.table, keys, records).await
    }
}
