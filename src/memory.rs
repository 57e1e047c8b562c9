//! In-memory backend.
//!
//! A thread-safe map that enforces its own per-call item limits the way a
//! remote store would, so chunked code paths can run without a network.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::batch_operations::{AsyncBackend, Backend, ChunkConfig};
use crate::errors::{ItemError, MultiError, StoreError};

#[derive(Debug)]
pub struct MemoryBackend<K, R> {
    items: Mutex<HashMap<K, R>>,
    limits: ChunkConfig,
    calls: AtomicUsize,
}

impl<K, R> Default for MemoryBackend<K, R> {
    fn default() -> Self {
        Self::with_limits(ChunkConfig::default())
    }
}

impl<K, R> MemoryBackend<K, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject calls carrying more items than `limits` allows.
    pub fn with_limits(limits: ChunkConfig) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            limits,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of bulk calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, R>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self, operation: &str, len: usize, limit: usize) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if len > limit {
            return Err(StoreError::Validation(format!(
                "{} of {} items exceeds the limit of {}",
                operation, len, limit
            )));
        }
        Ok(())
    }
}

impl<K, R> MemoryBackend<K, R>
where
    K: Eq + Hash + Clone,
    R: Clone,
{
    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<R> {
        self.lock().get(key).cloned()
    }
}

impl<K, R> Backend for MemoryBackend<K, R>
where
    K: Eq + Hash + Clone,
    R: Clone,
{
    type Key = K;
    type Record = R;

    fn delete_many(&self, keys: &[K]) -> Result<(), StoreError> {
        self.admit("delete", keys.len(), self.limits.delete)?;
        let mut items = self.lock();
        for key in keys {
            items.remove(key);
        }
        Ok(())
    }

    fn put_many(&self, keys: &mut [K], records: &[R]) -> Result<(), StoreError> {
        self.admit("put", keys.len(), self.limits.put)?;
        if keys.len() != records.len() {
            return Err(StoreError::InputMismatch {
                keys: keys.len(),
                records: records.len(),
            });
        }
        let mut items = self.lock();
        for (key, record) in keys.iter().zip(records) {
            items.insert(key.clone(), record.clone());
        }
        Ok(())
    }

    fn get_many(&self, keys: &[K], records: &mut [R]) -> Result<(), StoreError> {
        self.admit("get", keys.len(), self.limits.get)?;
        if keys.len() != records.len() {
            return Err(StoreError::InputMismatch {
                keys: keys.len(),
                records: records.len(),
            });
        }
        let items = self.lock();
        let mut missing = false;
        let results: Vec<Option<ItemError>> = keys
            .iter()
            .zip(records.iter_mut())
            .map(|(key, slot)| match items.get(key) {
                Some(record) => {
                    *slot = record.clone();
                    None
                }
                None => {
                    missing = true;
                    Some(ItemError::NotFound)
                }
            })
            .collect();

        if missing {
            return Err(StoreError::Partial(MultiError::from_errors(results)));
        }
        Ok(())
    }
}

impl<K, R> AsyncBackend for MemoryBackend<K, R>
where
    K: Eq + Hash + Clone + Send + Sync,
    R: Clone + Send + Sync,
{
    type Key = K;
    type Record = R;

    async fn delete_many(&self, keys: &[K]) -> Result<(), StoreError> {
        Backend::delete_many(self, keys)
    }

    async fn put_many(&self, keys: &mut [K], records: &[R]) -> Result<(), StoreError> {
        Backend::put_many(self, keys, records)
    }

    async fn get_many(&self, keys: &[K], records: &mut [R]) -> Result<(), StoreError> {
        Backend::get_many(self, keys, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let backend: MemoryBackend<u32, String> = MemoryBackend::new();
        let mut keys = vec![1, 2];
        Backend::put_many(&backend, &mut keys, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(backend.len(), 2);

        let mut out = vec![String::new(); 2];
        Backend::get_many(&backend, &keys, &mut out).unwrap();
        assert_eq!(out, vec!["a", "b"]);

        Backend::delete_many(&backend, &[1]).unwrap();
        assert!(!backend.contains(&1));
        assert_eq!(backend.get(&2).as_deref(), Some("b"));
        assert_eq!(backend.calls(), 3);
    }

    #[test]
    fn test_get_reports_missing_per_position() {
        let backend: MemoryBackend<u32, u32> = MemoryBackend::new();
        Backend::put_many(&backend, &mut [5], &[50]).unwrap();

        let mut out = vec![0; 3];
        let err = Backend::get_many(&backend, &[4, 5, 6], &mut out).unwrap_err();
        let multi = err.as_partial().unwrap();
        assert_eq!(multi.get(0), Some(&ItemError::NotFound));
        assert_eq!(multi.get(1), None);
        assert_eq!(multi.get(2), Some(&ItemError::NotFound));
        assert_eq!(out[1], 50);
    }

    #[test]
    fn test_limit_is_enforced() {
        let limits = ChunkConfig {
            get: 2,
            put: 2,
            delete: 2,
        };
        let backend: MemoryBackend<u32, u32> = MemoryBackend::with_limits(limits);
        let err = Backend::delete_many(&backend, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
