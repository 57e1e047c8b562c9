//! Chunked delete.

use tracing::{debug, warn};

use super::window::{windows, Aggregate};
use super::{AsyncBackend, Backend, Chunker};
use crate::errors::StoreError;

impl<B: Backend> Chunker<B> {
    /// Delete all `keys`, splitting into windows of `config.delete` keys.
    ///
    /// # Returns
    ///
    /// Ok(()) if every key was deleted, `StoreError::Partial` with one entry
    /// per processed key if any window reported per-item failures, or the raw
    /// error of the first window that failed as a whole.
    pub fn delete_many(&self, keys: &[B::Key]) -> Result<(), StoreError> {
        let limit = self.config.delete;
        if keys.len() <= limit {
            return self.backend.delete_many(keys);
        }

        let mut aggregate = Aggregate::with_capacity(keys.len());
        for window in windows(keys.len(), limit) {
            debug!(start = window.start, end = window.end, "delete window");
            let outcome = self.backend.delete_many(&keys[window.clone()]);
            if let Err(e) = aggregate.record(&window, outcome) {
                warn!(start = window.start, error = %e, "delete window failed, aborting");
                return Err(e);
            }
        }
        aggregate.finish()
    }
}

impl<B: AsyncBackend> Chunker<B> {
    /// Async version of [`Chunker::delete_many`].
    pub async fn async_delete_many(&self, keys: &[B::Key]) -> Result<(), StoreError> {
        let limit = self.config.delete;
        if keys.len() <= limit {
            return self.backend.delete_many(keys).await;
        }

        let mut aggregate = Aggregate::with_capacity(keys.len());
        for window in windows(keys.len(), limit) {
            debug!(start = window.start, end = window.end, "delete window");
            let outcome = self.backend.delete_many(&keys[window.clone()]).await;
            if let Err(e) = aggregate.record(&window, outcome) {
                warn!(start = window.start, error = %e, "delete window failed, aborting");
                return Err(e);
            }
        }
        aggregate.finish()
    }
}
