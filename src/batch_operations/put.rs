//! Chunked put.

use tracing::{debug, warn};

use super::window::{windows, Aggregate};
use super::{check_lengths, AsyncBackend, Backend, Chunker};
use crate::errors::StoreError;
use crate::pairs::Pairs;

impl<B: Backend> Chunker<B> {
    /// Store `records` under `keys`, splitting into windows of `config.put` items.
    ///
    /// Keys assigned by the backend are written back into `keys` at their
    /// absolute positions for every window that ran, including windows with
    /// per-item failures. On a whole-window failure the windows before it keep
    /// their assigned keys.
    ///
    /// # Errors
    ///
    /// - `InputMismatch` if the slices differ in length (no backend call made)
    /// - `Partial` with one entry per processed item if any window partially failed
    /// - the raw error of the first window that failed as a whole
    pub fn put_many(&self, keys: &mut [B::Key], records: &[B::Record]) -> Result<(), StoreError> {
        check_lengths(keys.len(), records.len())?;

        let limit = self.config.put;
        if keys.len() <= limit {
            return self.backend.put_many(keys, records);
        }

        let mut aggregate = Aggregate::with_capacity(keys.len());
        for window in windows(keys.len(), limit) {
            debug!(start = window.start, end = window.end, "put window");
            let outcome = self
                .backend
                .put_many(&mut keys[window.clone()], &records[window.clone()]);
            if let Err(e) = aggregate.record(&window, outcome) {
                warn!(start = window.start, error = %e, "put window failed, aborting");
                return Err(e);
            }
        }
        aggregate.finish()
    }

    /// Store accumulated pairs; assigned keys land in `pairs`.
    pub fn put_pairs(&self, pairs: &mut Pairs<B::Key, B::Record>) -> Result<(), StoreError> {
        let (keys, records) = pairs.split_mut();
        self.put_many(keys, records)
    }
}

impl<B: AsyncBackend> Chunker<B> {
    /// Async version of [`Chunker::put_many`].
    pub async fn async_put_many(
        &self,
        keys: &mut [B::Key],
        records: &[B::Record],
    ) -> Result<(), StoreError> {
        check_lengths(keys.len(), records.len())?;

        let limit = self.config.put;
        if keys.len() <= limit {
            return self.backend.put_many(keys, records).await;
        }

        let mut aggregate = Aggregate::with_capacity(keys.len());
        for window in windows(keys.len(), limit) {
            debug!(start = window.start, end = window.end, "put window");
            let outcome = self
                .backend
                .put_many(&mut keys[window.clone()], &records[window.clone()])
                .await;
            if let Err(e) = aggregate.record(&window, outcome) {
                warn!(start = window.start, error = %e, "put window failed, aborting");
                return Err(e);
            }
        }
        aggregate.finish()
    }

    /// Async version of [`Chunker::put_pairs`].
    pub async fn async_put_pairs(
        &self,
        pairs: &mut Pairs<B::Key, B::Record>,
    ) -> Result<(), StoreError> {
        let (keys, records) = pairs.split_mut();
        self.async_put_many(keys, records).await
    }
}
