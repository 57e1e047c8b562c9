//! Chunked get.

use tracing::{debug, warn};

use super::window::{windows, Aggregate};
use super::{check_lengths, AsyncBackend, Backend, Chunker};
use crate::errors::StoreError;

impl<B: Backend> Chunker<B> {
    /// Load the records stored under `keys` into `records`, splitting into
    /// windows of `config.get` keys.
    ///
    /// `records` must be exactly as long as `keys`; position `i` receives the
    /// record for `keys[i]`. Missing records are reported per position by the
    /// backend inside a `StoreError::Partial`.
    pub fn get_many(&self, keys: &[B::Key], records: &mut [B::Record]) -> Result<(), StoreError> {
        check_lengths(keys.len(), records.len())?;

        let limit = self.config.get;
        if keys.len() <= limit {
            return self.backend.get_many(keys, records);
        }

        let mut aggregate = Aggregate::with_capacity(keys.len());
        for window in windows(keys.len(), limit) {
            debug!(start = window.start, end = window.end, "get window");
            let outcome = self
                .backend
                .get_many(&keys[window.clone()], &mut records[window.clone()]);
            if let Err(e) = aggregate.record(&window, outcome) {
                warn!(start = window.start, error = %e, "get window failed, aborting");
                return Err(e);
            }
        }
        aggregate.finish()
    }
}

impl<B: AsyncBackend> Chunker<B> {
    /// Async version of [`Chunker::get_many`].
    pub async fn async_get_many(
        &self,
        keys: &[B::Key],
        records: &mut [B::Record],
    ) -> Result<(), StoreError> {
        check_lengths(keys.len(), records.len())?;

        let limit = self.config.get;
        if keys.len() <= limit {
            return self.backend.get_many(keys, records).await;
        }

        let mut aggregate = Aggregate::with_capacity(keys.len());
        for window in windows(keys.len(), limit) {
            debug!(start = window.start, end = window.end, "get window");
            let outcome = self
                .backend
                .get_many(&keys[window.clone()], &mut records[window.clone()])
                .await;
            if let Err(e) = aggregate.record(&window, outcome) {
                warn!(start = window.start, error = %e, "get window failed, aborting");
                return Err(e);
            }
        }
        aggregate.finish()
    }
}
