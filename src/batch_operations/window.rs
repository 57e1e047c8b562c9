//! Window arithmetic and positional result aggregation shared by all chunked operations.

use std::ops::Range;

use crate::errors::{ItemError, MultiError, StoreError};

/// Split `[0, len)` into consecutive windows of `size` items.
///
/// The last window is truncated to `len`. `size` must be non-zero.
pub fn windows(len: usize, size: usize) -> impl Iterator<Item = Range<usize>> {
    (0..len)
        .step_by(size.max(1))
        .map(move |start| start..(start + size).min(len))
}

/// Collects per-item results across windows in submission order.
///
/// Successful windows record `Ok(())` for each of their items, so the report
/// is always aligned with absolute positions without any backfill step.
pub struct Aggregate {
    results: Vec<Result<(), ItemError>>,
    failed: bool,
}

impl Aggregate {
    pub fn with_capacity(len: usize) -> Self {
        Self {
            results: Vec::with_capacity(len),
            failed: false,
        }
    }

    /// Fold one window's outcome in.
    ///
    /// Returns the error back when it cannot be attributed per item; the
    /// caller must then abort.
    pub fn record(
        &mut self,
        window: &Range<usize>,
        outcome: Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        match outcome {
            Ok(()) => {
                self.results.extend(window.clone().map(|_| Ok(())));
                Ok(())
            }
            Err(StoreError::Partial(multi)) => {
                if multi.len() != window.len() {
                    return Err(StoreError::MisalignedPartial {
                        expected: window.len(),
                        actual: multi.len(),
                    });
                }
                self.failed = true;
                self.results.extend(multi.into_results());
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn finish(self) -> Result<(), StoreError> {
        if self.failed {
            Err(StoreError::Partial(MultiError::new(self.results)))
        } else {
            Ok(())
        }
    }
}
