//! Error types for dynobatch.
//!
//! `StoreError` is the single error type flowing through the chunker, the
//! retrier and the backends. Per-position failures live in `MultiError`.
//! AWS SDK errors are mapped with typed `SdkError` variant matching, no string
//! parsing of debug output.

use aws_sdk_dynamodb::error::SdkError;
use std::fmt;
use thiserror::Error;

/// Capability check used by the retrier.
///
/// Any error type may implement this to declare that a failure is transient
/// and worth another attempt.
pub trait IsRetriable {
    fn is_retriable(&self) -> bool;
}

/// Failure of a single item inside a bulk call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// No record is stored under the key.
    #[error("no record found for key")]
    NotFound,
    /// The backend accepted the call but did not process this item.
    #[error("item was not processed by the backend")]
    Unprocessed,
    /// The backend rejected this item.
    #[error("item rejected: {0}")]
    Rejected(String),
}

/// Positional failure report for a bulk call.
///
/// Holds exactly one entry per submitted item, in submission order, with
/// `Ok(())` at every position that succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiError {
    results: Vec<Result<(), ItemError>>,
}

impl MultiError {
    pub fn new(results: Vec<Result<(), ItemError>>) -> Self {
        Self { results }
    }

    /// Build from a sparse `None`-for-success list.
    pub fn from_errors<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = Option<ItemError>>,
    {
        Self {
            results: errors
                .into_iter()
                .map(|e| match e {
                    Some(err) => Err(err),
                    None => Ok(()),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The failure at `position`, if that item failed.
    pub fn get(&self, position: usize) -> Option<&ItemError> {
        match self.results.get(position) {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    pub fn results(&self) -> &[Result<(), ItemError>] {
        &self.results
    }

    /// Iterate over `(position, error)` for failed items only.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &ItemError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }

    pub fn into_results(self) -> Vec<Result<(), ItemError>> {
        self.results
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures().next() {
            Some((position, err)) => write!(
                f,
                "{} of {} items failed (first at position {}: {})",
                self.failure_count(),
                self.len(),
                position,
                err
            ),
            None => write!(f, "0 of {} items failed", self.len()),
        }
    }
}

impl std::error::Error for MultiError {}

/// Errors returned by the chunker, the retrier and the backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("length of keys ({keys}) and records ({records}) does not match")]
    InputMismatch { keys: usize, records: usize },

    #[error("chunk size for {operation} must be at least 1")]
    InvalidChunkSize { operation: &'static str },

    /// One or more items failed; positions line up with the submitted keys.
    #[error(transparent)]
    Partial(#[from] MultiError),

    #[error("backend reported {actual} item results for a window of {expected} items")]
    MisalignedPartial { expected: usize, actual: usize },

    #[error("request timed out: {0}")]
    Timeout(String),

    /// Concurrent modification of the same item.
    #[error("conflicting concurrent modification: {0}")]
    Conflict(String),

    #[error("request rate too high: {0}")]
    Throttled(String),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Backend(String),

    /// Explicitly tagged as worth retrying.
    #[error(transparent)]
    Retriable(Box<StoreError>),
}

impl StoreError {
    /// Tag an error as retriable.
    pub fn retriable(err: StoreError) -> Self {
        StoreError::Retriable(Box::new(err))
    }

    /// The underlying error with any retriable tag removed.
    pub fn actual(&self) -> &StoreError {
        match self {
            StoreError::Retriable(inner) => inner.actual(),
            other => other,
        }
    }

    /// The positional report, if this is a partial failure.
    pub fn as_partial(&self) -> Option<&MultiError> {
        match self {
            StoreError::Partial(multi) => Some(multi),
            _ => None,
        }
    }
}

impl IsRetriable for StoreError {
    fn is_retriable(&self) -> bool {
        matches!(
            self,
            StoreError::Retriable(_)
                | StoreError::Timeout(_)
                | StoreError::Conflict(_)
                | StoreError::Throttled(_)
        )
    }
}

// ========== SDK ERROR MAPPING ==========

/// Map non-service `SdkError` variants (dispatch failures, timeouts, etc.).
///
/// Returns `None` for `ServiceError`.
fn map_outer_sdk_error<E, R>(err: &SdkError<E, R>) -> Option<StoreError>
where
    E: fmt::Debug,
    R: fmt::Debug,
{
    match err {
        SdkError::DispatchFailure(dispatch) => {
            if dispatch.is_timeout() {
                Some(StoreError::Timeout(
                    "connection to DynamoDB timed out".to_string(),
                ))
            } else if dispatch.is_io() {
                Some(StoreError::Connection(
                    "I/O error while talking to DynamoDB".to_string(),
                ))
            } else {
                Some(StoreError::Connection(format!(
                    "could not reach DynamoDB: {:?}",
                    dispatch
                )))
            }
        }
        SdkError::TimeoutError(_) => Some(StoreError::Timeout(
            "DynamoDB request timed out".to_string(),
        )),
        SdkError::ConstructionFailure(err) => {
            let msg = format!("{:?}", err);
            if msg.contains("credentials")
                || msg.contains("Credentials")
                || msg.contains("NoCredentialsError")
            {
                Some(StoreError::Credentials(
                    "no AWS credentials found; configure environment variables, a profile or an IAM role"
                        .to_string(),
                ))
            } else {
                Some(StoreError::Backend(format!(
                    "failed to build request: {}",
                    msg
                )))
            }
        }
        SdkError::ResponseError(err) => Some(StoreError::Backend(format!(
            "invalid response from DynamoDB: {:?}",
            err
        ))),
        SdkError::ServiceError(_) => None,
        _ => Some(StoreError::Backend(format!(
            "unknown error from DynamoDB: {:?}",
            err
        ))),
    }
}

/// Map a DynamoDB service error code and message to a `StoreError`.
fn map_dynamodb_code(
    code: Option<&str>,
    message: Option<&str>,
    display: &str,
    table: Option<&str>,
) -> StoreError {
    let msg = message.unwrap_or(display).to_string();

    match code {
        Some("UnrecognizedClientException")
        | Some("ExpiredTokenException")
        | Some("InvalidSignatureException") => StoreError::Credentials(msg),
        Some("AccessDeniedException") => StoreError::AccessDenied(msg),
        Some("ProvisionedThroughputExceededException")
        | Some("RequestLimitExceeded")
        | Some("ThrottlingException")
        | Some("LimitExceededException") => StoreError::Throttled(msg),
        Some("TransactionConflictException") | Some("TransactionInProgressException") => {
            StoreError::Conflict(msg)
        }
        Some("ResourceNotFoundException") => match table {
            Some(t) => StoreError::ResourceNotFound(format!("table '{}'", t)),
            None => StoreError::ResourceNotFound(msg),
        },
        Some("ValidationException") | Some("ItemCollectionSizeLimitExceededException") => {
            StoreError::Validation(msg)
        }
        Some("RequestTimeout") | Some("RequestTimeoutException") => StoreError::Timeout(msg),
        _ => StoreError::Backend(msg),
    }
}

/// Map a DynamoDB `SdkError` into a `StoreError`.
///
/// For `ServiceError`, uses `ProvideErrorMetadata` to read the error code.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>, table: Option<&str>) -> StoreError
where
    E: aws_sdk_dynamodb::error::ProvideErrorMetadata + fmt::Debug + fmt::Display,
    R: fmt::Debug,
{
    if let Some(store_err) = map_outer_sdk_error(&err) {
        return store_err;
    }

    if let Some(service_err) = err.as_service_error() {
        let meta = aws_sdk_dynamodb::error::ProvideErrorMetadata::meta(service_err);
        let display = service_err.to_string();
        return map_dynamodb_code(meta.code(), meta.message(), &display, table);
    }

    StoreError::Backend(format!("unexpected DynamoDB error: {:?}", err))
}
