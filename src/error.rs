//! Error taxonomy for backend interactions and response processing

use thiserror::Error;

/// Failure categories surfaced to the caller.
///
/// Every variant carries a human-readable message and is displayable; none of
/// them is fatal to the session. The caller keeps the raw response around when
/// a `Payload` error occurs so it can be shown for diagnosis.
#[derive(Debug, Error)]
pub enum LensError {
    /// Connection failure, timeout, or non-200 status from the backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered 200 but the body does not have the expected shape.
    #[error("processing error: {0}")]
    Payload(String),

    /// A required column could not be resolved in the customer table.
    #[error("schema mismatch: {0}")]
    Schema(String),
}

pub type LensResult<T> = Result<T, LensError>;
