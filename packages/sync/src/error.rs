//! Error types for the sync layer.

use topicbus_core::Error as CoreError;

/// Errors from a persistence backend.
///
/// These never propagate out of the sync layer's side effects - they
/// are logged and swallowed - but backends and constructors report
/// them, and loading at construction surfaces them to diagnostics.
#[derive(thiserror::Error, Debug)]
pub enum BlobError {
    #[error("blob i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid blob key: {key}")]
    InvalidKey { key: String },

    #[error("blob backend failure: {message}")]
    Backend { message: String },
}

/// Errors at the sync layer.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An error from the wrapped core engine.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// Snapshot or envelope (de)serialization failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persistence backend failed.
    #[error("persistence error: {0}")]
    Blob(#[from] BlobError),

    /// Peer ids identify a sender on the wire and cannot be empty.
    #[error("peer id must be a non-empty string")]
    InvalidPeerId,

    /// Target origins, when set, cannot be empty.
    #[error("target origin must be a non-empty string")]
    InvalidTargetOrigin,

    /// Acceptable sender ids cannot be empty.
    #[error("acceptable id must be a non-empty string")]
    InvalidAcceptableId,
}

/// Result of a sync-layer operation honoring `silent_errors`; same
/// sentinel convention as [`topicbus_core::OpResult`].
pub type SyncResult<T> = Result<Option<T>, Error>;
