//! Error types for stores.

use hearth_core::ClassError;
use thiserror::Error;

/// Errors raised by store loading, submission and data updates.
///
/// All of these are recoverable: the store keeps its previous data and the
/// condition is logged where it happens.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// `submit` was called on a store without a submit URL.
    #[error("no submit path configured (url.submit)")]
    SubmitEndpointMissing,

    /// `load` was called on a store without a get URL.
    #[error("no load path configured (url.get)")]
    LoadEndpointMissing,

    /// Already-bound data was passed where plain data was expected.
    #[error("cannot update store data using already-bound data")]
    RebindAlreadyBoundData,

    /// The store was created without a transport.
    #[error("no transport configured")]
    NoTransport,

    /// The transport failed to complete the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    /// Creating or calling the store's class failed.
    #[error(transparent)]
    Class(#[from] ClassError),

    /// The blocking transport task panicked or was cancelled.
    #[error("transport task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
