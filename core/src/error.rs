//! Error types for the exchange helper.
//!
//! # Design
//! None of these escape [`HttpClient::request`](crate::HttpClient::request):
//! every failure is either recovered locally (logged and skipped) or turned
//! into a failure-shaped [`Response`](crate::Response) delivered through the
//! completion callback. They exist so transports and encoders can report
//! precisely what went wrong to the controller, which decides the policy.

/// A transport refused part of the exchange configuration.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid URL {0:?}")]
    InvalidUrl(String),

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Configuration was attempted before `open`.
    #[error("transport is not opened")]
    NotOpened,
}

/// A request body could not be encoded.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A `responseType` token outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown response type {0:?}")]
pub struct UnknownResponseType(pub String);
