//! Error types for the request client.
//!
//! # Design
//! Failures are returned, never just logged. A non-success status lands in
//! `HttpError` with the raw status and body; a request that never got a
//! status at all is a `NetworkError`. The remaining variants cover local
//! failures while building a request or decoding its response.

use thiserror::Error;

use crate::http::TransportError;

/// Errors surfaced by `RequestClient`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a status outside the operation's success set.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The transport failed before any status was received.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response body could not be decoded as the client's response type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("unsupported response type: {0:?}")]
    UnsupportedResponseType(String),

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// A header name or value the transport would refuse to send.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: &'static str },
}

impl ApiError {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::NetworkError(_))
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::NetworkError(err.message().to_string())
    }
}
