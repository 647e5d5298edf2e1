//! Upstream client error types.

use thiserror::Error;

use crate::traits::Endpoint;

/// Upstream-specific errors.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status.
    #[error("{} API error: {status}", .endpoint.label())]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    /// The request could not be sent or the connection failed.
    #[error("{} request failed: {message}", .endpoint.label())]
    Transport { endpoint: Endpoint, message: String },

    /// The response body did not decode as expected.
    #[error("{} response could not be decoded: {message}", .endpoint.label())]
    Decode { endpoint: Endpoint, message: String },

    /// The client could not be built from its configuration.
    #[error("invalid upstream configuration: {message}")]
    InvalidConfig { message: String },
}

impl UpstreamError {
    /// Returns the endpoint the error came from, if any.
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            UpstreamError::Status { endpoint, .. }
            | UpstreamError::Transport { endpoint, .. }
            | UpstreamError::Decode { endpoint, .. } => Some(*endpoint),
            UpstreamError::InvalidConfig { .. } => None,
        }
    }

    /// Returns the upstream HTTP status when upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
