//! Domain error types for lookup and graph operations.

use thiserror::Error;

/// Domain-specific errors.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// A profile identifier was missing or not a non-negative integer.
    #[error("invalid profile id: {value}")]
    InvalidProfileId { value: String },

    /// A search query was shorter than the minimum length.
    #[error("query must be at least {min_len} characters")]
    QueryTooShort { min_len: usize },

    /// The upstream network has no record for the profile.
    #[error("profile not found: {profile_id}")]
    ProfileNotFound { profile_id: u64 },

    /// The upstream network answered with a non-success status.
    ///
    /// `endpoint` is the human label of the upstream API (e.g. `Activities`).
    #[error("{endpoint} API error: {status}")]
    UpstreamStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The upstream request failed before a status was available
    /// (connect error, timeout, undecodable body).
    #[error("upstream request failed: {message}")]
    UpstreamUnavailable { message: String },

    /// A cached payload could not be encoded or decoded.
    #[error("cache serialization error: {message}")]
    CacheSerialization { message: String },

    /// Recent search storage failed.
    #[error("recent search storage error: {message}")]
    RecentSearchStorage { message: String },
}

impl DomainError {
    /// Returns the upstream status code when the error carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            DomainError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
