//! UpstreamClient trait definition.

use std::fmt;

use async_trait::async_trait;

use crate::error::UpstreamResult;
use crate::wire::{WireActivity, WireProfilesEnvelope, WireSearchResponse, WireUser};

/// The upstream endpoints the service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET {v2}/users/search`
    UserSearch,
    /// `POST {v2}/users/by/profile-id`
    UsersByProfileId,
    /// `POST {v1}/profiles`
    LegacyProfiles,
    /// `GET {v2}/activities/userkey`
    Activities,
}

impl Endpoint {
    /// Stable identifier used in metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::UserSearch => "user_search",
            Endpoint::UsersByProfileId => "users_by_profile_id",
            Endpoint::LegacyProfiles => "legacy_profiles",
            Endpoint::Activities => "activities",
        }
    }

    /// Human label used in client-facing error messages (`"<label> API error"`).
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::UserSearch => "Ethos",
            Endpoint::UsersByProfileId => "Users",
            Endpoint::LegacyProfiles => "Profiles",
            Endpoint::Activities => "Activities",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract client for the upstream reputation network.
///
/// Implementations must be thread-safe (Send + Sync). A non-success HTTP
/// status is always reported as [`UpstreamError::Status`](crate::UpstreamError::Status)
/// carrying the response body.
#[async_trait]
pub trait UpstreamClient: Send + Sync + 'static {
    /// Free-text user search.
    async fn search_users(&self, query: &str, limit: u32) -> UpstreamResult<WireSearchResponse>;

    /// Current user records for the given profile ids.
    async fn users_by_profile_ids(&self, profile_ids: &[u64]) -> UpstreamResult<Vec<WireUser>>;

    /// Legacy profile records by id.
    async fn legacy_profiles(
        &self,
        ids: &[u64],
        limit: u32,
        offset: u32,
    ) -> UpstreamResult<WireProfilesEnvelope>;

    /// One page of invitation activities authored by `profile_id`.
    async fn invitation_activities(
        &self,
        profile_id: u64,
        limit: u32,
        offset: u32,
    ) -> UpstreamResult<Vec<WireActivity>>;
}
