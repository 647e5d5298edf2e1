//! The upstream lookups the domain needs, as a trait.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{InvitationActivity, LegacyProfile, Profile, ProfileId, SearchResults};

/// Read access to the upstream reputation network.
///
/// Implementations report a non-success upstream response as
/// [`DomainError::UpstreamStatus`](crate::error::DomainError::UpstreamStatus)
/// and anything that failed before a status was available as
/// [`DomainError::UpstreamUnavailable`](crate::error::DomainError::UpstreamUnavailable).
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Searches users by free text.
    async fn search_users(&self, query: &str, limit: u32) -> DomainResult<SearchResults>;

    /// Resolves current user records for the given profile ids.
    ///
    /// Ids without a user record are simply absent from the result.
    async fn users_by_profile_ids(&self, ids: &[ProfileId]) -> DomainResult<Vec<Profile>>;

    /// Fetches the legacy profile record, `None` when upstream has no such profile.
    async fn legacy_profile(&self, id: ProfileId) -> DomainResult<Option<LegacyProfile>>;

    /// Fetches one page of invitation activities authored by `inviter`.
    async fn invitation_page(
        &self,
        inviter: ProfileId,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<InvitationActivity>>;
}
