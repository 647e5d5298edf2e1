//! Adapter that bridges the upstream client to the domain layer.
//!
//! The domain layer (invitegraph-domain) defines the `ProfileDirectory` trait
//! it reads profiles and invitations through. The upstream crate implements
//! `UpstreamClient` against the REST API's wire format. [`UpstreamDirectory`]
//! implements the former with the latter and converts wire records into
//! domain types at the boundary.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use invitegraph_domain::directory::ProfileDirectory;
use invitegraph_domain::error::{DomainError, DomainResult};
use invitegraph_domain::model::{
    ActivityTimestamp, InvitationActivity, Invitee, LegacyProfile, Profile, ProfileId,
    SearchResults,
};
use invitegraph_upstream::wire::{WireActivity, WireLegacyProfile, WireUser};
use invitegraph_upstream::{UpstreamClient, UpstreamError};

/// Adapter that implements `ProfileDirectory` using an `UpstreamClient`.
pub struct UpstreamDirectory<U: UpstreamClient> {
    client: Arc<U>,
}

impl<U: UpstreamClient> UpstreamDirectory<U> {
    /// Creates a new adapter wrapping the given client.
    pub fn new(client: Arc<U>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<U> {
        &self.client
    }
}

/// Maps an upstream failure into the domain taxonomy.
///
/// Status errors keep the endpoint label and body for the route layer; every
/// other failure becomes `UpstreamUnavailable`.
pub fn domain_error(err: UpstreamError) -> DomainError {
    match err {
        UpstreamError::Status {
            endpoint,
            status,
            body,
        } => DomainError::UpstreamStatus {
            endpoint: endpoint.label().to_string(),
            status,
            body,
        },
        other => DomainError::UpstreamUnavailable {
            message: other.to_string(),
        },
    }
}

fn profile_from_wire(user: WireUser) -> Profile {
    Profile {
        id: user.id,
        profile_id: user.profile_id.map(ProfileId::new),
        display_name: user.display_name,
        username: user.username,
        avatar_url: user.avatar_url,
        description: user.description,
        score: user.score,
        status: user.status,
        userkeys: user.userkeys,
        xp_total: user.xp_total,
        xp_streak_days: user.xp_streak_days,
        // Unknown shapes are dropped rather than failing the whole record.
        links: user.links.and_then(|v| serde_json::from_value(v).ok()),
        stats: user.stats.and_then(|v| serde_json::from_value(v).ok()),
    }
}

fn legacy_from_wire(profile: WireLegacyProfile) -> LegacyProfile {
    LegacyProfile {
        id: ProfileId::new(profile.id),
        archived: profile.archived,
        created_at: profile.created_at,
        updated_at: profile.updated_at,
        invites_available: profile.invites_available,
        invited_by: profile.invited_by.map(ProfileId::new),
    }
}

fn timestamp_from_wire(value: Value) -> Option<ActivityTimestamp> {
    match value {
        Value::Number(n) => n.as_i64().map(ActivityTimestamp::Epoch),
        Value::String(s) => Some(ActivityTimestamp::Text(s)),
        _ => None,
    }
}

fn activity_from_wire(activity: WireActivity) -> InvitationActivity {
    InvitationActivity {
        activity_id: activity.id,
        created_at: activity.created_at.and_then(timestamp_from_wire),
        invitee: activity.subject.map(|s| Invitee {
            userkey: s.userkey,
            profile_id: s.profile_id.map(ProfileId::new),
            username: s.username,
            display_name: s.display_name,
            avatar_url: s.avatar_url,
            score: s.score,
        }),
    }
}

#[async_trait]
impl<U: UpstreamClient> ProfileDirectory for UpstreamDirectory<U> {
    async fn search_users(&self, query: &str, limit: u32) -> DomainResult<SearchResults> {
        let response = self
            .client
            .search_users(query, limit)
            .await
            .map_err(domain_error)?;
        Ok(SearchResults {
            values: response.values.into_iter().map(profile_from_wire).collect(),
            total: response.total,
            limit: response.limit,
            offset: response.offset,
        })
    }

    async fn users_by_profile_ids(&self, ids: &[ProfileId]) -> DomainResult<Vec<Profile>> {
        let raw: Vec<u64> = ids.iter().map(|id| id.get()).collect();
        let users = self
            .client
            .users_by_profile_ids(&raw)
            .await
            .map_err(domain_error)?;
        Ok(users.into_iter().map(profile_from_wire).collect())
    }

    async fn legacy_profile(&self, id: ProfileId) -> DomainResult<Option<LegacyProfile>> {
        let envelope = self
            .client
            .legacy_profiles(&[id.get()], 1, 0)
            .await
            .map_err(domain_error)?;
        Ok(envelope.into_first().map(legacy_from_wire))
    }

    async fn invitation_page(
        &self,
        inviter: ProfileId,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<InvitationActivity>> {
        let page = self
            .client
            .invitation_activities(inviter.get(), limit, offset)
            .await
            .map_err(domain_error)?;
        Ok(page.into_iter().map(activity_from_wire).collect())
    }
}
