//! In-memory upstream implementation for testing and local runs.
//!
//! Holds users, legacy profiles and invitation activities in `DashMap`s and
//! answers the [`UpstreamClient`] calls from them, honoring `limit`/`offset`
//! the way upstream does. Failures can be injected per endpoint and profile,
//! and every call is counted.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;

use crate::error::{UpstreamError, UpstreamResult};
use crate::traits::{Endpoint, UpstreamClient};
use crate::wire::{
    WireActivity, WireActivitySubject, WireLegacyProfile, WireProfilesEnvelope,
    WireSearchResponse, WireUser,
};

/// Failure key used for endpoints that are not tied to one profile.
const ANY_PROFILE: u64 = u64::MAX;

/// In-memory implementation of UpstreamClient.
#[derive(Debug, Default)]
pub struct MemoryUpstream {
    users: DashMap<u64, WireUser>,
    legacy_profiles: DashMap<u64, WireLegacyProfile>,
    /// Activities authored by each inviter, in upstream order.
    activities: DashMap<u64, Vec<WireActivity>>,
    failures: DashMap<(Endpoint, u64), u16>,
    calls: DashMap<Endpoint, usize>,
}

impl MemoryUpstream {
    /// Creates an empty upstream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty upstream wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Inserts or replaces a user, keyed by its profile id.
    ///
    /// Users without a profile id are ignored.
    pub fn insert_user(&self, user: WireUser) {
        if let Some(profile_id) = user.profile_id {
            self.users.insert(profile_id, user);
        }
    }

    /// Inserts or replaces a legacy profile.
    pub fn insert_legacy_profile(&self, profile: WireLegacyProfile) {
        self.legacy_profiles.insert(profile.id, profile);
    }

    /// Appends an activity authored by `inviter`.
    pub fn push_activity(&self, inviter: u64, activity: WireActivity) {
        self.activities.entry(inviter).or_default().push(activity);
    }

    /// Records that `inviter` invited `invitee`, resolving the invitee's details
    /// from the stored user when present.
    pub fn add_invitation(&self, inviter: u64, invitee: u64) {
        let user = self.users.get(&invitee).map(|u| u.value().clone());
        let subject = WireActivitySubject {
            userkey: Some(format!("profileId:{invitee}")),
            profile_id: Some(invitee),
            username: user.as_ref().and_then(|u| u.username.clone()),
            display_name: user.as_ref().and_then(|u| u.display_name.clone()),
            avatar_url: user.as_ref().and_then(|u| u.avatar_url.clone()),
            score: user.as_ref().and_then(|u| u.score),
        };
        let id = self.activities.iter().map(|e| e.value().len()).sum::<usize>() as u64 + 1;
        self.push_activity(
            inviter,
            WireActivity {
                id,
                created_at: Some(serde_json::Value::from(1_700_000_000 + id)),
                subject: Some(subject),
            },
        );
    }

    /// Makes calls to `endpoint` for `profile_id` answer with `status`.
    pub fn fail_with_status(&self, endpoint: Endpoint, profile_id: u64, status: u16) {
        self.failures.insert((endpoint, profile_id), status);
    }

    /// Makes every call to `endpoint` answer with `status`.
    pub fn fail_endpoint(&self, endpoint: Endpoint, status: u16) {
        self.failures.insert((endpoint, ANY_PROFILE), status);
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    /// Number of calls made to `endpoint` so far.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls.get(&endpoint).map(|c| *c).unwrap_or(0)
    }

    fn enter(&self, endpoint: Endpoint, profile_ids: &[u64]) -> UpstreamResult<()> {
        *self.calls.entry(endpoint).or_insert(0) += 1;

        let injected = std::iter::once(ANY_PROFILE)
            .chain(profile_ids.iter().copied())
            .find_map(|id| self.failures.get(&(endpoint, id)).map(|s| *s));

        match injected {
            Some(status) => Err(UpstreamError::Status {
                endpoint,
                status,
                body: format!("injected failure for {}", endpoint.as_str()),
            }),
            None => Ok(()),
        }
    }
}

fn matches_query(user: &WireUser, needle: &str) -> bool {
    [&user.username, &user.display_name]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

#[async_trait]
impl UpstreamClient for MemoryUpstream {
    #[instrument(skip(self))]
    async fn search_users(&self, query: &str, limit: u32) -> UpstreamResult<WireSearchResponse> {
        self.enter(Endpoint::UserSearch, &[])?;

        let needle = query.to_lowercase();
        let mut matched: Vec<WireUser> = self
            .users
            .iter()
            .filter(|entry| matches_query(entry.value(), &needle))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by_key(|u| u.profile_id);

        let total = matched.len() as u64;
        matched.truncate(limit as usize);
        Ok(WireSearchResponse {
            values: matched,
            total,
            limit: u64::from(limit),
            offset: 0,
        })
    }

    #[instrument(skip(self))]
    async fn users_by_profile_ids(&self, profile_ids: &[u64]) -> UpstreamResult<Vec<WireUser>> {
        self.enter(Endpoint::UsersByProfileId, profile_ids)?;
        Ok(profile_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.value().clone()))
            .collect())
    }

    #[instrument(skip(self))]
    async fn legacy_profiles(
        &self,
        ids: &[u64],
        limit: u32,
        offset: u32,
    ) -> UpstreamResult<WireProfilesEnvelope> {
        self.enter(Endpoint::LegacyProfiles, ids)?;
        let values = ids
            .iter()
            .filter_map(|id| self.legacy_profiles.get(id).map(|p| p.value().clone()))
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(WireProfilesEnvelope::found(
            values,
            u64::from(limit),
            u64::from(offset),
        ))
    }

    #[instrument(skip(self))]
    async fn invitation_activities(
        &self,
        profile_id: u64,
        limit: u32,
        offset: u32,
    ) -> UpstreamResult<Vec<WireActivity>> {
        self.enter(Endpoint::Activities, &[profile_id])?;
        Ok(self
            .activities
            .get(&profile_id)
            .map(|all| {
                all.iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(profile_id: u64, username: &str) -> WireUser {
        WireUser {
            id: profile_id + 100,
            profile_id: Some(profile_id),
            username: Some(username.to_string()),
            display_name: Some(username.to_uppercase()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_matches_username_and_display_name_case_insensitively() {
        let upstream = MemoryUpstream::new();
        upstream.insert_user(user(1, "alice"));
        upstream.insert_user(user(2, "alicia"));
        upstream.insert_user(user(3, "bob"));

        let result = upstream.search_users("ALI", 10).await.unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.values[0].profile_id, Some(1));

        let limited = upstream.search_users("ali", 1).await.unwrap();
        assert_eq!(limited.values.len(), 1);
        assert_eq!(limited.total, 2);
        assert_eq!(limited.limit, 1);
    }

    #[tokio::test]
    async fn test_activities_honor_limit_and_offset() {
        let upstream = MemoryUpstream::new();
        for invitee in 10..15 {
            upstream.add_invitation(1, invitee);
        }

        let first = upstream.invitation_activities(1, 2, 0).await.unwrap();
        let last = upstream.invitation_activities(1, 2, 4).await.unwrap();
        let none = upstream.invitation_activities(2, 2, 0).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].subject.as_ref().unwrap().profile_id, Some(10));
        assert_eq!(last.len(), 1);
        assert!(none.is_empty());
        assert_eq!(upstream.calls(Endpoint::Activities), 3);
    }

    #[tokio::test]
    async fn test_invitation_subject_copies_known_user_details() {
        let upstream = MemoryUpstream::new();
        upstream.insert_user(user(43, "alice"));
        upstream.add_invitation(42, 43);

        let page = upstream.invitation_activities(42, 10, 0).await.unwrap();
        let subject = page[0].subject.as_ref().unwrap();
        assert_eq!(subject.userkey.as_deref(), Some("profileId:43"));
        assert_eq!(subject.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_legacy_profiles_wrap_found_records() {
        let upstream = MemoryUpstream::new();
        upstream.insert_legacy_profile(WireLegacyProfile {
            id: 42,
            invited_by: Some(1),
            ..Default::default()
        });

        let found = upstream.legacy_profiles(&[42], 1, 0).await.unwrap();
        assert_eq!(found.into_first().unwrap().invited_by, Some(1));

        let missing = upstream.legacy_profiles(&[7], 1, 0).await.unwrap();
        assert!(missing.ok);
        assert_eq!(missing.into_first(), None);
    }

    #[tokio::test]
    async fn test_injected_failures_are_scoped_to_profile_or_endpoint() {
        let upstream = MemoryUpstream::new();
        upstream.insert_user(user(1, "alice"));
        upstream.insert_user(user(2, "bob"));
        upstream.fail_with_status(Endpoint::UsersByProfileId, 2, 404);

        assert!(upstream.users_by_profile_ids(&[1]).await.is_ok());
        let err = upstream.users_by_profile_ids(&[2]).await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        upstream.fail_endpoint(Endpoint::UserSearch, 503);
        let err = upstream.search_users("al", 10).await.unwrap_err();
        assert_eq!(err.status(), Some(503));

        upstream.clear_failures();
        assert!(upstream.users_by_profile_ids(&[2]).await.is_ok());
        assert!(upstream.search_users("al", 10).await.is_ok());
    }
}
