//! Mock directory for network builder testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheConfig, ResponseCache};
use crate::directory::ProfileDirectory;
use crate::error::{DomainError, DomainResult};
use crate::lookup::CachedLookup;
use crate::model::{
    InvitationActivity, Invitee, LegacyProfile, Profile, ProfileId, SearchResults,
};

/// In-memory invitation graph with scripted failures.
pub struct MockDirectory {
    users: RwLock<HashMap<ProfileId, Profile>>,
    invitations: RwLock<HashMap<ProfileId, Vec<InvitationActivity>>>,
    failing_users: RwLock<HashSet<ProfileId>>,
    failing_invitations: RwLock<HashSet<ProfileId>>,
    next_activity_id: AtomicUsize,
    user_calls: AtomicUsize,
    page_calls: AtomicUsize,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            invitations: RwLock::new(HashMap::new()),
            failing_users: RwLock::new(HashSet::new()),
            failing_invitations: RwLock::new(HashSet::new()),
            next_activity_id: AtomicUsize::new(1),
            user_calls: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
        }
    }

    pub async fn add_user(&self, id: u64, username: &str) {
        let profile = Profile {
            id: id + 10_000,
            profile_id: Some(ProfileId::new(id)),
            username: Some(username.to_string()),
            display_name: Some(username.to_uppercase()),
            score: Some(1000 + id as i64),
            ..Default::default()
        };
        self.users.write().await.insert(ProfileId::new(id), profile);
    }

    /// Records that `inviter` invited `invitee`.
    pub async fn add_invitation(&self, inviter: u64, invitee: u64) {
        let invitee = Invitee {
            userkey: Some(ProfileId::new(invitee).userkey()),
            profile_id: Some(ProfileId::new(invitee)),
            ..Default::default()
        };
        self.push_activity(inviter, Some(invitee)).await;
    }

    /// Records an invitation whose invitee has no profile yet.
    pub async fn add_unresolved_invitation(&self, inviter: u64, address: &str) {
        let invitee = Invitee {
            userkey: Some(format!("address:{address}")),
            ..Default::default()
        };
        self.push_activity(inviter, Some(invitee)).await;
    }

    pub async fn fail_user_lookup(&self, id: u64) {
        self.failing_users.write().await.insert(ProfileId::new(id));
    }

    pub async fn fail_invitation_lookup(&self, id: u64) {
        self.failing_invitations
            .write()
            .await
            .insert(ProfileId::new(id));
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    async fn push_activity(&self, inviter: u64, invitee: Option<Invitee>) {
        let activity_id = self.next_activity_id.fetch_add(1, Ordering::SeqCst) as u64;
        self.invitations
            .write()
            .await
            .entry(ProfileId::new(inviter))
            .or_default()
            .push(InvitationActivity {
                activity_id,
                created_at: None,
                invitee,
            });
    }
}

#[async_trait]
impl ProfileDirectory for MockDirectory {
    async fn search_users(&self, _query: &str, limit: u32) -> DomainResult<SearchResults> {
        Ok(SearchResults {
            limit: u64::from(limit),
            ..Default::default()
        })
    }

    async fn users_by_profile_ids(&self, ids: &[ProfileId]) -> DomainResult<Vec<Profile>> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_users.read().await;
        if ids.iter().any(|id| failing.contains(id)) {
            return Err(DomainError::UpstreamUnavailable {
                message: "connection reset".to_string(),
            });
        }
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn legacy_profile(&self, _id: ProfileId) -> DomainResult<Option<LegacyProfile>> {
        Ok(None)
    }

    async fn invitation_page(
        &self,
        inviter: ProfileId,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<InvitationActivity>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_invitations.read().await.contains(&inviter) {
            return Err(DomainError::UpstreamStatus {
                endpoint: "activities".to_string(),
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(self
            .invitations
            .read()
            .await
            .get(&inviter)
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

/// Wraps a directory in a fresh cache.
pub fn lookup_for(directory: Arc<MockDirectory>) -> CachedLookup<MockDirectory> {
    CachedLookup::new(
        directory,
        Arc::new(ResponseCache::new(CacheConfig::default())),
    )
}
