//! Fake directory shared by handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use invitegraph_domain::cache::{CacheConfig, ResponseCache};
use invitegraph_domain::directory::ProfileDirectory;
use invitegraph_domain::lookup::CachedLookup;
use invitegraph_domain::model::{
    ActivityTimestamp, InvitationActivity, Invitee, LegacyProfile, Profile, ProfileId,
    SearchResults,
};
use invitegraph_domain::{DomainError, DomainResult};

#[derive(Default)]
struct Inner {
    users: Vec<Profile>,
    legacy: Vec<LegacyProfile>,
    invitations: Vec<(ProfileId, InvitationActivity)>,
    search_status: Option<u16>,
    user_status: Vec<(ProfileId, u16)>,
    user_unreachable: Vec<ProfileId>,
    legacy_status: Option<u16>,
    invitation_status: Option<u16>,
}

/// Scriptable in-memory directory. Clones share state.
#[derive(Clone, Default)]
pub struct FakeDirectory {
    inner: Arc<Mutex<Inner>>,
    search_calls: Arc<AtomicUsize>,
    user_calls: Arc<AtomicUsize>,
}

fn status_error(endpoint: &str, status: u16) -> DomainError {
    DomainError::UpstreamStatus {
        endpoint: endpoint.to_string(),
        status,
        body: format!("{endpoint} failed"),
    }
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: u64, username: &str) {
        self.inner.lock().unwrap().users.push(Profile {
            id: id + 500,
            profile_id: Some(ProfileId::new(id)),
            username: Some(username.to_string()),
            display_name: Some(format!("{username} display")),
            avatar_url: Some(format!("https://avatars.test/{username}.png")),
            description: Some(format!("about {username}")),
            score: Some(1000 + id as i64),
            status: Some("ACTIVE".to_string()),
            ..Default::default()
        });
    }

    pub fn add_legacy(&self, id: u64, invited_by: Option<u64>) {
        self.inner.lock().unwrap().legacy.push(LegacyProfile {
            id: ProfileId::new(id),
            archived: false,
            // 2024-01-15T10:30:00Z
            created_at: 1_705_314_600,
            updated_at: 1_705_314_700,
            invites_available: 2,
            invited_by: invited_by.map(ProfileId::new),
        });
    }

    pub fn add_invitation(&self, inviter: u64, invitee: Invitee) {
        let mut inner = self.inner.lock().unwrap();
        let activity_id = inner.invitations.len() as u64 + 1;
        inner.invitations.push((
            ProfileId::new(inviter),
            InvitationActivity {
                activity_id,
                created_at: Some(ActivityTimestamp::Epoch(1_700_000_000 + activity_id as i64)),
                invitee: Some(invitee),
            },
        ));
    }

    pub fn fail_search(&self, status: u16) {
        self.inner.lock().unwrap().search_status = Some(status);
    }

    pub fn fail_user(&self, id: u64, status: u16) {
        self.inner
            .lock()
            .unwrap()
            .user_status
            .push((ProfileId::new(id), status));
    }

    pub fn unreachable_user(&self, id: u64) {
        self.inner
            .lock()
            .unwrap()
            .user_unreachable
            .push(ProfileId::new(id));
    }

    pub fn fail_legacy(&self, status: u16) {
        self.inner.lock().unwrap().legacy_status = Some(status);
    }

    pub fn fail_invitations(&self, status: u16) {
        self.inner.lock().unwrap().invitation_status = Some(status);
    }

    pub fn restore_invitations(&self) {
        self.inner.lock().unwrap().invitation_status = None;
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileDirectory for FakeDirectory {
    async fn search_users(&self, query: &str, limit: u32) -> DomainResult<SearchResults> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        if let Some(status) = inner.search_status {
            return Err(status_error("Ethos", status));
        }
        let values: Vec<Profile> = inner
            .users
            .iter()
            .filter(|u| u.username.as_deref().is_some_and(|n| n.contains(query)))
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(SearchResults {
            total: values.len() as u64,
            values,
            limit: u64::from(limit),
            offset: 0,
        })
    }

    async fn users_by_profile_ids(&self, ids: &[ProfileId]) -> DomainResult<Vec<Profile>> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        if let Some((_, status)) = inner.user_status.iter().find(|(id, _)| ids.contains(id)) {
            return Err(status_error("Users", *status));
        }
        if ids.iter().any(|id| inner.user_unreachable.contains(id)) {
            return Err(DomainError::UpstreamUnavailable {
                message: "connection refused".to_string(),
            });
        }
        Ok(inner
            .users
            .iter()
            .filter(|u| u.profile_id.is_some_and(|p| ids.contains(&p)))
            .cloned()
            .collect())
    }

    async fn legacy_profile(&self, id: ProfileId) -> DomainResult<Option<LegacyProfile>> {
        let inner = self.inner.lock().unwrap();
        if let Some(status) = inner.legacy_status {
            return Err(status_error("Profiles", status));
        }
        Ok(inner.legacy.iter().find(|p| p.id == id).cloned())
    }

    async fn invitation_page(
        &self,
        inviter: ProfileId,
        limit: u32,
        offset: u32,
    ) -> DomainResult<Vec<InvitationActivity>> {
        let inner = self.inner.lock().unwrap();
        if let Some(status) = inner.invitation_status {
            return Err(status_error("Activities", status));
        }
        Ok(inner
            .invitations
            .iter()
            .filter(|(author, _)| *author == inviter)
            .map(|(_, activity)| activity.clone())
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

/// Wraps a fake directory in a fresh cache.
pub fn lookup_with(directory: FakeDirectory) -> CachedLookup<FakeDirectory> {
    CachedLookup::new(
        Arc::new(directory),
        Arc::new(ResponseCache::new(CacheConfig::default())),
    )
}
