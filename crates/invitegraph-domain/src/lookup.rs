//! Cache-wrapped upstream lookups.
//!
//! Every read the network builder and the route handlers make goes through
//! [`CachedLookup`], which memoizes results in the shared [`ResponseCache`]
//! under a logical key:
//!
//! | Lookup | Key | Category |
//! |---|---|---|
//! | current user record | `user-v2:<id>` | `Profile` |
//! | legacy profile | `profile-v1:<id>` | `Profile` |
//! | full invitation list | `invitations:<id>` | `Invitations` |
//! | search | `search:<query>:<limit>` | `Search` |

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{cache_key, CacheCategory, ResponseCache};
use crate::directory::ProfileDirectory;
use crate::error::DomainResult;
use crate::model::{InvitationActivity, LegacyProfile, Profile, ProfileId, SearchResults};

/// Default number of activities requested per upstream page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched for one inviter.
const MAX_PAGES: u32 = 1000;

/// Cached access to a [`ProfileDirectory`].
pub struct CachedLookup<D> {
    directory: Arc<D>,
    cache: Arc<ResponseCache>,
    page_size: u32,
}

impl<D> Clone for CachedLookup<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            cache: Arc::clone(&self.cache),
            page_size: self.page_size,
        }
    }
}

impl<D: ProfileDirectory> CachedLookup<D> {
    pub fn new(directory: Arc<D>, cache: Arc<ResponseCache>) -> Self {
        Self {
            directory,
            cache,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the page size used when following invitation pagination.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// Returns the current user record for a profile.
    ///
    /// Only found users are cached; an absent user is looked up again next time.
    pub async fn user(&self, id: ProfileId) -> DomainResult<Option<Profile>> {
        let key = cache_key("user-v2", [id]);
        if let Some(profile) = self.cache.get_as::<Profile>(&key) {
            return Ok(Some(profile));
        }

        let users = self.directory.users_by_profile_ids(&[id]).await?;
        let found = users.into_iter().next();
        if let Some(profile) = &found {
            self.cache.set_as(key, profile, CacheCategory::Profile)?;
        }
        Ok(found)
    }

    /// Returns the legacy profile record.
    pub async fn legacy_profile(&self, id: ProfileId) -> DomainResult<Option<LegacyProfile>> {
        let key = cache_key("profile-v1", [id]);
        self.cache
            .get_or_fetch(
                &key,
                || self.directory.legacy_profile(id),
                CacheCategory::Profile,
            )
            .await
    }

    /// Returns every invitation authored by `inviter`, following pagination.
    ///
    /// A failure on the first page is an error. A failure on a later page ends
    /// pagination and the pages gathered so far are returned.
    pub async fn invitations(&self, inviter: ProfileId) -> DomainResult<Vec<InvitationActivity>> {
        let key = cache_key("invitations", [inviter]);
        self.cache
            .get_or_fetch(
                &key,
                || self.fetch_all_invitations(inviter),
                CacheCategory::Invitations,
            )
            .await
    }

    /// Runs a user search.
    pub async fn search(&self, query: &str, limit: u32) -> DomainResult<SearchResults> {
        let key = cache_key("search", [query.to_string(), limit.to_string()]);
        self.cache
            .get_or_fetch(
                &key,
                || self.directory.search_users(query, limit),
                CacheCategory::Search,
            )
            .await
    }

    async fn fetch_all_invitations(
        &self,
        inviter: ProfileId,
    ) -> DomainResult<Vec<InvitationActivity>> {
        let limit = self.page_size;
        let mut all = Vec::new();
        let mut offset = 0u32;

        for page in 0..MAX_PAGES {
            let batch = match self.directory.invitation_page(inviter, limit, offset).await {
                Ok(batch) => batch,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        profile_id = %inviter,
                        offset,
                        error = %e,
                        "Invitation page failed, treating as end of data"
                    );
                    break;
                }
            };

            let fetched = batch.len();
            all.extend(batch);
            if fetched < limit as usize {
                break;
            }
            offset = offset.saturating_add(limit);
        }

        debug!(profile_id = %inviter, count = all.len(), "Fetched invitation list");
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::error::DomainError;
    use crate::model::Invitee;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Directory with a fixed invitation list and per-call failure scripting.
    #[derive(Default)]
    struct ScriptedDirectory {
        invitations: Vec<InvitationActivity>,
        users: Vec<Profile>,
        fail_offsets: Mutex<Vec<u32>>,
        page_calls: AtomicUsize,
        user_calls: AtomicUsize,
        search_calls: AtomicUsize,
    }

    fn activity(n: u64) -> InvitationActivity {
        InvitationActivity {
            activity_id: n,
            created_at: None,
            invitee: Some(Invitee {
                profile_id: Some(ProfileId::new(1000 + n)),
                ..Default::default()
            }),
        }
    }

    #[async_trait]
    impl ProfileDirectory for ScriptedDirectory {
        async fn search_users(&self, _query: &str, limit: u32) -> DomainResult<SearchResults> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchResults {
                values: self.users.clone(),
                total: self.users.len() as u64,
                limit: u64::from(limit),
                offset: 0,
            })
        }

        async fn users_by_profile_ids(&self, ids: &[ProfileId]) -> DomainResult<Vec<Profile>> {
            self.user_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .users
                .iter()
                .filter(|u| u.profile_id.is_some_and(|p| ids.contains(&p)))
                .cloned()
                .collect())
        }

        async fn legacy_profile(&self, _id: ProfileId) -> DomainResult<Option<LegacyProfile>> {
            Ok(None)
        }

        async fn invitation_page(
            &self,
            _inviter: ProfileId,
            limit: u32,
            offset: u32,
        ) -> DomainResult<Vec<InvitationActivity>> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_offsets.lock().unwrap().contains(&offset) {
                return Err(DomainError::UpstreamStatus {
                    endpoint: "activities".to_string(),
                    status: 502,
                    body: "bad gateway".to_string(),
                });
            }
            Ok(self
                .invitations
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    fn lookup(directory: ScriptedDirectory) -> CachedLookup<ScriptedDirectory> {
        CachedLookup::new(
            Arc::new(directory),
            Arc::new(ResponseCache::new(CacheConfig::default())),
        )
        .with_page_size(10)
    }

    #[tokio::test]
    async fn test_invitations_follow_pagination_until_short_page() {
        let lookup = lookup(ScriptedDirectory {
            invitations: (0..25).map(activity).collect(),
            ..Default::default()
        });

        let all = lookup.invitations(ProfileId::new(1)).await.unwrap();

        assert_eq!(all.len(), 25);
        assert_eq!(all[24].activity_id, 24);
        assert_eq!(lookup.directory().page_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_page_size_needs_one_empty_page() {
        let lookup = lookup(ScriptedDirectory {
            invitations: (0..20).map(activity).collect(),
            ..Default::default()
        });

        let all = lookup.invitations(ProfileId::new(1)).await.unwrap();

        assert_eq!(all.len(), 20);
        assert_eq!(lookup.directory().page_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failing_later_page_ends_pagination() {
        let lookup = lookup(ScriptedDirectory {
            invitations: (0..25).map(activity).collect(),
            fail_offsets: Mutex::new(vec![10]),
            ..Default::default()
        });

        let all = lookup.invitations(ProfileId::new(1)).await.unwrap();

        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn test_failing_first_page_is_an_error_and_not_cached() {
        let lookup = lookup(ScriptedDirectory {
            invitations: (0..5).map(activity).collect(),
            fail_offsets: Mutex::new(vec![0]),
            ..Default::default()
        });

        let err = lookup.invitations(ProfileId::new(1)).await.unwrap_err();
        assert_eq!(err.upstream_status(), Some(502));
        assert!(!lookup.cache().has("invitations:1"));

        lookup.directory().fail_offsets.lock().unwrap().clear();
        let all = lookup.invitations(ProfileId::new(1)).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn test_invitations_are_cached_per_inviter() {
        let lookup = lookup(ScriptedDirectory {
            invitations: (0..3).map(activity).collect(),
            ..Default::default()
        });

        lookup.invitations(ProfileId::new(1)).await.unwrap();
        lookup.invitations(ProfileId::new(1)).await.unwrap();

        assert_eq!(lookup.directory().page_calls.load(Ordering::SeqCst), 1);
        assert!(lookup.cache().has("invitations:1"));
    }

    #[tokio::test]
    async fn test_found_user_is_cached_but_missing_user_is_not() {
        let lookup = lookup(ScriptedDirectory {
            users: vec![Profile {
                id: 7,
                profile_id: Some(ProfileId::new(42)),
                username: Some("alice".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        });

        let found = lookup.user(ProfileId::new(42)).await.unwrap();
        assert_eq!(found.unwrap().username.as_deref(), Some("alice"));
        lookup.user(ProfileId::new(42)).await.unwrap();
        assert_eq!(lookup.directory().user_calls.load(Ordering::SeqCst), 1);
        assert!(lookup.cache().has("user-v2:42"));

        assert!(lookup.user(ProfileId::new(99)).await.unwrap().is_none());
        assert!(lookup.user(ProfileId::new(99)).await.unwrap().is_none());
        assert_eq!(lookup.directory().user_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_search_is_keyed_by_query_and_limit() {
        let lookup = lookup(ScriptedDirectory::default());

        lookup.search("alice", 10).await.unwrap();
        lookup.search("alice", 10).await.unwrap();
        lookup.search("alice", 5).await.unwrap();

        assert_eq!(lookup.directory().search_calls.load(Ordering::SeqCst), 2);
        assert!(lookup.cache().has("search:alice:10"));
        assert!(lookup.cache().has("search:alice:5"));
    }
}
