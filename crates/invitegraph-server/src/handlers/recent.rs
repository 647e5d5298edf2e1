//! Recent search storage.
//!
//! A bounded, most-recent-first list of profiles users have looked up,
//! deduplicated by profile id. Two backends are provided:
//!
//! - [`MemoryRecentSearchStore`] keeps the list for the life of the process.
//! - [`FileRecentSearchStore`] persists it as a JSON array on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use invitegraph_domain::model::Profile;
use invitegraph_domain::validation::validate_recent_search;
use invitegraph_domain::{DomainError, DomainResult};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Entries kept in storage.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Entries returned for display.
pub const DEFAULT_DISPLAY_COUNT: usize = 3;

/// Storage for the recent search list.
#[async_trait]
pub trait RecentSearchStore: Send + Sync {
    /// Returns the most recent entries, newest first.
    async fn list(&self) -> DomainResult<Vec<Profile>>;

    /// Moves `profile` to the front of the list and returns the new length.
    async fn record(&self, profile: Profile) -> DomainResult<usize>;
}

/// Size limits shared by the store implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentSearchLimits {
    pub max_entries: usize,
    pub display_count: usize,
}

impl Default for RecentSearchLimits {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            display_count: DEFAULT_DISPLAY_COUNT,
        }
    }
}

impl RecentSearchLimits {
    pub fn new(max_entries: usize, display_count: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            max_entries,
            display_count: display_count.min(max_entries),
        }
    }
}

/// Prepends `profile`, drops its older occurrence and truncates.
fn push_front(
    entries: &mut Vec<Profile>,
    profile: Profile,
    limits: RecentSearchLimits,
) -> DomainResult<usize> {
    let profile_id = validate_recent_search(&profile)?;
    entries.retain(|p| p.profile_id != Some(profile_id));
    debug!(
        profile_id = %profile_id,
        label = profile.label().unwrap_or_default(),
        "Recording recent search"
    );
    entries.insert(0, profile);
    entries.truncate(limits.max_entries);
    Ok(entries.len())
}

fn top(entries: &[Profile], limits: RecentSearchLimits) -> Vec<Profile> {
    entries.iter().take(limits.display_count).cloned().collect()
}

fn storage_error(err: impl std::fmt::Display) -> DomainError {
    DomainError::RecentSearchStorage {
        message: err.to_string(),
    }
}

/// Process-local recent search list.
#[derive(Debug, Default)]
pub struct MemoryRecentSearchStore {
    entries: RwLock<Vec<Profile>>,
    limits: RecentSearchLimits,
}

impl MemoryRecentSearchStore {
    pub fn new(limits: RecentSearchLimits) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            limits,
        }
    }
}

#[async_trait]
impl RecentSearchStore for MemoryRecentSearchStore {
    async fn list(&self) -> DomainResult<Vec<Profile>> {
        Ok(top(&self.entries.read().await, self.limits))
    }

    async fn record(&self, profile: Profile) -> DomainResult<usize> {
        let mut entries = self.entries.write().await;
        push_front(&mut entries, profile, self.limits)
    }
}

/// Recent search list persisted to a JSON file.
///
/// A missing file reads as an empty list. Writes replace the file through a
/// temporary sibling so a crash never leaves a truncated list behind.
#[derive(Debug)]
pub struct FileRecentSearchStore {
    path: PathBuf,
    limits: RecentSearchLimits,
    write_lock: Mutex<()>,
}

impl FileRecentSearchStore {
    pub fn new(path: impl Into<PathBuf>, limits: RecentSearchLimits) -> Self {
        Self {
            path: path.into(),
            limits,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> DomainResult<Vec<Profile>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(storage_error),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(storage_error(err)),
        }
    }

    async fn save(&self, entries: &[Profile]) -> DomainResult<()> {
        let bytes = serde_json::to_vec(entries).map_err(storage_error)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(storage_error)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(storage_error)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(storage_error)
    }
}

#[async_trait]
impl RecentSearchStore for FileRecentSearchStore {
    async fn list(&self) -> DomainResult<Vec<Profile>> {
        Ok(top(&self.load().await?, self.limits))
    }

    async fn record(&self, profile: Profile) -> DomainResult<usize> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        let count = push_front(&mut entries, profile, self.limits)?;
        self.save(&entries).await?;
        Ok(count)
    }
}
