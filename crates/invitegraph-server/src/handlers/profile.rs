//! Enhanced profile handler.
//!
//! Merges three upstream lookups into one [`EnhancedProfile`]:
//!
//! 1. the legacy profile record (required, carries `invitedBy`)
//! 2. the current user record (optional, falls back to a legacy-only actor)
//! 3. the inviter's user record (optional, `null` on any failure)

use chrono::{TimeZone, Utc};
use invitegraph_domain::directory::ProfileDirectory;
use invitegraph_domain::lookup::CachedLookup;
use invitegraph_domain::model::{LegacyProfile, Profile, ProfileId, ProfileLinks, ProfileStats};
use invitegraph_domain::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Address reported for actors; upstream does not expose one here.
const UNKNOWN_ADDRESS: &str = "unknown";

/// Legacy profile details shown when no current user record exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    pub invites_available: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A profile rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub userkey: String,
    pub avatar: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub description: Option<String>,
    pub score: i64,
    pub score_xp_multiplier: u32,
    pub profile_id: ProfileId,
    pub primary_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_streak_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userkeys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ProfileLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ProfileStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_info: Option<ProfileInfo>,
}

impl Actor {
    /// Builds the actor for a current user record.
    ///
    /// `fallback_id` is used when the record does not carry a profile id.
    fn from_user(user: &Profile, fallback_id: ProfileId, extended: bool) -> Self {
        let profile_id = user.profile_id.unwrap_or(fallback_id);
        let mut actor = Self {
            userkey: profile_id.userkey(),
            avatar: user.avatar_url.clone(),
            name: user.display_name.clone(),
            username: user.username.clone(),
            description: user.description.clone(),
            score: user.score.unwrap_or(0),
            score_xp_multiplier: 1,
            profile_id,
            primary_address: UNKNOWN_ADDRESS.to_string(),
            status: None,
            xp_total: None,
            xp_streak_days: None,
            userkeys: None,
            links: None,
            stats: None,
            profile_info: None,
        };
        if extended {
            actor.status = user.status.clone();
            actor.xp_total = user.xp_total;
            actor.xp_streak_days = user.xp_streak_days;
            actor.userkeys = user.userkeys.clone();
            actor.links = user.links.clone();
            actor.stats = user.stats.clone();
        }
        actor
    }

    /// Builds a placeholder actor from the legacy record alone.
    fn from_legacy(legacy: &LegacyProfile) -> Self {
        let userkey = legacy.id.userkey();
        Self {
            userkeys: Some(vec![userkey.clone()]),
            userkey,
            avatar: None,
            name: Some(format!("Profile {}", legacy.id)),
            username: None,
            description: Some(format!("Created {}", format_created(legacy.created_at))),
            score: 0,
            score_xp_multiplier: 1,
            profile_id: legacy.id,
            primary_address: UNKNOWN_ADDRESS.to_string(),
            status: Some(if legacy.archived { "ARCHIVED" } else { "ACTIVE" }.to_string()),
            xp_total: None,
            xp_streak_days: None,
            links: None,
            stats: None,
            profile_info: Some(ProfileInfo {
                invites_available: legacy.invites_available,
                created_at: legacy.created_at,
                updated_at: legacy.updated_at,
            }),
        }
    }
}

/// Formats epoch seconds as `M/D/YYYY` in UTC.
fn format_created(epoch_secs: i64) -> String {
    match Utc.timestamp_opt(epoch_secs, 0).single() {
        Some(at) => at.format("%-m/%-d/%Y").to_string(),
        None => epoch_secs.to_string(),
    }
}

/// The combined legacy and current view of one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedProfile {
    pub id: ProfileId,
    pub archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub invites_available: i64,
    pub invited_by: Option<ProfileId>,
    pub actor: Actor,
    pub inviter_actor: Option<Actor>,
}

/// Handler for the enhanced profile view.
pub struct ProfileHandler<D> {
    lookup: CachedLookup<D>,
}

impl<D: ProfileDirectory> ProfileHandler<D> {
    pub fn new(lookup: CachedLookup<D>) -> Self {
        Self { lookup }
    }

    /// Returns the enhanced profile for `id`.
    ///
    /// # Errors
    ///
    /// - [`DomainError::ProfileNotFound`] if upstream has no legacy record.
    /// - The legacy lookup's error if it fails.
    /// - The user lookup's error if it fails without an upstream status.
    pub async fn enhanced_profile(&self, id: ProfileId) -> DomainResult<EnhancedProfile> {
        let legacy = self
            .lookup
            .legacy_profile(id)
            .await?
            .ok_or(DomainError::ProfileNotFound {
                profile_id: id.get(),
            })?;

        let actor = match self.lookup.user(id).await {
            Ok(Some(user)) => Actor::from_user(&user, legacy.id, true),
            Ok(None) => {
                debug!(profile_id = %id, "No current user record, using legacy actor");
                Actor::from_legacy(&legacy)
            }
            Err(err) if err.upstream_status().is_some() => {
                warn!(profile_id = %id, error = %err, "User lookup failed, using legacy actor");
                Actor::from_legacy(&legacy)
            }
            Err(err) => return Err(err),
        };

        let inviter_actor = match legacy.invited_by {
            Some(inviter) => self.inviter_actor(inviter).await,
            None => None,
        };

        Ok(EnhancedProfile {
            id: legacy.id,
            archived: legacy.archived,
            created_at: legacy.created_at,
            updated_at: legacy.updated_at,
            invites_available: legacy.invites_available,
            invited_by: legacy.invited_by,
            actor,
            inviter_actor,
        })
    }

    async fn inviter_actor(&self, inviter: ProfileId) -> Option<Actor> {
        match self.lookup.user(inviter).await {
            Ok(user) => user.map(|u| Actor::from_user(&u, inviter, false)),
            Err(err) => {
                warn!(inviter = %inviter, error = %err, "Could not fetch inviter");
                None
            }
        }
    }
}
