//! Core type definitions for profiles, invitations and search results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A numeric profile identifier on the upstream network.
///
/// Serialized as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(u64);

impl ProfileId {
    /// Creates a profile id from its numeric value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the upstream userkey for this profile (`profileId:<id>`).
    pub fn userkey(self) -> String {
        format!("profileId:{}", self.0)
    }

    /// Returns the graph node identifier for this profile (`profile_<id>`).
    pub fn node_id(self) -> String {
        format!("profile_{}", self.0)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProfileId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ProfileId {
    type Err = DomainError;

    /// Parses a decimal profile id. Signs, whitespace and fractions are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidProfileId {
                value: s.to_string(),
            });
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| DomainError::InvalidProfileId {
                value: s.to_string(),
            })
    }
}

/// Links published for a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_breakdown: Option<String>,
}

/// Review counts received by a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewCounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive: Option<u64>,
}

/// Received reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<ReviewCounts>,
}

/// Aggregate vouch totals in one direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VouchTotals {
    /// Total staked amount in wei, kept as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_wei_total: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Vouches given and received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VouchStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<VouchTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<VouchTotals>,
}

/// Extended profile statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vouch: Option<VouchStats>,
}

/// The current user record for a profile.
///
/// An immutable snapshot: it is fetched on demand and only cached transiently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Upstream user id (distinct from the profile id).
    pub id: u64,
    #[serde(default)]
    pub profile_id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userkeys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_streak_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ProfileLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ProfileStats>,
}

impl Profile {
    /// Returns the best human-readable label: username, then display name.
    pub fn label(&self) -> Option<&str> {
        self.username.as_deref().or(self.display_name.as_deref())
    }
}

/// The legacy profile record, which carries the `invitedBy` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProfile {
    pub id: ProfileId,
    pub archived: bool,
    /// Creation time in epoch seconds.
    pub created_at: i64,
    /// Last update time in epoch seconds.
    pub updated_at: i64,
    pub invites_available: i64,
    pub invited_by: Option<ProfileId>,
}

/// An upstream timestamp, passed through in whichever form upstream used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityTimestamp {
    Epoch(i64),
    Text(String),
}

/// The invited side of an invitation activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

/// A fact asserted by upstream: the author invited `invitee` at `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationActivity {
    pub activity_id: u64,
    pub created_at: Option<ActivityTimestamp>,
    pub invitee: Option<Invitee>,
}

impl InvitationActivity {
    /// Returns the invitee's profile id when upstream resolved one.
    pub fn invitee_id(&self) -> Option<ProfileId> {
        self.invitee.as_ref().and_then(|i| i.profile_id)
    }
}

/// A page of user search results, in upstream's shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub values: Vec<Profile>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}
