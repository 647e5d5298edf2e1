//! Wire types for the upstream REST API.
//!
//! Decoding is lenient: missing fields fall back to defaults so that upstream
//! additions or omissions do not break the service. Nested objects the
//! service only passes through (`links`, `stats`, `createdAt`) are kept as raw
//! JSON.

use serde::{Deserialize, Serialize};

/// A current ("v2") user record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireUser {
    pub id: u64,
    pub profile_id: Option<u64>,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
    pub score: Option<i64>,
    pub status: Option<String>,
    pub userkeys: Option<Vec<String>>,
    pub xp_total: Option<i64>,
    pub xp_streak_days: Option<i64>,
    pub links: Option<serde_json::Value>,
    pub stats: Option<serde_json::Value>,
}

/// Response of `GET /users/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireSearchResponse {
    pub values: Vec<WireUser>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// A legacy ("v1") profile record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireLegacyProfile {
    pub id: u64,
    pub archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub invites_available: i64,
    pub invited_by: Option<u64>,
}

/// One page of legacy profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireProfilesPage {
    pub values: Vec<WireLegacyProfile>,
    pub limit: u64,
    pub offset: u64,
    pub total: u64,
}

/// Response envelope of `POST /profiles`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireProfilesEnvelope {
    pub ok: bool,
    pub data: WireProfilesPage,
}

impl WireProfilesEnvelope {
    /// Wraps profiles in a successful envelope.
    pub fn found(values: Vec<WireLegacyProfile>, limit: u64, offset: u64) -> Self {
        Self {
            ok: true,
            data: WireProfilesPage {
                total: values.len() as u64,
                values,
                limit,
                offset,
            },
        }
    }

    /// Returns the first profile when upstream reported success.
    pub fn into_first(self) -> Option<WireLegacyProfile> {
        if !self.ok {
            return None;
        }
        self.data.values.into_iter().next()
    }
}

/// The invited side of an invitation activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireActivitySubject {
    pub userkey: Option<String>,
    pub profile_id: Option<u64>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub score: Option<i64>,
}

/// An activity from `GET /activities/userkey`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireActivity {
    pub id: u64,
    /// Epoch number or date string, as upstream sent it.
    pub created_at: Option<serde_json::Value>,
    pub subject: Option<WireActivitySubject>,
}

/// Body of `POST /users/by/profile-id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsersByProfileIdRequest<'a> {
    pub profile_ids: &'a [u64],
}

/// Body of `POST /profiles`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProfilesRequest<'a> {
    pub ids: &'a [u64],
    pub limit: u32,
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_decodes_with_missing_fields() {
        let user: WireUser = serde_json::from_value(json!({
            "id": 9,
            "profileId": 42,
            "username": "alice",
            "unknownField": true
        }))
        .unwrap();

        assert_eq!(user.profile_id, Some(42));
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.score, None);
        assert_eq!(user.links, None);
    }

    #[test]
    fn test_activity_keeps_created_at_verbatim() {
        let activity: WireActivity = serde_json::from_value(json!({
            "id": 3,
            "createdAt": "2024-01-15T10:30:00Z",
            "subject": {"userkey": "profileId:43", "profileId": 43}
        }))
        .unwrap();

        assert_eq!(activity.created_at, Some(json!("2024-01-15T10:30:00Z")));
        assert_eq!(activity.subject.unwrap().profile_id, Some(43));
    }

    #[test]
    fn test_envelope_without_ok_yields_nothing() {
        let envelope: WireProfilesEnvelope = serde_json::from_value(json!({
            "ok": false,
            "data": {"values": [{"id": 1}]}
        }))
        .unwrap();
        assert_eq!(envelope.into_first(), None);

        let envelope: WireProfilesEnvelope =
            serde_json::from_value(json!({"ok": true, "data": {"values": []}})).unwrap();
        assert_eq!(envelope.into_first(), None);
    }

    #[test]
    fn test_request_bodies_use_upstream_field_names() {
        let ids = [42u64];
        assert_eq!(
            serde_json::to_value(UsersByProfileIdRequest { profile_ids: &ids }).unwrap(),
            json!({"profileIds": [42]})
        );
        assert_eq!(
            serde_json::to_value(ProfilesRequest {
                ids: &ids,
                limit: 1,
                offset: 0
            })
            .unwrap(),
            json!({"ids": [42], "limit": 1, "offset": 0})
        );
    }
}
