//! Invitation list handler.

use invitegraph_domain::directory::ProfileDirectory;
use invitegraph_domain::lookup::CachedLookup;
use invitegraph_domain::model::{ActivityTimestamp, InvitationActivity, ProfileId};
use invitegraph_domain::DomainResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The profile whose invitations were listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviterRef {
    pub profile_id: ProfileId,
    pub userkey: String,
}

/// One invited user, as recorded on the invitation activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitedUser {
    pub userkey: String,
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
    pub invited_at: Option<ActivityTimestamp>,
    pub activity_id: u64,
}

impl InvitedUser {
    /// Returns `None` for activities without an invitee userkey.
    fn from_activity(activity: &InvitationActivity) -> Option<Self> {
        let invitee = activity.invitee.as_ref()?;
        let userkey = invitee.userkey.clone()?;
        Some(Self {
            userkey,
            profile_id: invitee.profile_id,
            username: invitee.username.clone(),
            display_name: invitee.display_name.clone(),
            avatar_url: invitee.avatar_url.clone(),
            score: invitee.score,
            invited_at: activity.created_at.clone(),
            activity_id: activity.activity_id,
        })
    }
}

/// Everyone a profile has invited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationList {
    pub inviter: InviterRef,
    pub invited_users: Vec<InvitedUser>,
    pub total: usize,
}

/// Handler for listing a profile's invitations.
pub struct InvitationsHandler<D> {
    lookup: CachedLookup<D>,
}

impl<D: ProfileDirectory> InvitationsHandler<D> {
    pub fn new(lookup: CachedLookup<D>) -> Self {
        Self { lookup }
    }

    /// Lists the users `inviter` invited, across all upstream pages.
    pub async fn list_invitations(&self, inviter: ProfileId) -> DomainResult<InvitationList> {
        let activities = self.lookup.invitations(inviter).await?;
        let invited_users: Vec<InvitedUser> = activities
            .iter()
            .filter_map(InvitedUser::from_activity)
            .collect();

        debug!(
            profile_id = %inviter,
            activities = activities.len(),
            invited = invited_users.len(),
            "Listed invitations"
        );

        Ok(InvitationList {
            inviter: InviterRef {
                profile_id: inviter,
                userkey: inviter.userkey(),
            },
            total: invited_users.len(),
            invited_users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{lookup_with, FakeDirectory};
    use invitegraph_domain::model::Invitee;
    use serde_json::json;

    fn invitee(id: u64) -> Invitee {
        Invitee {
            userkey: Some(format!("profileId:{id}")),
            profile_id: Some(ProfileId::new(id)),
            username: Some(format!("user{id}")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lists_invitees_with_userkeys_only() {
        let directory = FakeDirectory::new();
        directory.add_invitation(42, invitee(43));
        directory.add_invitation(42, Invitee::default());
        directory.add_invitation(42, invitee(44));
        directory.add_invitation(7, invitee(99));

        let list = InvitationsHandler::new(lookup_with(directory))
            .list_invitations(ProfileId::new(42))
            .await
            .unwrap();

        assert_eq!(list.inviter.userkey, "profileId:42");
        assert_eq!(list.total, 2);
        let ids: Vec<_> = list.invited_users.iter().map(|u| u.profile_id).collect();
        assert_eq!(ids, vec![Some(ProfileId::new(43)), Some(ProfileId::new(44))]);
        assert_eq!(list.invited_users[1].activity_id, 3);
    }

    #[tokio::test]
    async fn test_status_error_propagates() {
        let directory = FakeDirectory::new();
        directory.fail_invitations(502);

        let err = InvitationsHandler::new(lookup_with(directory))
            .list_invitations(ProfileId::new(42))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Activities API error: 502");
    }

    #[tokio::test]
    async fn test_serialized_shape() {
        let directory = FakeDirectory::new();
        directory.add_invitation(42, invitee(43));

        let list = InvitationsHandler::new(lookup_with(directory))
            .list_invitations(ProfileId::new(42))
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&list).unwrap(),
            json!({
                "inviter": {"profileId": 42, "userkey": "profileId:42"},
                "invitedUsers": [{
                    "userkey": "profileId:43",
                    "profileId": 43,
                    "username": "user43",
                    "invitedAt": 1_700_000_001,
                    "activityId": 1
                }],
                "total": 1
            })
        );
    }
}
