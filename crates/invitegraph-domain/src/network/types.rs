//! Graph types returned by the network builder.

use serde::{Deserialize, Serialize};

use crate::model::{Profile, ProfileId};

/// One profile in the invitation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
    /// Graph identifier, `profile_<id>`.
    pub id: String,
    pub profile_id: ProfileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    /// Hop distance from the root at first visit.
    pub level: u32,
}

impl NetworkNode {
    /// Builds a node, copying display details from the user record when present.
    pub fn new(profile_id: ProfileId, level: u32, details: Option<&Profile>) -> Self {
        Self {
            id: profile_id.node_id(),
            profile_id,
            username: details.and_then(|p| p.username.clone()),
            display_name: details.and_then(|p| p.display_name.clone()),
            avatar_url: details.and_then(|p| p.avatar_url.clone()),
            score: details.and_then(|p| p.score),
            level,
        }
    }
}

/// Relationship carried by an edge. Only invitations exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Invitation,
}

/// A directed `inviter -> invitee` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl NetworkEdge {
    pub fn invitation(inviter: ProfileId, invitee: ProfileId) -> Self {
        Self {
            source: inviter.node_id(),
            target: invitee.node_id(),
            kind: EdgeKind::Invitation,
        }
    }
}

/// The invitation graph rooted at one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkGraph {
    /// Nodes in first-visit order.
    pub nodes: Vec<NetworkNode>,
    /// Edges in discovery order.
    pub edges: Vec<NetworkEdge>,
    pub root_profile_id: ProfileId,
    pub total_nodes: usize,
    /// Largest `level` among the nodes.
    pub max_depth: u32,
}

impl NetworkGraph {
    pub(crate) fn assemble(
        root: ProfileId,
        nodes: Vec<NetworkNode>,
        edges: Vec<NetworkEdge>,
    ) -> Self {
        let max_depth = nodes.iter().map(|n| n.level).max().unwrap_or(0);
        Self {
            total_nodes: nodes.len(),
            nodes,
            edges,
            root_profile_id: root,
            max_depth,
        }
    }

    /// Returns the node for `profile_id`, if it is in the graph.
    pub fn node(&self, profile_id: ProfileId) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.profile_id == profile_id)
    }
}

/// A built graph together with how many lookups failed while building it.
#[derive(Debug, Clone)]
pub struct NetworkBuild {
    pub graph: NetworkGraph,
    /// Profile and invitation lookups that errored. Their nodes were kept
    /// without children.
    pub failed_lookups: usize,
}

impl NetworkBuild {
    /// Returns whether every lookup succeeded, so the graph is not truncated
    /// by an upstream failure.
    pub fn is_complete(&self) -> bool {
        self.failed_lookups == 0
    }
}
