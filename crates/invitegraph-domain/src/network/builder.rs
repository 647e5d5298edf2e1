//! Worklist traversal of the invitation graph.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use super::config::{NetworkConfig, TraversalOrder};
use super::types::{NetworkBuild, NetworkEdge, NetworkGraph, NetworkNode};
use crate::directory::ProfileDirectory;
use crate::lookup::CachedLookup;
use crate::model::ProfileId;

/// A pending visit: `id` reached at `level` from `parent`.
#[derive(Debug, Clone, Copy)]
struct Visit {
    id: ProfileId,
    level: u32,
    parent: Option<ProfileId>,
}

/// Builds the invitation graph rooted at a profile.
///
/// Lookups go through the shared [`CachedLookup`], so overlapping subtrees
/// across requests hit the cache instead of upstream.
pub struct NetworkBuilder<D> {
    lookup: CachedLookup<D>,
    config: NetworkConfig,
}

impl<D: ProfileDirectory> NetworkBuilder<D> {
    pub fn new(lookup: CachedLookup<D>) -> Self {
        Self::with_config(lookup, NetworkConfig::default())
    }

    pub fn with_config(lookup: CachedLookup<D>, config: NetworkConfig) -> Self {
        Self { lookup, config }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Traverses from `root` down to `max_depth` hops (inclusive).
    ///
    /// Never fails: a profile or invitation lookup failure is logged and the
    /// affected node is kept but not expanded. The root is always present and
    /// every edge endpoint is a node in the result.
    pub async fn build(&self, root: ProfileId, max_depth: u32) -> NetworkGraph {
        self.build_with_outcome(root, max_depth).await.graph
    }

    /// Like [`build`](Self::build), also counting the lookups that failed.
    pub async fn build_with_outcome(&self, root: ProfileId, max_depth: u32) -> NetworkBuild {
        let mut worklist = VecDeque::new();
        worklist.push_back(Visit {
            id: root,
            level: 0,
            parent: None,
        });

        let mut visited = HashSet::new();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut failed_lookups = 0usize;

        while let Some(visit) = self.next(&mut worklist) {
            if let Some(parent) = visit.parent {
                edges.push(NetworkEdge::invitation(parent, visit.id));
            }

            if visit.level > max_depth || !visited.insert(visit.id) {
                continue;
            }

            debug!(profile_id = %visit.id, level = visit.level, "Processing profile");

            let details = match self.lookup.user(visit.id).await {
                Ok(details) => details,
                Err(e) => {
                    warn!(profile_id = %visit.id, error = %e, "Profile lookup failed, node not expanded");
                    failed_lookups += 1;
                    nodes.push(NetworkNode::new(visit.id, visit.level, None));
                    continue;
                }
            };
            nodes.push(NetworkNode::new(visit.id, visit.level, details.as_ref()));

            if visit.level >= max_depth {
                continue;
            }

            let activities = match self.lookup.invitations(visit.id).await {
                Ok(activities) => activities,
                Err(e) => {
                    warn!(profile_id = %visit.id, error = %e, "Invitation lookup failed, node not expanded");
                    failed_lookups += 1;
                    continue;
                }
            };

            let children: Vec<Visit> = activities
                .iter()
                .filter_map(|activity| activity.invitee_id())
                .map(|invitee| Visit {
                    id: invitee,
                    level: visit.level + 1,
                    parent: Some(visit.id),
                })
                .collect();

            debug!(profile_id = %visit.id, invited = children.len(), "Expanded profile");

            match self.config.traversal {
                // Reversed so the first child is popped first.
                TraversalOrder::DepthFirst => worklist.extend(children.into_iter().rev()),
                TraversalOrder::BreadthFirst => worklist.extend(children),
            }
        }

        let graph = NetworkGraph::assemble(root, nodes, edges);

        metrics::histogram!("invitegraph_network_nodes").record(graph.total_nodes as f64);
        info!(
            root = %root,
            nodes = graph.total_nodes,
            edges = graph.edges.len(),
            depth = graph.max_depth,
            failed_lookups,
            "Network graph built"
        );

        NetworkBuild {
            graph,
            failed_lookups,
        }
    }

    fn next(&self, worklist: &mut VecDeque<Visit>) -> Option<Visit> {
        match self.config.traversal {
            TraversalOrder::DepthFirst => worklist.pop_back(),
            TraversalOrder::BreadthFirst => worklist.pop_front(),
        }
    }
}

/// Registers network builder metric descriptions.
pub fn register_network_metrics() {
    metrics::describe_histogram!(
        "invitegraph_network_nodes",
        "Number of nodes in each built network graph"
    );
}
