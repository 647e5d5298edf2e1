//! Invitation network handler.

use std::sync::Arc;

use invitegraph_domain::cache::{cache_key, CacheCategory, ResponseCache};
use invitegraph_domain::directory::ProfileDirectory;
use invitegraph_domain::model::ProfileId;
use invitegraph_domain::network::{NetworkBuilder, NetworkGraph};
use invitegraph_domain::DomainResult;
use tracing::{debug, info, warn};

/// Handler for building invitation networks.
///
/// Whole graphs are memoized under `network:<id>:<depth>` on top of the
/// per-profile caching the builder already does. A graph truncated by a
/// failed lookup is returned but not memoized.
pub struct NetworkHandler<D> {
    builder: NetworkBuilder<D>,
    cache: Arc<ResponseCache>,
    default_depth: u32,
    max_depth: u32,
}

impl<D: ProfileDirectory> NetworkHandler<D> {
    pub fn new(
        builder: NetworkBuilder<D>,
        cache: Arc<ResponseCache>,
        default_depth: u32,
        max_depth: u32,
    ) -> Self {
        Self {
            builder,
            cache,
            default_depth: default_depth.min(max_depth),
            max_depth,
        }
    }

    /// Interprets the raw `depth` query parameter.
    ///
    /// Absent or non-integer values use the default. Negative values clamp to
    /// 0 and values above the configured maximum clamp to it.
    pub fn resolve_depth(&self, raw: Option<&str>) -> u32 {
        match raw.and_then(|d| d.trim().parse::<i64>().ok()) {
            None => self.default_depth,
            Some(d) if d < 0 => 0,
            Some(d) => u32::try_from(d).map_or(self.max_depth, |d| d.min(self.max_depth)),
        }
    }

    /// Returns the invitation graph rooted at `root`, at most `depth` hops deep.
    pub async fn build_network(&self, root: ProfileId, depth: u32) -> DomainResult<NetworkGraph> {
        let depth = depth.min(self.max_depth);
        let key = cache_key("network", [root.get(), u64::from(depth)]);
        if let Some(graph) = self.cache.get_as::<NetworkGraph>(&key) {
            debug!(%key, "Network cache hit");
            return Ok(graph);
        }

        let build = self.builder.build_with_outcome(root, depth).await;
        if build.is_complete() {
            self.cache.set_as(key, &build.graph, CacheCategory::Network)?;
        } else {
            warn!(
                profile_id = %root,
                depth,
                failed_lookups = build.failed_lookups,
                "Network truncated by failed lookups, not caching"
            );
        }
        let graph = build.graph;

        info!(
            profile_id = %root,
            depth,
            nodes = graph.total_nodes,
            edges = graph.edges.len(),
            "Network ready"
        );
        Ok(graph)
    }
}
