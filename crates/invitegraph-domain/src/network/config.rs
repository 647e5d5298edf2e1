//! Configuration for the network builder.

use serde::{Deserialize, Serialize};

/// Order in which the worklist is drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    /// Depth-first, first visit wins. A node reachable by several paths keeps
    /// the level of whichever path reached it first.
    #[default]
    DepthFirst,
    /// Breadth-first. Every node gets its shortest hop distance from the root.
    BreadthFirst,
}

/// Configuration for the network builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub traversal: TraversalOrder,
}

impl NetworkConfig {
    pub fn with_traversal(mut self, traversal: TraversalOrder) -> Self {
        self.traversal = traversal;
        self
    }
}
