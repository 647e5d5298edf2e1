//! Invitation network builder.
//!
//! Walks the "who invited whom" relation outward from a root profile and
//! returns the reachable subgraph up to a hop limit.
//!
//! # Traversal
//!
//! The walk is an explicit worklist of `(profile, level, parent)` items
//! rather than recursion, so graph depth never grows the call stack.
//!
//! - The edge `parent -> item` is recorded when an item is taken off the
//!   worklist, before the visited check. A profile reached a second time
//!   still contributes its edge.
//! - Each profile becomes a node exactly once, at the level of its first
//!   visit. With [`TraversalOrder::DepthFirst`] (the default) this is the
//!   first path found depth-first, not necessarily the shortest.
//!   [`TraversalOrder::BreadthFirst`] yields shortest hop distances.
//! - Nodes at the hop limit are not expanded, so every edge target is a
//!   node in the graph.
//! - Lookups are sequential within one build.
//!
//! # Errors
//!
//! Lookup failures never fail the build. The failing node stays in the graph
//! without children and a warning is logged.
//! [`NetworkBuilder::build_with_outcome`] also reports how many lookups
//! failed, so callers can avoid memoizing a truncated graph.

mod builder;
mod config;
mod types;

#[cfg(test)]
mod tests;

pub use builder::{register_network_metrics, NetworkBuilder};
pub use config::{NetworkConfig, TraversalOrder};
pub use types::{EdgeKind, NetworkBuild, NetworkEdge, NetworkGraph, NetworkNode};
