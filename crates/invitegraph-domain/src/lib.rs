//! invitegraph-domain: Core logic for the invitation graph service
//!
//! This crate contains:
//! - The profile and invitation model
//! - The TTL response cache shared by all lookups
//! - Cache-wrapped upstream lookups, including invitation pagination
//! - The network builder that walks "who invited whom"
//! - Input validation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             invitegraph-domain              │
//! ├─────────────────────────────────────────────┤
//! │  model/      - Profiles, invitations        │
//! │  cache/      - TTL response cache           │
//! │  directory   - Upstream lookup trait        │
//! │  lookup      - Cached lookups               │
//! │  network/    - Graph builder                │
//! │  validation/ - Input validation             │
//! └─────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod directory;
pub mod error;
pub mod lookup;
pub mod model;
pub mod network;
pub mod validation;

// Re-export commonly used types at the crate root
pub use cache::{CacheCategory, CacheConfig, CacheStats, ResponseCache};
pub use directory::ProfileDirectory;
pub use error::{DomainError, DomainResult};
pub use lookup::CachedLookup;
pub use network::{NetworkBuilder, NetworkConfig, NetworkGraph, TraversalOrder};
