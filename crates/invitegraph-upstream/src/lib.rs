//! invitegraph-upstream: Client for the upstream reputation network
//!
//! This crate provides access to the upstream REST API, including:
//! - UpstreamClient trait for the calls the service makes
//! - Lenient wire types for requests and responses
//! - HTTP implementation backed by reqwest
//! - In-memory implementation for testing and local runs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             invitegraph-upstream            │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs - UpstreamClient trait           │
//! │  wire.rs   - Request/response types         │
//! │  http.rs   - reqwest implementation         │
//! │  memory.rs - In-memory implementation       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;
pub mod wire;

// Re-export commonly used types
pub use error::{UpstreamError, UpstreamResult};
pub use http::{register_upstream_metrics, HttpUpstreamClient, HttpUpstreamConfig};
pub use memory::MemoryUpstream;
pub use traits::{Endpoint, UpstreamClient};
