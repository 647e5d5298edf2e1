//! invitegraph-api: HTTP API layer
//!
//! This crate provides the API layer including:
//! - HTTP REST endpoints via Axum
//! - The adapter from the upstream client to the domain directory
//! - Middleware (request IDs, logging, metrics, CORS)
//! - Logging and Prometheus setup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              invitegraph-api                │
//! ├─────────────────────────────────────────────┤
//! │  http/          - REST endpoints            │
//! │  adapters       - Upstream -> domain        │
//! │  middleware/    - Request ID, logs, metrics │
//! │  observability/ - Logging, Prometheus       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod http;
pub mod middleware;
pub mod observability;
pub mod utils;
