//! invitegraph-server: Request handlers and configuration
//!
//! This crate sits between the HTTP layer and the domain:
//! - Search, enhanced profile, invitation and network handlers
//! - Recent search storage (memory or JSON file)
//! - Layered configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             invitegraph-server              │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  handlers/   - Request handlers             │
//! │    search.rs      - User search             │
//! │    profile.rs     - Enhanced profile        │
//! │    invitations.rs - Invitation lists        │
//! │    network.rs     - Invitation graphs       │
//! │    recent.rs      - Recent searches         │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod handlers;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
