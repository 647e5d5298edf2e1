//! Tests for the network builder.
//!
//! Organized by functionality:
//! - Depth bounds and node levels
//! - Edge recording
//! - Failure handling
//! - Traversal order
//! - Graph invariants (property-based)

mod mocks;
