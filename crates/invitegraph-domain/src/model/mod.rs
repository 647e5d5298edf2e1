//! Domain model for the upstream reputation network.
//!
//! These types are internal to the service. The upstream wire format lives in
//! `invitegraph-upstream`; the API layer converts wire records into these.

mod types;

pub use types::*;
