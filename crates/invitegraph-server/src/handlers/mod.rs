//! Request handlers.
//!
//! Each handler owns the domain services it needs and returns domain types;
//! HTTP status mapping happens in the API layer.

pub mod invitations;
pub mod network;
pub mod profile;
pub mod recent;
pub mod search;

pub use invitations::{InvitationList, InvitationsHandler, InvitedUser, InviterRef};
pub use network::NetworkHandler;
pub use profile::{Actor, EnhancedProfile, ProfileHandler, ProfileInfo};
pub use recent::{
    FileRecentSearchStore, MemoryRecentSearchStore, RecentSearchLimits, RecentSearchStore,
};
pub use search::{SearchHandler, SEARCH_LIMIT};

#[cfg(test)]
pub(crate) mod test_support;
