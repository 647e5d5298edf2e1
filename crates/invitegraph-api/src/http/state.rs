//! Application state for HTTP handlers.

use std::sync::Arc;

use invitegraph_domain::cache::ResponseCache;
use invitegraph_domain::lookup::CachedLookup;
use invitegraph_domain::network::NetworkBuilder;
use invitegraph_server::handlers::{
    InvitationsHandler, MemoryRecentSearchStore, NetworkHandler, ProfileHandler,
    RecentSearchStore, SearchHandler,
};
use invitegraph_server::ServerConfig;
use invitegraph_upstream::UpstreamClient;

use crate::adapters::UpstreamDirectory;

/// Directory type the handlers read through.
pub type Directory<U> = UpstreamDirectory<U>;

/// Application state shared across all HTTP handlers.
///
/// Every handler reads upstream through one [`CachedLookup`], so all of them
/// share the response cache the process entry point constructed.
///
/// # Type Parameters
///
/// * `U` - The upstream client implementing `UpstreamClient`
pub struct AppState<U: UpstreamClient> {
    /// The shared response cache.
    pub cache: Arc<ResponseCache>,
    pub search: SearchHandler<Directory<U>>,
    pub profile: ProfileHandler<Directory<U>>,
    pub invitations: InvitationsHandler<Directory<U>>,
    pub network: NetworkHandler<Directory<U>>,
    /// Recent search storage.
    pub recent: Arc<dyn RecentSearchStore>,
}

impl<U: UpstreamClient> AppState<U> {
    /// Creates state with default configuration and in-memory recent searches.
    pub fn new(client: Arc<U>) -> Self {
        let config = ServerConfig::default();
        let cache = Arc::new(ResponseCache::new(config.cache_config()));
        let recent = Arc::new(MemoryRecentSearchStore::new(config.recent_search_limits()));
        Self::with_config(client, cache, recent, &config)
    }

    /// Creates state from configuration with an explicitly constructed cache
    /// and recent search store.
    pub fn with_config(
        client: Arc<U>,
        cache: Arc<ResponseCache>,
        recent: Arc<dyn RecentSearchStore>,
        config: &ServerConfig,
    ) -> Self {
        let directory = Arc::new(UpstreamDirectory::new(client));
        let lookup = CachedLookup::new(directory, Arc::clone(&cache))
            .with_page_size(config.network.page_size);

        let builder = NetworkBuilder::with_config(lookup.clone(), config.network_config());
        let network = NetworkHandler::new(
            builder,
            Arc::clone(&cache),
            config.network.default_depth,
            config.network.max_depth,
        );

        Self {
            search: SearchHandler::new(lookup.clone()),
            profile: ProfileHandler::new(lookup.clone()),
            invitations: InvitationsHandler::new(lookup),
            network,
            cache,
            recent,
        }
    }
}
