//! User search handler.

use invitegraph_domain::directory::ProfileDirectory;
use invitegraph_domain::lookup::CachedLookup;
use invitegraph_domain::model::SearchResults;
use invitegraph_domain::validation::validate_search_query;
use invitegraph_domain::DomainResult;
use tracing::debug;

/// Number of results requested from upstream per search.
pub const SEARCH_LIMIT: u32 = 10;

/// Handler for free-text user search.
pub struct SearchHandler<D> {
    lookup: CachedLookup<D>,
}

impl<D: ProfileDirectory> SearchHandler<D> {
    pub fn new(lookup: CachedLookup<D>) -> Self {
        Self { lookup }
    }

    /// Validates the query and returns upstream's results, cached per query.
    pub async fn search(&self, query: Option<&str>) -> DomainResult<SearchResults> {
        let query = validate_search_query(query)?;
        let results = self.lookup.search(query, SEARCH_LIMIT).await?;
        debug!(
            query,
            found = results.values.len(),
            total = results.total,
            "User search completed"
        );
        Ok(results)
    }
}
