//! Search controller: directory lookups with last-query-wins ordering.

use crate::cache::DirectoryCache;
use crate::error::Result;
use crate::model::SearchQuery;
use crate::transport::Transport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to a submitted query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results were published to the cache
    Applied { sequence: u64, results: usize },
    /// A newer query was issued before this one returned
    Superseded { sequence: u64 },
}

pub struct SearchController<T> {
    transport: Arc<T>,
    cache: Arc<DirectoryCache>,
    issued: AtomicU64,
}

impl<T: Transport> SearchController<T> {
    pub fn new(transport: Arc<T>, cache: Arc<DirectoryCache>) -> Self {
        Self {
            transport,
            cache,
            issued: AtomicU64::new(0),
        }
    }

    /// Sequence number of the most recently issued query
    pub fn latest(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Issue a lookup. Only the newest query's response reaches the cache;
    /// older ones are dropped on arrival, not aborted.
    pub async fn submit(&self, query: SearchQuery) -> Result<SearchOutcome> {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Search #{} q={:?} category={:?}", sequence, query.text, query.category);

        let response = self.transport.search(&query).await;

        if self.latest() != sequence {
            debug!("Discarding superseded search #{}", sequence);
            return Ok(SearchOutcome::Superseded { sequence });
        }

        let results = match response {
            Ok(results) => results,
            Err(e) => {
                warn!("Error performing search: {}", e);
                return Err(e);
            }
        };

        // the service compares categories case-sensitively
        let results: Vec<_> = results
            .into_iter()
            .filter(|record| query.category.matches(record.category))
            .collect();

        let count = results.len();
        self.cache.replace_search_results(results);
        info!("Search #{} returned {} files", sequence, count);

        Ok(SearchOutcome::Applied { sequence, results: count })
    }

    /// Empty text, every category: populates the network view at startup
    pub async fn initial(&self) -> Result<SearchOutcome> {
        self.submit(SearchQuery::everything()).await
    }
}
