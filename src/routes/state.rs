use std::sync::Arc;

use crate::{
    db::{InMemoryMarketplaceStore, MarketplaceStore},
    services::Pipeline,
};

/// Shared application state
///
/// Everything here is read-only; each request builds its own workflow state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn MarketplaceStore>,
    pub seller_fetch_limit: usize,
}

impl AppState {
    pub fn new(
        pipeline: Pipeline,
        store: Arc<dyn MarketplaceStore>,
        seller_fetch_limit: usize,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            store,
            seller_fetch_limit,
        }
    }

    /// State serving the built-in sample catalog
    pub fn with_sample_data(pipeline: Pipeline) -> Self {
        Self::new(
            pipeline,
            Arc::new(InMemoryMarketplaceStore::with_sample_data()),
            crate::db::DEFAULT_SELLER_FETCH_LIMIT,
        )
    }
}
