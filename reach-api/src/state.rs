use std::sync::Arc;

use reach_core::memory::InMemoryStore;
use reach_core::{InfluencerRepository, InfluencerService, OfferRepository, OfferService, PageLimits};

#[derive(Clone)]
pub struct AppState {
    pub offers: OfferService,
    pub influencers: InfluencerService,
    pub page_limits: PageLimits,
    /// Empty allows any origin
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(
        offer_repo: Arc<dyn OfferRepository>,
        influencer_repo: Arc<dyn InfluencerRepository>,
        page_limits: PageLimits,
        cors_origins: Vec<String>,
    ) -> Self {
        Self {
            offers: OfferService::new(offer_repo, influencer_repo.clone()),
            influencers: InfluencerService::new(influencer_repo),
            page_limits,
            cors_origins,
        }
    }

    /// State backed by a fresh [`InMemoryStore`]
    pub fn in_memory(page_limits: PageLimits) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store, page_limits, Vec::new())
    }
}
