use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use reach_payout::{BasePayout, CustomPayout, PayoutTerms};
use tokio::sync::RwLock;

use crate::models::{
    Influencer, InfluencerChanges, NewInfluencer, NewOffer, Offer, OfferChanges, Page,
};
use crate::repository::{InfluencerRepository, OfferRepository};
use crate::{CoreError, CoreResult};

#[derive(Default)]
struct MemoryState {
    last_offer_id: i64,
    last_payout_id: i64,
    last_custom_payout_id: i64,
    last_influencer_id: i64,
    offers: BTreeMap<i64, Offer>,
    // keyed by (offer_id, influencer_id)
    custom_payouts: BTreeMap<(i64, i64), CustomPayout>,
    influencers: BTreeMap<i64, Influencer>,
}

/// Map-backed store implementing both repositories.
///
/// Deletes cascade the same way the relational schema does.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn window<T: Clone>(items: Vec<&T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl OfferRepository for InMemoryStore {
    async fn create_offer(&self, offer: &NewOffer) -> CoreResult<Offer> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        state.last_offer_id += 1;
        state.last_payout_id += 1;

        let created = Offer {
            id: state.last_offer_id,
            title: offer.title.clone(),
            description: offer.description.clone(),
            categories: offer.categories.clone(),
            payout: BasePayout {
                id: state.last_payout_id,
                terms: offer.payout,
                country_overrides: offer.country_overrides.clone(),
                created_at: now,
                updated_at: now,
            },
            created_at: now,
            updated_at: now,
        };

        state.offers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_offer_with_payout(&self, id: i64) -> CoreResult<Option<Offer>> {
        Ok(self.state.read().await.offers.get(&id).cloned())
    }

    async fn list_offers(
        &self,
        title_filter: Option<&str>,
        page: Page,
    ) -> CoreResult<(Vec<Offer>, i64)> {
        let state = self.state.read().await;
        let needle = title_filter.map(str::to_lowercase);

        let matching: Vec<&Offer> = state
            .offers
            .values()
            .filter(|offer| match &needle {
                Some(needle) => offer.title.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        let total = matching.len() as i64;
        Ok((window(matching, page), total))
    }

    async fn update_offer(&self, id: i64, changes: &OfferChanges) -> CoreResult<Option<Offer>> {
        let mut state = self.state.write().await;
        let Some(offer) = state.offers.get_mut(&id) else {
            return Ok(None);
        };
        let now = Utc::now();

        if let Some(title) = &changes.title {
            offer.title = title.clone();
        }
        if let Some(description) = &changes.description {
            offer.description = description.clone();
        }
        if let Some(categories) = &changes.categories {
            offer.categories = categories.clone();
        }
        if changes.payout.is_some() || changes.country_overrides.is_some() {
            if let Some(terms) = changes.payout {
                offer.payout.terms = terms;
            }
            if let Some(overrides) = &changes.country_overrides {
                offer.payout.country_overrides = overrides.clone();
            }
            offer.payout.updated_at = now;
        }
        offer.updated_at = now;

        Ok(Some(offer.clone()))
    }

    async fn delete_offer(&self, id: i64) -> CoreResult<bool> {
        let mut state = self.state.write().await;
        if state.offers.remove(&id).is_none() {
            return Ok(false);
        }
        state.custom_payouts.retain(|(offer_id, _), _| *offer_id != id);
        Ok(true)
    }

    async fn get_custom_payout(
        &self,
        offer_id: i64,
        influencer_id: i64,
    ) -> CoreResult<Option<CustomPayout>> {
        let state = self.state.read().await;
        Ok(state.custom_payouts.get(&(offer_id, influencer_id)).cloned())
    }

    async fn upsert_custom_payout(
        &self,
        offer_id: i64,
        influencer_id: i64,
        terms: &PayoutTerms,
    ) -> CoreResult<CustomPayout> {
        let mut state = self.state.write().await;

        // foreign keys
        if !state.offers.contains_key(&offer_id) {
            return Err(CoreError::not_found("Offer", offer_id));
        }
        if !state.influencers.contains_key(&influencer_id) {
            return Err(CoreError::not_found("Influencer", influencer_id));
        }

        let now = Utc::now();
        let key = (offer_id, influencer_id);

        let payout = match state.custom_payouts.get(&key).cloned() {
            Some(existing) => CustomPayout {
                terms: *terms,
                updated_at: now,
                ..existing
            },
            None => {
                state.last_custom_payout_id += 1;
                CustomPayout {
                    id: state.last_custom_payout_id,
                    offer_id,
                    influencer_id,
                    terms: *terms,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        state.custom_payouts.insert(key, payout.clone());
        Ok(payout)
    }

    async fn delete_custom_payout(&self, offer_id: i64, influencer_id: i64) -> CoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.custom_payouts.remove(&(offer_id, influencer_id)).is_some())
    }
}

#[async_trait]
impl InfluencerRepository for InMemoryStore {
    async fn create_influencer(&self, influencer: &NewInfluencer) -> CoreResult<Influencer> {
        let mut state = self.state.write().await;

        if state.influencers.values().any(|i| i.email == influencer.email) {
            return Err(CoreError::Conflict(format!(
                "Influencer with email {} already exists",
                influencer.email
            )));
        }

        let now = Utc::now();
        state.last_influencer_id += 1;
        let created = Influencer {
            id: state.last_influencer_id,
            name: influencer.name.clone(),
            email: influencer.email.clone(),
            created_at: now,
            updated_at: now,
        };

        state.influencers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_influencer(&self, id: i64) -> CoreResult<Option<Influencer>> {
        Ok(self.state.read().await.influencers.get(&id).cloned())
    }

    async fn get_influencer_by_email(&self, email: &str) -> CoreResult<Option<Influencer>> {
        let state = self.state.read().await;
        Ok(state.influencers.values().find(|i| i.email == email).cloned())
    }

    async fn list_influencers(&self, page: Page) -> CoreResult<Vec<Influencer>> {
        let state = self.state.read().await;
        Ok(window(state.influencers.values().collect(), page))
    }

    async fn update_influencer(
        &self,
        id: i64,
        changes: &InfluencerChanges,
    ) -> CoreResult<Option<Influencer>> {
        let mut state = self.state.write().await;

        if let Some(email) = &changes.email {
            if state.influencers.values().any(|i| i.id != id && &i.email == email) {
                return Err(CoreError::Conflict(format!(
                    "Influencer with email {} already exists",
                    email
                )));
            }
        }

        let Some(influencer) = state.influencers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            influencer.name = name.clone();
        }
        if let Some(email) = &changes.email {
            influencer.email = email.clone();
        }
        influencer.updated_at = Utc::now();

        Ok(Some(influencer.clone()))
    }

    async fn delete_influencer(&self, id: i64) -> CoreResult<bool> {
        let mut state = self.state.write().await;
        if state.influencers.remove(&id).is_none() {
            return Ok(false);
        }
        state.custom_payouts.retain(|(_, influencer_id), _| *influencer_id != id);
        Ok(true)
    }
}
