use async_trait::async_trait;
use reach_payout::{CustomPayout, PayoutTerms};

use crate::models::{
    Influencer, InfluencerChanges, NewInfluencer, NewOffer, Offer, OfferChanges, Page,
};
use crate::CoreResult;

/// Repository trait for offers, their base payouts and custom payouts
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Insert the offer, its base payout and overrides as one unit
    async fn create_offer(&self, offer: &NewOffer) -> CoreResult<Offer>;

    async fn get_offer_with_payout(&self, id: i64) -> CoreResult<Option<Offer>>;

    /// Offers ordered by id, optionally filtered by a case-insensitive title
    /// substring. The count ignores `page`.
    async fn list_offers(
        &self,
        title_filter: Option<&str>,
        page: Page,
    ) -> CoreResult<(Vec<Offer>, i64)>;

    async fn update_offer(&self, id: i64, changes: &OfferChanges) -> CoreResult<Option<Offer>>;

    async fn delete_offer(&self, id: i64) -> CoreResult<bool>;

    async fn get_custom_payout(
        &self,
        offer_id: i64,
        influencer_id: i64,
    ) -> CoreResult<Option<CustomPayout>>;

    /// Create or replace the single custom payout of an (offer, influencer) pair
    async fn upsert_custom_payout(
        &self,
        offer_id: i64,
        influencer_id: i64,
        terms: &PayoutTerms,
    ) -> CoreResult<CustomPayout>;

    async fn delete_custom_payout(&self, offer_id: i64, influencer_id: i64) -> CoreResult<bool>;
}

/// Repository trait for influencer data access
#[async_trait]
pub trait InfluencerRepository: Send + Sync {
    async fn create_influencer(&self, influencer: &NewInfluencer) -> CoreResult<Influencer>;

    async fn get_influencer(&self, id: i64) -> CoreResult<Option<Influencer>>;

    async fn get_influencer_by_email(&self, email: &str) -> CoreResult<Option<Influencer>>;

    async fn list_influencers(&self, page: Page) -> CoreResult<Vec<Influencer>>;

    async fn update_influencer(
        &self,
        id: i64,
        changes: &InfluencerChanges,
    ) -> CoreResult<Option<Influencer>>;

    async fn delete_influencer(&self, id: i64) -> CoreResult<bool>;

    async fn influencer_exists(&self, id: i64) -> CoreResult<bool> {
        Ok(self.get_influencer(id).await?.is_some())
    }
}
