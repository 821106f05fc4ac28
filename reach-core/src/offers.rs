use std::sync::Arc;

use reach_payout::{
    resolve, validate_overrides, validate_payout, CustomPayout, PayoutFields, PayoutPresenter,
    PayoutSummary,
};
use tracing::{debug, info, warn};

use crate::models::{
    CategorySet, InfluencerOffer, InfluencerOfferPage, NewOffer, Offer, OfferChanges, OfferDraft,
    OfferPage, OfferPatch, Page,
};
use crate::repository::{InfluencerRepository, OfferRepository};
use crate::{CoreError, CoreResult};

const MAX_TITLE_CHARS: usize = 255;

fn validate_title(title: &str) -> CoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CoreError::validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: &str) -> CoreResult<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(CoreError::validation("description must not be empty"));
    }
    Ok(description.to_string())
}

fn title_filter(title: Option<&str>) -> Option<&str> {
    title.map(str::trim).filter(|t| !t.is_empty())
}

/// Offer use cases, including the payout views of individual influencers
#[derive(Clone)]
pub struct OfferService {
    offers: Arc<dyn OfferRepository>,
    influencers: Arc<dyn InfluencerRepository>,
}

impl OfferService {
    pub fn new(offers: Arc<dyn OfferRepository>, influencers: Arc<dyn InfluencerRepository>) -> Self {
        Self {
            offers,
            influencers,
        }
    }

    pub async fn create_offer(&self, draft: OfferDraft) -> CoreResult<Offer> {
        debug!("Validating payout for new offer: {}", draft.title);
        let new_offer = NewOffer {
            title: validate_title(&draft.title)?,
            description: validate_description(&draft.description)?,
            categories: CategorySet::non_empty(draft.categories)?,
            payout: validate_payout(draft.payout.fields())?,
            country_overrides: validate_overrides(draft.payout.country_overrides)?,
        };

        let offer = self.offers.create_offer(&new_offer).await?;
        info!("Offer created: id={}, title={}", offer.id, offer.title);
        Ok(offer)
    }

    pub async fn get_offer(&self, id: i64) -> CoreResult<Offer> {
        self.offers
            .get_offer_with_payout(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Offer", id))
    }

    pub async fn list_offers(&self, title: Option<&str>, page: Page) -> CoreResult<OfferPage> {
        let (offers, total) = self.offers.list_offers(title_filter(title), page).await?;
        Ok(OfferPage { offers, total })
    }

    /// Apply a partial update.
    ///
    /// Payout fields are merged onto the stored payout first and the merged
    /// result is validated, so a partial update can never leave amounts that
    /// contradict the payout type.
    ///
    /// The read and the write are separate store calls. Concurrent updates of
    /// the same offer are applied in last-write order: each stored payout is
    /// valid on its own, but a later write may replace fields merged by an
    /// earlier one.
    pub async fn update_offer(&self, id: i64, patch: OfferPatch) -> CoreResult<Offer> {
        let existing = self.get_offer(id).await?;

        let mut changes = OfferChanges {
            title: patch.title.as_deref().map(validate_title).transpose()?,
            description: patch
                .description
                .as_deref()
                .map(validate_description)
                .transpose()?,
            categories: patch.categories.map(CategorySet::non_empty).transpose()?,
            ..OfferChanges::default()
        };

        if let Some(payout) = patch.payout {
            let merged = payout.merge_onto(&existing.payout.terms);
            debug!(
                "Validating merged payout for offer {}: {:?}",
                id, merged
            );
            changes.payout = Some(validate_payout(merged)?);
            changes.country_overrides = payout
                .country_overrides
                .map(validate_overrides)
                .transpose()?;
        }

        let offer = self
            .offers
            .update_offer(id, &changes)
            .await?
            .ok_or_else(|| CoreError::not_found("Offer", id))?;
        info!("Offer updated: id={}", offer.id);
        Ok(offer)
    }

    pub async fn delete_offer(&self, id: i64) -> CoreResult<()> {
        if !self.offers.delete_offer(id).await? {
            return Err(CoreError::not_found("Offer", id));
        }
        info!("Offer deleted: id={}", id);
        Ok(())
    }

    pub async fn set_custom_payout(
        &self,
        offer_id: i64,
        influencer_id: i64,
        fields: PayoutFields,
    ) -> CoreResult<CustomPayout> {
        self.get_offer(offer_id).await?;
        if !self.influencers.influencer_exists(influencer_id).await? {
            return Err(CoreError::not_found("Influencer", influencer_id));
        }

        let terms = validate_payout(fields)?;
        let payout = self
            .offers
            .upsert_custom_payout(offer_id, influencer_id, &terms)
            .await?;
        info!(
            "Custom payout set: offer={}, influencer={}, type={}",
            offer_id,
            influencer_id,
            terms.payout_type()
        );
        Ok(payout)
    }

    pub async fn get_custom_payout(
        &self,
        offer_id: i64,
        influencer_id: i64,
    ) -> CoreResult<CustomPayout> {
        self.offers
            .get_custom_payout(offer_id, influencer_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "Custom payout for offer {} and influencer {}",
                    offer_id, influencer_id
                ))
            })
    }

    pub async fn remove_custom_payout(&self, offer_id: i64, influencer_id: i64) -> CoreResult<()> {
        if !self
            .offers
            .delete_custom_payout(offer_id, influencer_id)
            .await?
        {
            return Err(CoreError::NotFound(format!(
                "Custom payout for offer {} and influencer {}",
                offer_id, influencer_id
            )));
        }
        info!(
            "Custom payout removed: offer={}, influencer={}",
            offer_id, influencer_id
        );
        Ok(())
    }

    /// Payout of `offer` as seen by one influencer
    pub async fn resolve_and_present(
        &self,
        offer: &Offer,
        influencer_id: i64,
    ) -> CoreResult<PayoutSummary> {
        let custom = self
            .offers
            .get_custom_payout(offer.id, influencer_id)
            .await?;
        let effective = resolve(&offer.payout, custom.as_ref());
        Ok(PayoutPresenter::present(&effective))
    }

    async fn to_influencer_offer(
        &self,
        offer: Offer,
        influencer_id: i64,
    ) -> CoreResult<InfluencerOffer> {
        let payout_info = self.resolve_and_present(&offer, influencer_id).await?;
        Ok(InfluencerOffer {
            id: offer.id,
            title: offer.title,
            description: offer.description,
            categories: offer.categories,
            payout_info,
            created_at: offer.created_at,
            updated_at: offer.updated_at,
        })
    }

    pub async fn offer_for_influencer(
        &self,
        offer_id: i64,
        influencer_id: i64,
    ) -> CoreResult<InfluencerOffer> {
        if !self.influencers.influencer_exists(influencer_id).await? {
            return Err(CoreError::not_found("Influencer", influencer_id));
        }
        let offer = self.get_offer(offer_id).await?;
        self.to_influencer_offer(offer, influencer_id).await
    }

    /// Offers with payouts resolved for one influencer.
    ///
    /// An unknown influencer gets an empty listing rather than an error.
    pub async fn list_offers_for_influencer(
        &self,
        influencer_id: i64,
        title: Option<&str>,
        page: Page,
    ) -> CoreResult<InfluencerOfferPage> {
        if !self.influencers.influencer_exists(influencer_id).await? {
            warn!("Influencer not found: {}", influencer_id);
            return Ok(InfluencerOfferPage::empty());
        }

        let (offers, total) = self.offers.list_offers(title_filter(title), page).await?;
        debug!(
            "Resolving payouts of {} offers for influencer {}",
            offers.len(),
            influencer_id
        );

        let mut items = Vec::with_capacity(offers.len());
        for offer in offers {
            items.push(self.to_influencer_offer(offer, influencer_id).await?);
        }

        Ok(InfluencerOfferPage {
            offers: items,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::models::{InfluencerDraft, PayoutDraft, PayoutPatch};
    use crate::{Category, InfluencerService};
    use reach_payout::{CountryOverride, PayoutTerms, PayoutType};

    fn services() -> (OfferService, InfluencerService) {
        let store = Arc::new(InMemoryStore::new());
        (
            OfferService::new(store.clone(), store.clone()),
            InfluencerService::new(store),
        )
    }

    fn cpa_draft(title: &str, cpa: f64, overrides: Vec<CountryOverride>) -> OfferDraft {
        OfferDraft {
            title: title.to_string(),
            description: "Promote our gaming platform".to_string(),
            categories: vec![Category::Gaming, Category::Tech],
            payout: PayoutDraft {
                payout_type: PayoutType::Cpa,
                cpa_amount: Some(cpa),
                fixed_amount: None,
                country_overrides: overrides,
            },
        }
    }

    fn fixed(amount: f64) -> PayoutFields {
        PayoutFields {
            payout_type: PayoutType::Fixed,
            cpa_amount: None,
            fixed_amount: Some(amount),
        }
    }

    async fn influencer(influencers: &InfluencerService, name: &str) -> i64 {
        influencers
            .create_influencer(InfluencerDraft {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_offer_round_trips_categories() {
        let (offers, _) = services();
        let created = offers
            .create_offer(cpa_draft("Gaming Offer", 20.0, vec![]))
            .await
            .unwrap();

        let fetched = offers.get_offer(created.id).await.unwrap();
        assert_eq!(fetched.categories.len(), 2);
        assert!(fetched.categories.contains(Category::Gaming));
        assert!(fetched.categories.contains(Category::Tech));
    }

    #[tokio::test]
    async fn test_create_offer_rejects_invalid_payout() {
        let (offers, _) = services();
        let mut draft = cpa_draft("Invalid", 20.0, vec![]);
        draft.payout.cpa_amount = None;

        let err = offers.create_offer(draft).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(msg) if msg == "CPA payout requires a valid cpa_amount"));
    }

    #[tokio::test]
    async fn test_create_offer_rejects_missing_categories() {
        let (offers, _) = services();
        let mut draft = cpa_draft("No categories", 20.0, vec![]);
        draft.categories.clear();

        assert!(matches!(
            offers.create_offer(draft).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_scenario_base_payout_with_overrides() {
        let (offers, influencers) = services();
        let bob = influencer(&influencers, "Bob").await;
        let offer = offers
            .create_offer(cpa_draft(
                "Gaming Platform",
                20.0,
                vec![CountryOverride::new("DE", 30.0), CountryOverride::new("US", 25.0)],
            ))
            .await
            .unwrap();

        let summary = offers.resolve_and_present(&offer, bob).await.unwrap();

        assert_eq!(summary.display_text, "$20.00 - $30.00 CPA");
        assert_eq!(summary.min_amount, 20.0);
        assert_eq!(summary.max_amount, 30.0);
        assert!(!summary.is_custom);
    }

    #[tokio::test]
    async fn test_scenario_custom_payout_for_alice() {
        let (offers, influencers) = services();
        let alice = influencer(&influencers, "Alice").await;
        let offer = offers
            .create_offer(cpa_draft(
                "Gaming Platform",
                20.0,
                vec![CountryOverride::new("DE", 30.0), CountryOverride::new("US", 25.0)],
            ))
            .await
            .unwrap();

        offers
            .set_custom_payout(offer.id, alice, fixed(2000.0))
            .await
            .unwrap();
        let summary = offers.resolve_and_present(&offer, alice).await.unwrap();

        assert_eq!(summary.label, "Fixed");
        assert_eq!(summary.display_text, "$2000.00 Fixed");
        assert_eq!(summary.min_amount, 2000.0);
        assert_eq!(summary.max_amount, 2000.0);
        assert!(summary.is_custom);
    }

    #[tokio::test]
    async fn test_custom_cpa_payout_suppresses_overrides() {
        let (offers, influencers) = services();
        let carol = influencer(&influencers, "Carol").await;
        let offer = offers
            .create_offer(cpa_draft(
                "Gaming Platform",
                20.0,
                vec![CountryOverride::new("DE", 30.0)],
            ))
            .await
            .unwrap();

        let custom = PayoutFields {
            payout_type: PayoutType::Cpa,
            cpa_amount: Some(22.0),
            fixed_amount: None,
        };
        offers.set_custom_payout(offer.id, carol, custom).await.unwrap();

        let summary = offers.resolve_and_present(&offer, carol).await.unwrap();
        assert_eq!(summary.display_text, "$22.00 CPA");
        assert_eq!(summary.min_amount, 22.0);
        assert_eq!(summary.max_amount, 22.0);
    }

    #[tokio::test]
    async fn test_set_custom_payout_requires_known_parties() {
        let (offers, influencers) = services();
        let alice = influencer(&influencers, "Alice").await;
        let offer = offers
            .create_offer(cpa_draft("Offer", 20.0, vec![]))
            .await
            .unwrap();

        assert!(matches!(
            offers.set_custom_payout(offer.id, 999, fixed(10.0)).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            offers.set_custom_payout(999, alice, fixed(10.0)).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            offers
                .set_custom_payout(
                    offer.id,
                    alice,
                    PayoutFields {
                        payout_type: PayoutType::Fixed,
                        cpa_amount: Some(1.0),
                        fixed_amount: Some(10.0),
                    }
                )
                .await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_merges_before_validating() {
        let (offers, _) = services();
        let offer = offers
            .create_offer(cpa_draft("Offer", 10.0, vec![]))
            .await
            .unwrap();

        // Switching to FIXED while the stored cpa_amount survives the merge
        let patch = OfferPatch {
            payout: Some(PayoutPatch {
                payout_type: Some(PayoutType::Fixed),
                fixed_amount: Some(Some(100.0)),
                ..PayoutPatch::default()
            }),
            ..OfferPatch::default()
        };
        let err = offers.update_offer(offer.id, patch).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(msg) if msg == "Fixed payout should not have cpa_amount"));

        // Clearing it explicitly makes the switch valid
        let patch = OfferPatch {
            payout: Some(PayoutPatch {
                payout_type: Some(PayoutType::Fixed),
                cpa_amount: Some(None),
                fixed_amount: Some(Some(100.0)),
                ..PayoutPatch::default()
            }),
            ..OfferPatch::default()
        };
        let updated = offers.update_offer(offer.id, patch).await.unwrap();
        assert_eq!(updated.payout.terms, PayoutTerms::Fixed { fixed: 100.0 });
    }

    #[tokio::test]
    async fn test_later_update_merges_onto_latest_write() {
        let (offers, _) = services();
        let offer = offers
            .create_offer(cpa_draft("Offer", 10.0, vec![]))
            .await
            .unwrap();

        let to_fixed = OfferPatch {
            payout: Some(PayoutPatch {
                payout_type: Some(PayoutType::Fixed),
                cpa_amount: Some(None),
                fixed_amount: Some(Some(100.0)),
                ..PayoutPatch::default()
            }),
            ..OfferPatch::default()
        };
        offers.update_offer(offer.id, to_fixed).await.unwrap();

        // Written against the original CPA terms, now merged onto FIXED
        let raise_cpa = OfferPatch {
            payout: Some(PayoutPatch {
                cpa_amount: Some(Some(12.0)),
                ..PayoutPatch::default()
            }),
            ..OfferPatch::default()
        };
        let err = offers.update_offer(offer.id, raise_cpa).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let stored = offers.get_offer(offer.id).await.unwrap();
        assert_eq!(stored.payout.terms, PayoutTerms::Fixed { fixed: 100.0 });
    }

    #[tokio::test]
    async fn test_update_partial_fields_and_replace_overrides() {
        let (offers, _) = services();
        let offer = offers
            .create_offer(cpa_draft(
                "Original Title",
                20.0,
                vec![CountryOverride::new("DE", 30.0), CountryOverride::new("US", 25.0)],
            ))
            .await
            .unwrap();

        let patch = OfferPatch {
            title: Some("Updated Title".to_string()),
            payout: Some(PayoutPatch {
                country_overrides: Some(vec![CountryOverride::new("gb", 21.0)]),
                ..PayoutPatch::default()
            }),
            ..OfferPatch::default()
        };
        let updated = offers.update_offer(offer.id, patch).await.unwrap();

        assert_eq!(updated.title, "Updated Title");
        assert_eq!(updated.description, offer.description);
        assert_eq!(updated.payout.terms, PayoutTerms::Cpa { cpa: 20.0 });
        assert_eq!(
            updated.payout.country_overrides,
            vec![CountryOverride::new("GB", 21.0)]
        );
    }

    #[tokio::test]
    async fn test_update_unknown_offer_is_not_found() {
        let (offers, _) = services();
        let patch = OfferPatch {
            title: Some("x".to_string()),
            ..OfferPatch::default()
        };

        assert!(matches!(
            offers.update_offer(42, patch).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_for_unknown_influencer_is_empty() {
        let (offers, _) = services();
        offers
            .create_offer(cpa_draft("Offer", 20.0, vec![]))
            .await
            .unwrap();

        let page = offers
            .list_offers_for_influencer(404, None, Page::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.offers.is_empty());
    }

    #[tokio::test]
    async fn test_list_for_influencer_filters_by_title() {
        let (offers, influencers) = services();
        let bob = influencer(&influencers, "Bob").await;
        for title in ["Gaming Platform", "Fashion Brand", "Gaming Console"] {
            offers
                .create_offer(cpa_draft(title, 10.0, vec![]))
                .await
                .unwrap();
        }

        let page = offers
            .list_offers_for_influencer(bob, Some("gaming"), Page::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert!(page.offers.iter().all(|o| o.title.contains("Gaming")));
        assert!(page.offers.iter().all(|o| o.payout_info.display_text == "$10.00 CPA"));
    }

    #[tokio::test]
    async fn test_delete_offer() {
        let (offers, _) = services();
        let offer = offers
            .create_offer(cpa_draft("To Delete", 10.0, vec![]))
            .await
            .unwrap();

        offers.delete_offer(offer.id).await.unwrap();
        assert!(matches!(
            offers.get_offer(offer.id).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            offers.delete_offer(offer.id).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
