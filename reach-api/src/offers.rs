use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reach_core::models::{
    InfluencerOffer, InfluencerOfferPage, OfferDraft, OfferPage, OfferPatch,
};
use reach_core::{Offer, Page};
use reach_payout::{CustomPayout, PayoutFields, PayoutType};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListOffersQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub title: Option<String>,
}

impl ListOffersQuery {
    fn page(&self, state: &AppState) -> Result<Page, AppError> {
        Ok(Page::new(self.skip, self.limit, state.page_limits)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomPayoutRequest {
    pub influencer_id: i64,
    pub payout_type: PayoutType,
    #[serde(default)]
    pub cpa_amount: Option<f64>,
    #[serde(default)]
    pub fixed_amount: Option<f64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/offers", get(list_offers).post(create_offer))
        .route(
            "/offers/{offer_id}",
            get(get_offer).put(update_offer).delete(delete_offer),
        )
        .route(
            "/offers/influencer/{influencer_id}",
            get(list_offers_for_influencer),
        )
        .route(
            "/offers/{offer_id}/influencer/{influencer_id}",
            get(get_offer_for_influencer),
        )
        .route("/offers/{offer_id}/custom-payouts", post(set_custom_payout))
        .route(
            "/offers/{offer_id}/custom-payouts/{influencer_id}",
            get(get_custom_payout).delete(delete_custom_payout),
        )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/offers
async fn create_offer(
    State(state): State<AppState>,
    Json(draft): Json<OfferDraft>,
) -> Result<(StatusCode, Json<Offer>), AppError> {
    let offer = state.offers.create_offer(draft).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

/// GET /api/v1/offers
async fn list_offers(
    State(state): State<AppState>,
    Query(query): Query<ListOffersQuery>,
) -> Result<Json<OfferPage>, AppError> {
    let page = query.page(&state)?;
    let offers = state
        .offers
        .list_offers(query.title.as_deref(), page)
        .await?;
    Ok(Json(offers))
}

/// GET /api/v1/offers/{offer_id}
async fn get_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<i64>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(state.offers.get_offer(offer_id).await?))
}

/// PUT /api/v1/offers/{offer_id}
async fn update_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<i64>,
    Json(patch): Json<OfferPatch>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(state.offers.update_offer(offer_id, patch).await?))
}

/// DELETE /api/v1/offers/{offer_id}
async fn delete_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.offers.delete_offer(offer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/offers/influencer/{influencer_id}
/// Offers with the payout each influencer would actually get
async fn list_offers_for_influencer(
    State(state): State<AppState>,
    Path(influencer_id): Path<i64>,
    Query(query): Query<ListOffersQuery>,
) -> Result<Json<InfluencerOfferPage>, AppError> {
    let page = query.page(&state)?;
    let offers = state
        .offers
        .list_offers_for_influencer(influencer_id, query.title.as_deref(), page)
        .await?;
    Ok(Json(offers))
}

/// GET /api/v1/offers/{offer_id}/influencer/{influencer_id}
async fn get_offer_for_influencer(
    State(state): State<AppState>,
    Path((offer_id, influencer_id)): Path<(i64, i64)>,
) -> Result<Json<InfluencerOffer>, AppError> {
    let offer = state
        .offers
        .offer_for_influencer(offer_id, influencer_id)
        .await?;
    Ok(Json(offer))
}

/// POST /api/v1/offers/{offer_id}/custom-payouts
async fn set_custom_payout(
    State(state): State<AppState>,
    Path(offer_id): Path<i64>,
    Json(req): Json<CustomPayoutRequest>,
) -> Result<(StatusCode, Json<CustomPayout>), AppError> {
    let fields = PayoutFields {
        payout_type: req.payout_type,
        cpa_amount: req.cpa_amount,
        fixed_amount: req.fixed_amount,
    };
    let payout = state
        .offers
        .set_custom_payout(offer_id, req.influencer_id, fields)
        .await?;
    Ok((StatusCode::CREATED, Json(payout)))
}

/// GET /api/v1/offers/{offer_id}/custom-payouts/{influencer_id}
async fn get_custom_payout(
    State(state): State<AppState>,
    Path((offer_id, influencer_id)): Path<(i64, i64)>,
) -> Result<Json<CustomPayout>, AppError> {
    let payout = state
        .offers
        .get_custom_payout(offer_id, influencer_id)
        .await?;
    Ok(Json(payout))
}

/// DELETE /api/v1/offers/{offer_id}/custom-payouts/{influencer_id}
async fn delete_custom_payout(
    State(state): State<AppState>,
    Path((offer_id, influencer_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    state
        .offers
        .remove_custom_payout(offer_id, influencer_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
