use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use reach_core::models::{InfluencerDraft, InfluencerPatch};
use reach_core::{Influencer, Page};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListInfluencersQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/influencers", get(list_influencers).post(create_influencer))
        .route(
            "/influencers/{influencer_id}",
            get(get_influencer)
                .put(update_influencer)
                .delete(delete_influencer),
        )
}

/// POST /api/v1/influencers
async fn create_influencer(
    State(state): State<AppState>,
    Json(draft): Json<InfluencerDraft>,
) -> Result<(StatusCode, Json<Influencer>), AppError> {
    let influencer = state.influencers.create_influencer(draft).await?;
    Ok((StatusCode::CREATED, Json(influencer)))
}

/// GET /api/v1/influencers
async fn list_influencers(
    State(state): State<AppState>,
    Query(query): Query<ListInfluencersQuery>,
) -> Result<Json<Vec<Influencer>>, AppError> {
    let page = Page::new(query.skip, query.limit, state.page_limits)?;
    Ok(Json(state.influencers.list_influencers(page).await?))
}

async fn get_influencer(
    State(state): State<AppState>,
    Path(influencer_id): Path<i64>,
) -> Result<Json<Influencer>, AppError> {
    Ok(Json(state.influencers.get_influencer(influencer_id).await?))
}

async fn update_influencer(
    State(state): State<AppState>,
    Path(influencer_id): Path<i64>,
    Json(patch): Json<InfluencerPatch>,
) -> Result<Json<Influencer>, AppError> {
    let influencer = state
        .influencers
        .update_influencer(influencer_id, patch)
        .await?;
    Ok(Json(influencer))
}

async fn delete_influencer(
    State(state): State<AppState>,
    Path(influencer_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.influencers.delete_influencer(influencer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
