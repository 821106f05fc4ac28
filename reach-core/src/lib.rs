pub mod models;
pub mod repository;
pub mod offers;
pub mod influencers;
pub mod memory;

pub use models::{Category, CategorySet, Influencer, Offer, Page, PageLimits};
pub use offers::OfferService;
pub use influencers::InfluencerService;
pub use repository::{InfluencerRepository, OfferRepository};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        CoreError::NotFound(format!("{} {}", entity, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::ValidationError(msg.into())
    }
}

impl From<reach_payout::PayoutError> for CoreError {
    fn from(err: reach_payout::PayoutError) -> Self {
        CoreError::ValidationError(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
