pub mod app_config;
pub mod database;
pub mod influencer_repo;
pub mod offer_repo;
mod sql;

pub use app_config::Config;
pub use database::DbClient;
pub use influencer_repo::PostgresInfluencerRepository;
pub use offer_repo::PostgresOfferRepository;
