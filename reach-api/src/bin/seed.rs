//! Populate the database with sample influencers, offers and custom payouts

use std::sync::Arc;

use anyhow::Context;
use reach_core::models::{InfluencerDraft, OfferDraft, PayoutDraft};
use reach_core::{
    Category, Influencer, InfluencerRepository, InfluencerService, OfferService,
};
use reach_payout::{CountryOverride, PayoutFields, PayoutType};
use reach_store::{Config, DbClient, PostgresInfluencerRepository, PostgresOfferRepository};
use tracing::info;

async fn ensure_influencer(
    repo: &dyn InfluencerRepository,
    service: &InfluencerService,
    name: &str,
    email: &str,
) -> anyhow::Result<Influencer> {
    if let Some(existing) = repo.get_influencer_by_email(email).await? {
        info!("Influencer already present: {} (ID: {})", existing.name, existing.id);
        return Ok(existing);
    }

    let influencer = service
        .create_influencer(InfluencerDraft {
            name: name.to_string(),
            email: email.to_string(),
        })
        .await?;
    info!("Created influencer: {} (ID: {})", influencer.name, influencer.id);
    Ok(influencer)
}

fn draft(
    title: &str,
    description: &str,
    categories: Vec<Category>,
    payout_type: PayoutType,
    cpa_amount: Option<f64>,
    fixed_amount: Option<f64>,
    country_overrides: Vec<CountryOverride>,
) -> OfferDraft {
    OfferDraft {
        title: title.to_string(),
        description: description.to_string(),
        categories,
        payout: PayoutDraft {
            payout_type,
            cpa_amount,
            fixed_amount,
            country_overrides,
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed=info,reach_core=info".into()),
        )
        .init();

    let config = Config::load().context("Failed to load config")?;
    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let influencer_repo = Arc::new(PostgresInfluencerRepository::new(db.pool.clone()));
    let offer_repo = Arc::new(PostgresOfferRepository::new(db.pool.clone()));
    let influencers = InfluencerService::new(influencer_repo.clone());
    let offers = OfferService::new(offer_repo, influencer_repo.clone());

    let alice = ensure_influencer(
        influencer_repo.as_ref(),
        &influencers,
        "Alice Johnson",
        "alice@example.com",
    )
    .await?;
    let bob = ensure_influencer(
        influencer_repo.as_ref(),
        &influencers,
        "Bob Smith",
        "bob@example.com",
    )
    .await?;
    ensure_influencer(
        influencer_repo.as_ref(),
        &influencers,
        "Carol White",
        "carol@example.com",
    )
    .await?;

    let gaming = offers
        .create_offer(draft(
            "Gaming Platform Promotion",
            "Promote our new gaming platform to your audience",
            vec![Category::Gaming, Category::Tech],
            PayoutType::Cpa,
            Some(20.0),
            None,
            vec![
                CountryOverride::new("DE", 30.0),
                CountryOverride::new("US", 25.0),
            ],
        ))
        .await?;
    info!("Created offer: {} (ID: {}) $20 CPA (DE: $30, US: $25)", gaming.title, gaming.id);

    let fashion = offers
        .create_offer(draft(
            "Fashion Brand Campaign",
            "Exclusive fashion brand partnership",
            vec![Category::Fashion],
            PayoutType::Fixed,
            None,
            Some(1000.0),
            Vec::new(),
        ))
        .await?;
    info!("Created offer: {} (ID: {}) $1000 Fixed", fashion.title, fashion.id);

    let health = offers
        .create_offer(draft(
            "Health Products Promotion",
            "Promote our health and wellness products",
            vec![Category::Health, Category::Nutrition],
            PayoutType::CpaAndFixed,
            Some(15.0),
            Some(500.0),
            vec![CountryOverride::new("GB", 20.0)],
        ))
        .await?;
    info!("Created offer: {} (ID: {}) $15 CPA + $500 Fixed (GB: $20)", health.title, health.id);

    let finance = offers
        .create_offer(draft(
            "Financial Services Promotion",
            "Promote financial services and earn commission",
            vec![Category::Finance],
            PayoutType::Cpa,
            Some(50.0),
            None,
            Vec::new(),
        ))
        .await?;
    info!("Created offer: {} (ID: {}) $50 CPA", finance.title, finance.id);

    offers
        .set_custom_payout(
            gaming.id,
            alice.id,
            PayoutFields {
                payout_type: PayoutType::Fixed,
                cpa_amount: None,
                fixed_amount: Some(2000.0),
            },
        )
        .await?;
    info!("{} gets $2000 Fixed for '{}'", alice.name, gaming.title);

    offers
        .set_custom_payout(
            health.id,
            bob.id,
            PayoutFields {
                payout_type: PayoutType::Cpa,
                cpa_amount: Some(100.0),
                fixed_amount: None,
            },
        )
        .await?;
    info!("{} gets $100 CPA for '{}'", bob.name, health.title);

    info!("Database seeded successfully");
    Ok(())
}
