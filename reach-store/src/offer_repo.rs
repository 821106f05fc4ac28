use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reach_core::models::{NewOffer, OfferChanges};
use reach_core::repository::OfferRepository;
use reach_core::{Category, CategorySet, CoreError, CoreResult, Offer, Page};
use reach_payout::{BasePayout, CountryOverride, CustomPayout, PayoutTerms};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error};

use crate::sql::{contains_pattern, map_db_error, stored_category, stored_terms};

pub struct PostgresOfferRepository {
    pool: PgPool,
}

impl PostgresOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: i64,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    offer_id: i64,
    category: String,
}

#[derive(sqlx::FromRow)]
struct PayoutRow {
    id: i64,
    offer_id: i64,
    payout_type: String,
    cpa_amount: Option<f64>,
    fixed_amount: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OverrideRow {
    payout_id: i64,
    country_code: String,
    cpa_amount: f64,
}

#[derive(sqlx::FromRow)]
struct CustomPayoutRow {
    id: i64,
    offer_id: i64,
    influencer_id: i64,
    payout_type: String,
    cpa_amount: Option<f64>,
    fixed_amount: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomPayoutRow> for CustomPayout {
    type Error = CoreError;

    fn try_from(row: CustomPayoutRow) -> Result<Self, Self::Error> {
        Ok(CustomPayout {
            id: row.id,
            offer_id: row.offer_id,
            influencer_id: row.influencer_id,
            terms: stored_terms(&row.payout_type, row.cpa_amount, row.fixed_amount)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const OFFER_COLUMNS: &str = "id, title, description, created_at, updated_at";
const CUSTOM_PAYOUT_COLUMNS: &str =
    "id, offer_id, influencer_id, payout_type, cpa_amount, fixed_amount, created_at, updated_at";

async fn insert_categories(
    conn: &mut PgConnection,
    offer_id: i64,
    categories: &CategorySet,
) -> CoreResult<()> {
    for category in categories.iter() {
        sqlx::query("INSERT INTO offer_categories (offer_id, category) VALUES ($1, $2)")
            .bind(offer_id)
            .bind(category.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_db_error("insert offer category", e))?;
    }
    Ok(())
}

async fn insert_overrides(
    conn: &mut PgConnection,
    payout_id: i64,
    overrides: &[CountryOverride],
) -> CoreResult<()> {
    for item in overrides {
        sqlx::query(
            "INSERT INTO country_overrides (payout_id, country_code, cpa_amount) VALUES ($1, $2, $3)",
        )
        .bind(payout_id)
        .bind(&item.country_code)
        .bind(item.cpa_amount)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_db_error("insert country override", e))?;
    }
    Ok(())
}

impl PostgresOfferRepository {
    /// Attach categories, payouts and overrides to a batch of offer rows,
    /// keeping the order of `rows`
    async fn hydrate(&self, rows: Vec<OfferRow>) -> CoreResult<Vec<Offer>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let offer_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let category_rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT offer_id, category FROM offer_categories WHERE offer_id = ANY($1)",
        )
        .bind(offer_ids.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("load offer categories", e))?;

        let payout_rows: Vec<PayoutRow> = sqlx::query_as(
            "SELECT id, offer_id, payout_type, cpa_amount, fixed_amount, created_at, updated_at FROM payouts WHERE offer_id = ANY($1)",
        )
        .bind(offer_ids.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("load payouts", e))?;

        let payout_ids: Vec<i64> = payout_rows.iter().map(|r| r.id).collect();
        let override_rows: Vec<OverrideRow> = sqlx::query_as(
            "SELECT payout_id, country_code, cpa_amount FROM country_overrides WHERE payout_id = ANY($1) ORDER BY id",
        )
        .bind(payout_ids.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("load country overrides", e))?;

        let mut categories: HashMap<i64, Vec<Category>> = HashMap::new();
        for row in category_rows {
            categories
                .entry(row.offer_id)
                .or_default()
                .push(stored_category(&row.category)?);
        }

        let mut overrides: HashMap<i64, Vec<CountryOverride>> = HashMap::new();
        for row in override_rows {
            overrides
                .entry(row.payout_id)
                .or_default()
                .push(CountryOverride::new(row.country_code, row.cpa_amount));
        }

        let mut payouts: HashMap<i64, BasePayout> = HashMap::with_capacity(payout_rows.len());
        for row in payout_rows {
            let payout = BasePayout {
                id: row.id,
                terms: stored_terms(&row.payout_type, row.cpa_amount, row.fixed_amount)?,
                country_overrides: overrides.remove(&row.id).unwrap_or_default(),
                created_at: row.created_at,
                updated_at: row.updated_at,
            };
            payouts.insert(row.offer_id, payout);
        }

        rows.into_iter()
            .map(|row| {
                let payout = payouts
                    .remove(&row.id)
                    .ok_or_else(|| missing_payout(row.id))?;
                Ok(Offer {
                    id: row.id,
                    title: row.title,
                    description: row.description,
                    categories: categories
                        .remove(&row.id)
                        .unwrap_or_default()
                        .into_iter()
                        .collect(),
                    payout,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }
}

fn missing_payout(offer_id: i64) -> CoreError {
    error!("Offer {} has no payout row", offer_id);
    CoreError::InternalError("offer without payout".to_string())
}

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    async fn create_offer(&self, offer: &NewOffer) -> CoreResult<Offer> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("begin transaction", e))?;

        let offer_id: i64 = sqlx::query_scalar(
            "INSERT INTO offers (title, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&offer.title)
        .bind(&offer.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error("insert offer", e))?;

        insert_categories(&mut tx, offer_id, &offer.categories).await?;

        let payout_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO payouts (offer_id, payout_type, cpa_amount, fixed_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(offer_id)
        .bind(offer.payout.payout_type().as_str())
        .bind(offer.payout.cpa_amount())
        .bind(offer.payout.fixed_amount())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error("insert payout", e))?;

        insert_overrides(&mut tx, payout_id, &offer.country_overrides).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("commit offer", e))?;
        debug!("Inserted offer {} with payout {}", offer_id, payout_id);

        self.get_offer_with_payout(offer_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Offer", offer_id))
    }

    async fn get_offer_with_payout(&self, id: i64) -> CoreResult<Option<Offer>> {
        let row: Option<OfferRow> =
            sqlx::query_as(&format!("SELECT {} FROM offers WHERE id = $1", OFFER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("fetch offer", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row]).await?.pop())
    }

    async fn list_offers(
        &self,
        title_filter: Option<&str>,
        page: Page,
    ) -> CoreResult<(Vec<Offer>, i64)> {
        let pattern = title_filter.map(contains_pattern);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM offers WHERE ($1::TEXT IS NULL OR title ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("count offers", e))?;

        let rows: Vec<OfferRow> = sqlx::query_as(&format!(
            "SELECT {} FROM offers WHERE ($1::TEXT IS NULL OR title ILIKE $1) ORDER BY id LIMIT $2 OFFSET $3",
            OFFER_COLUMNS
        ))
        .bind(pattern.as_deref())
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("list offers", e))?;

        Ok((self.hydrate(rows).await?, total))
    }

    async fn update_offer(&self, id: i64, changes: &OfferChanges) -> CoreResult<Option<Offer>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("begin transaction", e))?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE offers
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("update offer", e))?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(categories) = &changes.categories {
            sqlx::query("DELETE FROM offer_categories WHERE offer_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error("clear offer categories", e))?;
            insert_categories(&mut tx, id, categories).await?;
        }

        if changes.payout.is_some() || changes.country_overrides.is_some() {
            let payout_id: i64 =
                sqlx::query_scalar("SELECT id FROM payouts WHERE offer_id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| map_db_error("lock payout", e))?;

            match changes.payout {
                Some(terms) => {
                    sqlx::query(
                        r#"
                        UPDATE payouts
                        SET payout_type = $2, cpa_amount = $3, fixed_amount = $4, updated_at = NOW()
                        WHERE id = $1
                        "#,
                    )
                    .bind(payout_id)
                    .bind(terms.payout_type().as_str())
                    .bind(terms.cpa_amount())
                    .bind(terms.fixed_amount())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_db_error("update payout", e))?;
                }
                None => {
                    sqlx::query("UPDATE payouts SET updated_at = NOW() WHERE id = $1")
                        .bind(payout_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| map_db_error("touch payout", e))?;
                }
            }

            // Full replace
            if let Some(overrides) = &changes.country_overrides {
                sqlx::query("DELETE FROM country_overrides WHERE payout_id = $1")
                    .bind(payout_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_db_error("clear country overrides", e))?;
                insert_overrides(&mut tx, payout_id, overrides).await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error("commit offer update", e))?;

        self.get_offer_with_payout(id).await
    }

    async fn delete_offer(&self, id: i64) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("delete offer", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_custom_payout(
        &self,
        offer_id: i64,
        influencer_id: i64,
    ) -> CoreResult<Option<CustomPayout>> {
        let row: Option<CustomPayoutRow> = sqlx::query_as(&format!(
            "SELECT {} FROM custom_payouts WHERE offer_id = $1 AND influencer_id = $2",
            CUSTOM_PAYOUT_COLUMNS
        ))
        .bind(offer_id)
        .bind(influencer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("fetch custom payout", e))?;

        row.map(CustomPayout::try_from).transpose()
    }

    async fn upsert_custom_payout(
        &self,
        offer_id: i64,
        influencer_id: i64,
        terms: &PayoutTerms,
    ) -> CoreResult<CustomPayout> {
        let row: CustomPayoutRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO custom_payouts (offer_id, influencer_id, payout_type, cpa_amount, fixed_amount)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (offer_id, influencer_id) DO UPDATE
            SET payout_type = EXCLUDED.payout_type,
                cpa_amount = EXCLUDED.cpa_amount,
                fixed_amount = EXCLUDED.fixed_amount,
                updated_at = NOW()
            RETURNING {}
            "#,
            CUSTOM_PAYOUT_COLUMNS
        ))
        .bind(offer_id)
        .bind(influencer_id)
        .bind(terms.payout_type().as_str())
        .bind(terms.cpa_amount())
        .bind(terms.fixed_amount())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("upsert custom payout", e))?;

        CustomPayout::try_from(row)
    }

    async fn delete_custom_payout(&self, offer_id: i64, influencer_id: i64) -> CoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM custom_payouts WHERE offer_id = $1 AND influencer_id = $2")
                .bind(offer_id)
                .bind(influencer_id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_db_error("delete custom payout", e))?;
        Ok(result.rows_affected() > 0)
    }
}
