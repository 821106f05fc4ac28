use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reach_core::models::{InfluencerChanges, NewInfluencer};
use reach_core::repository::InfluencerRepository;
use reach_core::{CoreError, CoreResult, Influencer, Page};
use sqlx::PgPool;

use crate::sql::{is_unique_violation, map_db_error};

pub struct PostgresInfluencerRepository {
    pool: PgPool,
}

impl PostgresInfluencerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct InfluencerRow {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InfluencerRow> for Influencer {
    fn from(row: InfluencerRow) -> Self {
        Influencer {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn email_error(action: &str, email: &str, err: sqlx::Error) -> CoreError {
    if is_unique_violation(&err) {
        CoreError::Conflict(format!("Influencer with email {} already exists", email))
    } else {
        map_db_error(action, err)
    }
}

#[async_trait]
impl InfluencerRepository for PostgresInfluencerRepository {
    async fn create_influencer(&self, influencer: &NewInfluencer) -> CoreResult<Influencer> {
        let row: InfluencerRow = sqlx::query_as(
            r#"
            INSERT INTO influencers (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(&influencer.name)
        .bind(&influencer.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| email_error("insert influencer", &influencer.email, e))?;

        Ok(row.into())
    }

    async fn get_influencer(&self, id: i64) -> CoreResult<Option<Influencer>> {
        let row: Option<InfluencerRow> = sqlx::query_as(
            "SELECT id, name, email, created_at, updated_at FROM influencers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("fetch influencer", e))?;

        Ok(row.map(Influencer::from))
    }

    async fn get_influencer_by_email(&self, email: &str) -> CoreResult<Option<Influencer>> {
        let row: Option<InfluencerRow> = sqlx::query_as(
            "SELECT id, name, email, created_at, updated_at FROM influencers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("fetch influencer by email", e))?;

        Ok(row.map(Influencer::from))
    }

    async fn list_influencers(&self, page: Page) -> CoreResult<Vec<Influencer>> {
        let rows: Vec<InfluencerRow> = sqlx::query_as(
            "SELECT id, name, email, created_at, updated_at FROM influencers ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("list influencers", e))?;

        Ok(rows.into_iter().map(Influencer::from).collect())
    }

    async fn update_influencer(
        &self,
        id: i64,
        changes: &InfluencerChanges,
    ) -> CoreResult<Option<Influencer>> {
        let row: Option<InfluencerRow> = sqlx::query_as(
            r#"
            UPDATE influencers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| email_error("update influencer", changes.email.as_deref().unwrap_or_default(), e))?;

        Ok(row.map(Influencer::from))
    }

    async fn delete_influencer(&self, id: i64) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM influencers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("delete influencer", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn influencer_exists(&self, id: i64) -> CoreResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM influencers WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("check influencer", e))
    }
}
