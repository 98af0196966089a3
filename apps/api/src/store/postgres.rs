use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::profile::{Profile, ProfileFields};
use crate::store::{ProfileStore, StoreResult};

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    slug: Option<String>,
    data: Json<ProfileFields>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            slug: row.slug.unwrap_or_default(),
            fields: row.data.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Profiles stored as JSONB documents in the `profiles` table.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as("SELECT * FROM profiles WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn insert(&self, slug: &str, fields: &ProfileFields) -> StoreResult<Profile> {
        let row: ProfileRow = sqlx::query_as(
            "INSERT INTO profiles (id, slug, data) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(Json(fields))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn replace(&self, slug: &str, fields: &ProfileFields) -> StoreResult<Profile> {
        let row: ProfileRow = sqlx::query_as(
            r#"
            INSERT INTO profiles (id, slug, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE
                SET data = EXCLUDED.data, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(Json(fields))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn merge(
        &self,
        slug: &str,
        patch: &Map<String, Value>,
    ) -> StoreResult<Option<Profile>> {
        // `||` on jsonb objects replaces top-level keys only.
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            UPDATE profiles
            SET data = data || $2, updated_at = now()
            WHERE slug = $1
            RETURNING *
            "#,
        )
        .bind(slug)
        .bind(Json(patch))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Profile::from))
    }

    async fn delete_by_slug(&self, slug: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM profiles WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM profiles")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_ids_by_slug(&self, slug: &str) -> StoreResult<Vec<Uuid>> {
        Ok(
            sqlx::query_scalar("SELECT id FROM profiles WHERE slug = $1")
                .bind(slug)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn rename_slug(&self, id: Uuid, new_slug: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE profiles SET slug = $2, updated_at = now() WHERE id = $1 AND slug IS DISTINCT FROM $2",
        )
        .bind(id)
        .bind(new_slug)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
