use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::redact_url;
use crate::store::StoreError;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL at {}", redact_url(database_url));

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

async fn create_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id          UUID PRIMARY KEY,
            slug        TEXT UNIQUE,
            data        JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS profiles_data_idx ON profiles USING GIN (data)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn profiles_table_exists(pool: &PgPool) -> Result<bool> {
    Ok(sqlx::query_scalar("SELECT to_regclass('profiles') IS NOT NULL")
        .fetch_one(pool)
        .await?)
}

/// A login without CREATE on the schema may still run against an existing table.
fn accept_schema_result(result: Result<(), StoreError>, table_exists: bool) -> Result<()> {
    match result {
        Ok(()) => {
            info!("Profile schema ready");
            Ok(())
        }
        Err(StoreError::PermissionDenied(msg)) if table_exists => {
            warn!("Cannot create profile schema ({msg}); using the existing profiles table");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Creates the profile collection and its indexes if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let created = create_schema(pool).await;
    let table_exists = match &created {
        Err(StoreError::PermissionDenied(_)) => profiles_table_exists(pool).await?,
        _ => false,
    };
    accept_schema_result(created, table_exists)
}
