//! Delete with escalating fallbacks.
//!
//! Tiers run in order, each only when the previous one found nothing or was
//! refused by the store:
//! 1. `Canonical`: hard delete of documents under the canonical slug.
//! 2. `Unscoped`: hard delete of the whole collection (legacy documents
//!    written before the slug existed).
//! 3. `SoftDelete`: when deletes are not permitted, move every canonical
//!    document to a tombstone slug so it can no longer be fetched.
//!
//! Tiers 2 and 3 touch documents one store call at a time; a crash midway can
//! leave a partial set renamed.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::profile::tombstone_slug;
use crate::store::{ProfileStore, StoreError};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub deleted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_deleted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DeleteTier {
    Canonical,
    Unscoped,
    SoftDelete,
}

#[derive(Debug)]
enum TierOutcome {
    Removed(u64),
    NotFound,
    PermissionDenied(String),
}

impl TierOutcome {
    fn from_count(count: u64) -> Self {
        if count > 0 {
            TierOutcome::Removed(count)
        } else {
            TierOutcome::NotFound
        }
    }
}

/// Permission failures become an outcome; anything else is a real error.
fn classify(result: Result<u64, StoreError>) -> Result<TierOutcome, AppError> {
    match result {
        Ok(count) => Ok(TierOutcome::from_count(count)),
        Err(StoreError::PermissionDenied(msg)) => Ok(TierOutcome::PermissionDenied(msg)),
        Err(e) => Err(e.into()),
    }
}

async fn soft_delete(store: &dyn ProfileStore, slug: &str) -> Result<u64, StoreError> {
    let ids = store.find_ids_by_slug(slug).await?;
    let mut renamed = 0;
    for id in ids {
        if store.rename_slug(id, &tombstone_slug(id)).await? {
            renamed += 1;
        }
    }
    Ok(renamed)
}

async fn run_tier(
    store: &dyn ProfileStore,
    tier: DeleteTier,
    slug: &str,
) -> Result<TierOutcome, AppError> {
    match tier {
        DeleteTier::Canonical => classify(store.delete_by_slug(slug).await),
        DeleteTier::Unscoped => classify(store.delete_all().await),
        // Any failure here, permission or not, is reported as a permission problem.
        DeleteTier::SoftDelete => Ok(match soft_delete(store, slug).await {
            Ok(count) => TierOutcome::from_count(count),
            Err(e) => TierOutcome::PermissionDenied(e.to_string()),
        }),
    }
}

pub async fn delete_profile(store: &dyn ProfileStore, slug: &str) -> Result<DeleteReport, AppError> {
    let mut tier = DeleteTier::Canonical;
    loop {
        let outcome = run_tier(store, tier, slug).await?;
        match (tier, outcome) {
            (DeleteTier::Canonical, TierOutcome::Removed(n)) => {
                info!("Deleted {n} profile document(s) under slug '{slug}'");
                return Ok(DeleteReport {
                    deleted: n,
                    ..Default::default()
                });
            }
            (DeleteTier::Canonical, TierOutcome::NotFound) => tier = DeleteTier::Unscoped,
            (DeleteTier::Unscoped, TierOutcome::Removed(n)) => {
                warn!("No document under slug '{slug}'; cleared {n} unkeyed document(s)");
                return Ok(DeleteReport {
                    deleted: n,
                    soft_deleted: None,
                    note: Some("Cleared all profiles (no slug found)".to_string()),
                });
            }
            (DeleteTier::Unscoped, TierOutcome::NotFound)
            | (DeleteTier::SoftDelete, TierOutcome::NotFound) => {
                return Err(AppError::profile_not_found());
            }
            (DeleteTier::Canonical | DeleteTier::Unscoped, TierOutcome::PermissionDenied(msg)) => {
                warn!("Delete refused by store ({msg}); falling back to soft delete");
                tier = DeleteTier::SoftDelete;
            }
            (DeleteTier::SoftDelete, TierOutcome::Removed(n)) => {
                info!("Soft-deleted {n} profile document(s) under slug '{slug}'");
                return Ok(DeleteReport {
                    deleted: 0,
                    soft_deleted: Some(n),
                    note: Some("No delete permission; renamed slug(s) instead".to_string()),
                });
            }
            (DeleteTier::SoftDelete, TierOutcome::PermissionDenied(msg)) => {
                return Err(AppError::Forbidden(msg));
            }
        }
    }
}
