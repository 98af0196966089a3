use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::models::profile::{Profile, ProfileFields, ProfilePatch, CANONICAL_SLUG};
use crate::profile::delete::{delete_profile, DeleteReport};
use crate::profile::validation::{validate_new, validate_patch, validate_replace};
use crate::state::AppState;
use crate::store::StoreError;

/// GET /api/profile
pub async fn handle_get_profile(State(state): State<AppState>) -> Result<Json<Profile>, AppError> {
    let profile = state
        .store
        .find_by_slug(CANONICAL_SLUG)
        .await?
        .ok_or_else(AppError::profile_not_found)?;
    Ok(Json(profile))
}

/// POST /api/profile
pub async fn handle_create_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let Json(fields) = payload?;

    if state.store.find_by_slug(CANONICAL_SLUG).await?.is_some() {
        return Err(AppError::Conflict("Profile already exists".to_string()));
    }
    validate_new(&fields)?;

    // A concurrent create can still win the race; the unique slug catches it.
    let profile = match state.store.insert(CANONICAL_SLUG, &fields).await {
        Ok(profile) => profile,
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::Conflict("Profile already exists".to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PUT /api/profile
///
/// Destructive replace: fields missing from the body are reset to defaults.
pub async fn handle_replace_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileFields>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(fields) = payload?;
    validate_replace(&fields)?;
    let profile = state.store.replace(CANONICAL_SLUG, &fields).await?;
    Ok(Json(profile))
}

/// PATCH /api/profile
pub async fn handle_patch_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(patch) = payload?;
    validate_patch(&patch)?;

    let updated = if patch.is_empty() {
        state.store.find_by_slug(CANONICAL_SLUG).await?
    } else {
        let document = patch.to_document().map_err(StoreError::from)?;
        state.store.merge(CANONICAL_SLUG, &document).await?
    };
    Ok(Json(updated.ok_or_else(AppError::profile_not_found)?))
}

/// DELETE /api/profile
pub async fn handle_delete_profile(
    State(state): State<AppState>,
) -> Result<Json<DeleteReport>, AppError> {
    let report = delete_profile(state.store.as_ref(), CANONICAL_SLUG).await?;
    Ok(Json(report))
}
