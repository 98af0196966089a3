use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::profile::{ProfileFields, Project, CANONICAL_SLUG};
use crate::query::search::{filter_projects, search, SearchResults};
use crate::query::skills::{top_skills, SkillCount};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProjectFilter {
    pub skill: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

async fn load_fields(state: &AppState) -> Result<ProfileFields, AppError> {
    let profile = state
        .store
        .find_by_slug(CANONICAL_SLUG)
        .await?
        .ok_or_else(AppError::profile_not_found)?;
    Ok(profile.fields)
}

/// GET /api/projects?skill=
pub async fn handle_list_projects(
    State(state): State<AppState>,
    params: Result<Query<ProjectFilter>, QueryRejection>,
) -> Result<Json<Vec<Project>>, AppError> {
    let Query(filter) = params?;
    let fields = load_fields(&state).await?;
    // `?skill=` with no value means no filter.
    let skill = filter.skill.as_deref().filter(|s| !s.is_empty());
    Ok(Json(filter_projects(&fields.projects, skill)))
}

/// GET /api/skills/top
pub async fn handle_top_skills(
    State(state): State<AppState>,
) -> Result<Json<Vec<SkillCount>>, AppError> {
    let fields = load_fields(&state).await?;
    Ok(Json(top_skills(&fields)))
}

/// GET /api/search?q=
pub async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResults>, AppError> {
    let Query(params) = params?;
    let q = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing q param".to_string()))?;
    let fields = load_fields(&state).await?;
    Ok(Json(search(&fields, &q)))
}
