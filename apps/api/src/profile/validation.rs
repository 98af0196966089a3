use crate::errors::AppError;
use crate::models::profile::{ProfileFields, ProfilePatch, Project};

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn check_projects(projects: &[Project], problems: &mut Vec<String>) {
    for (i, project) in projects.iter().enumerate() {
        if project.title.trim().is_empty() {
            problems.push(format!("projects.{i}.title is required"));
        }
    }
}

fn into_result(problems: Vec<String>) -> Result<(), AppError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Profile validation failed: {}",
            problems.join(", ")
        )))
    }
}

/// Create and seed: every required field must be present and non-empty.
pub fn validate_new(fields: &ProfileFields) -> Result<(), AppError> {
    let mut problems = Vec::new();
    if is_blank(fields.name.as_deref()) {
        problems.push("name is required".to_string());
    }
    if is_blank(fields.email.as_deref()) {
        problems.push("email is required".to_string());
    }
    check_projects(&fields.projects, &mut problems);
    into_result(problems)
}

/// Full replace: required fields that the body carries must be non-empty.
/// Omitted fields fall back to their defaults instead of failing.
pub fn validate_replace(fields: &ProfileFields) -> Result<(), AppError> {
    let mut problems = Vec::new();
    if fields.name.is_some() && is_blank(fields.name.as_deref()) {
        problems.push("name must not be empty".to_string());
    }
    if fields.email.is_some() && is_blank(fields.email.as_deref()) {
        problems.push("email must not be empty".to_string());
    }
    check_projects(&fields.projects, &mut problems);
    into_result(problems)
}

/// Partial update: only the touched fields are checked.
pub fn validate_patch(patch: &ProfilePatch) -> Result<(), AppError> {
    let mut problems = Vec::new();
    if patch.name.is_some() && is_blank(patch.name.as_deref()) {
        problems.push("name must not be empty".to_string());
    }
    if patch.email.is_some() && is_blank(patch.email.as_deref()) {
        problems.push("email must not be empty".to_string());
    }
    if let Some(projects) = &patch.projects {
        check_projects(projects, &mut problems);
    }
    into_result(problems)
}
