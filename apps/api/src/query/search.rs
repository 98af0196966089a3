use serde::{Deserialize, Serialize};

use crate::models::profile::{ProfileFields, Project, WorkEntry};
use crate::query::skills::normalize_skill;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    pub projects: Vec<Project>,
    pub skills: Vec<String>,
    pub work: Vec<WorkEntry>,
}

/// Projects tagged with `skill` (exact, case-insensitive). `None` keeps all.
pub fn filter_projects(projects: &[Project], skill: Option<&str>) -> Vec<Project> {
    match skill {
        None => projects.to_vec(),
        Some(skill) => {
            let wanted = normalize_skill(skill);
            projects
                .iter()
                .filter(|p| p.skills.iter().any(|s| normalize_skill(s) == wanted))
                .cloned()
                .collect()
        }
    }
}

struct Needle(String);

impl Needle {
    fn new(query: &str) -> Self {
        Needle(query.to_lowercase())
    }

    fn found_in(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.0)
    }

    fn found_in_opt(&self, haystack: Option<&str>) -> bool {
        self.found_in(haystack.unwrap_or(""))
    }
}

/// Case-insensitive substring search over projects, skills, and work.
/// Each list keeps storage order.
pub fn search(fields: &ProfileFields, query: &str) -> SearchResults {
    let needle = Needle::new(query);

    let projects = fields
        .projects
        .iter()
        .filter(|p| {
            needle.found_in(&p.title)
                || needle.found_in_opt(p.description.as_deref())
                || p.skills.iter().any(|s| needle.found_in(s))
        })
        .cloned()
        .collect();

    let skills = fields
        .skills
        .iter()
        .filter(|s| needle.found_in(s))
        .cloned()
        .collect();

    let work = fields
        .work
        .iter()
        .filter(|w| {
            needle.found_in_opt(w.company.as_deref())
                || needle.found_in_opt(w.role.as_deref())
                || needle.found_in_opt(w.description.as_deref())
        })
        .cloned()
        .collect();

    SearchResults {
        projects,
        skills,
        work,
    }
}
