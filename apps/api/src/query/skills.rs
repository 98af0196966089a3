use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::profile::ProfileFields;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillCount {
    pub skill: String,
    pub count: u32,
}

/// Lowercased key used for every skill comparison.
pub fn normalize_skill(skill: &str) -> String {
    skill.to_lowercase()
}

/// Frequency of each skill across the top-level list and every project.
///
/// Skills are counted under their lowercased form, which is also the label
/// returned. Ordered by count descending, then by skill ascending.
pub fn top_skills(fields: &ProfileFields) -> Vec<SkillCount> {
    let mut counts: HashMap<String, u32> = HashMap::new();

    let all = fields
        .skills
        .iter()
        .chain(fields.projects.iter().flat_map(|p| p.skills.iter()));
    for skill in all.filter(|s| !s.is_empty()) {
        *counts.entry(normalize_skill(skill)).or_insert(0) += 1;
    }

    let mut ranked: Vec<SkillCount> = counts
        .into_iter()
        .map(|(skill, count)| SkillCount { skill, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill.cmp(&b.skill)));
    ranked
}
