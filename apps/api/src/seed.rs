use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::profile::{Profile, ProfileFields, CANONICAL_SLUG};
use crate::profile::validation::validate_new;
use crate::store::ProfileStore;

/// Reads a profile document from disk.
pub fn load_seed_file(path: &Path) -> Result<ProfileFields> {
    if !path.exists() {
        anyhow::bail!(
            "Seed file not found: {}\nCreate it from data/profile.example.json and fill in your data.",
            path.display()
        );
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Seed file {} is not a valid profile document", path.display()))
}

/// Upserts the seed document under the canonical key.
pub async fn seed_profile(store: &dyn ProfileStore, path: &Path) -> Result<Profile> {
    let fields = load_seed_file(path)?;
    validate_new(&fields)?;
    let profile = store.replace(CANONICAL_SLUG, &fields).await?;
    info!("Seeded profile data from {}", path.display());
    Ok(profile)
}
