//! Read-only views derived from the stored profile.

pub mod handlers;
pub mod search;
pub mod skills;
