//! Startup loader for pre-seeded accounts.
//!
//! The file is a JSON array of profiles. Seeded accounts have no credential;
//! their owner claims one by registering with the same login name.

use std::path::Path;

use anyhow::Context;
use photoshare_store::{Database, User};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SeedUser {
    login_name: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    occupation: String,
}

/// Create every listed account whose login name is still free. Returns how
/// many were created.
pub fn seed_users(db: &Database, path: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let entries: Vec<SeedUser> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed file {}", path.display()))?;

    let mut created = 0;
    for entry in entries {
        if db.find_user_by_login(&entry.login_name)?.is_some() {
            debug!(login = %entry.login_name, "Seed account already present");
            continue;
        }

        let mut user = User::new(&entry.login_name, &entry.first_name, &entry.last_name);
        user.location = entry.location;
        user.description = entry.description;
        user.occupation = entry.occupation;
        db.create_user(&user)?;
        created += 1;
    }

    info!(path = %path.display(), created, "Seed accounts loaded");
    Ok(created)
}
