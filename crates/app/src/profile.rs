//! Local player profile
//!
//! Stores the durable identity this machine plays under, so a restarted
//! client rejoins as the same player.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use quizroom_core::random_display_name;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::project_dirs;

pub const PROFILE_FILE: &str = "profile.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub durable_identity_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_room_code: Option<String>,
}

impl PlayerProfile {
    /// Fresh identity with a random name
    pub fn generate() -> Self {
        Self {
            durable_identity_id: Uuid::new_v4().to_string(),
            display_name: random_display_name(),
            last_room_code: None,
        }
    }
}

/// Reads and writes `profile.json`
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(PROFILE_FILE),
        }
    }

    /// Store in the platform data directory
    pub fn default_location() -> Result<Self> {
        let dirs = project_dirs().ok_or_else(|| anyhow!("could not determine data directory"))?;
        Ok(Self::in_dir(dirs.data_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored profile, creating and saving one on first use
    pub fn load_or_create(&self) -> Result<PlayerProfile> {
        if self.path.is_file() {
            let text = std::fs::read_to_string(&self.path)
                .with_context(|| format!("failed to read {}", self.path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("corrupt profile {}", self.path.display()));
        }

        let profile = PlayerProfile::generate();
        self.save(&profile)?;
        tracing::info!(
            identity = %profile.durable_identity_id,
            path = %self.path.display(),
            "Created player profile"
        );
        Ok(profile)
    }

    pub fn save(&self, profile: &PlayerProfile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(profile)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Remember (or forget) the room to reconnect to
    pub fn set_last_room(&self, profile: &mut PlayerProfile, room_code: Option<&str>) -> Result<()> {
        profile.last_room_code = room_code.map(str::to_string);
        self.save(profile)
    }
}
