//! Configuration loading
//!
//! Defaults, then a toml file, then command line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use directories::ProjectDirs;
use quizroom_net::ServerConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";

/// Everything read from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `explicit` if given, otherwise from the default location
    /// when a file exists there
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Server settings that can be overridden on the command line
#[derive(Debug, Clone, Default, Args)]
pub struct ServerOverrides {
    /// Interface to bind
    #[arg(long, env = "QUIZROOM_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "QUIZROOM_PORT")]
    pub port: Option<u16>,

    /// Cap on simultaneously live rooms
    #[arg(long)]
    pub max_rooms: Option<usize>,
}

impl ServerOverrides {
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(max_rooms) = self.max_rooms {
            config.max_rooms = max_rooms;
        }
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "onyx", "quizroom")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
