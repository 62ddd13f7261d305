//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./msess.toml or ./.msess/config.toml
//! 2. User config: ~/.msess/config.toml
//! 3. System config: /etc/msess/config.toml
//! 4. Built-in defaults

use crate::{env, session::SessionConfig};
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SYSTEM_CONFIG_PATH: &str = "/etc/msess/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Session file used when `--file` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
    pub session: SessionConfig,
}

impl CliConfig {
    /// Session file to operate on, falling back to ./.msess/session.json
    pub fn resolve_session_file(&self, file_override: Option<PathBuf>) -> PathBuf {
        file_override
            .or_else(|| self.session_file.clone())
            .unwrap_or_else(|| {
                let current_dir = std_env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                env::default_session_file_path(&current_dir)
            })
    }

    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Locates the `msess` configuration file
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load the first configuration file found, or the defaults
    pub fn discover_config() -> Result<CliConfig, Box<dyn std::error::Error>> {
        match Self::find_config_file() {
            Some(path) => {
                info!("Loading configuration from: {:?}", path);
                CliConfig::from_toml_file(path)
            }
            None => {
                debug!("No configuration file found, using defaults");
                Ok(CliConfig::default())
            }
        }
    }

    pub fn find_config_file() -> Option<PathBuf> {
        Self::get_config_candidates()
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    /// Candidate files, highest priority first
    pub fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(&current_dir));
        }
        if let Some(home_dir) = home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }
        candidates.push(PathBuf::from(SYSTEM_CONFIG_PATH));
        candidates
    }

    /// Write a default `~/.msess/config.toml` unless one already exists
    pub fn create_default_user_config() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let home_dir = home_dir().ok_or("Could not determine home directory")?;
        let config_path = env::user_config_file_path(&home_dir);

        if config_path.exists() {
            warn!("Configuration file already exists: {:?}", config_path);
            return Ok(config_path);
        }

        fs::create_dir_all(env::user_config_dir_path(&home_dir))?;
        CliConfig::default().to_toml_file(&config_path)?;
        info!("Created default configuration file: {:?}", config_path);
        Ok(config_path)
    }

    /// Candidate list with the one in effect marked
    pub fn discovery_info() -> String {
        let active = Self::find_config_file();
        let mut out = String::from("Configuration files, highest priority first:\n");
        for candidate in Self::get_config_candidates() {
            let marker = if active.as_ref() == Some(&candidate) {
                "*"
            } else if candidate.is_file() {
                "+"
            } else {
                "-"
            };
            out.push_str(&format!("  {} {}\n", marker, candidate.display()));
        }
        if active.is_none() {
            out.push_str("Using built-in defaults\n");
        }
        out
    }
}

fn home_dir() -> Option<PathBuf> {
    std_env::var_os("HOME")
        .or_else(|| std_env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
