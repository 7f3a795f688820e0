//! Configuration Management
//!
//! Optional defaults for aws-names, read from
//! `<config_dir>/aws-names/config.json`. Command line flags win over the
//! file, the file wins over the AWS environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Profile used when nothing else names one
pub const DEFAULT_PROFILE: &str = "default";
/// Region used when nothing else names one
pub const DEFAULT_REGION: &str = "us-east-1";

/// User configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub profiles: Option<Vec<String>>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    /// Type filter applied when `--types` is not given
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub progress_interval: Option<u64>,
    /// Endpoint override for every service (LocalStack and friends)
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub walk_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aws-names").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file; missing or unreadable files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Cannot read config {}: {}", path.display(), e);
                Self::default()
            },
        }
    }

    /// Get effective profiles (CLI > config > AWS_PROFILE > default)
    pub fn effective_profiles(&self, cli: Option<Vec<String>>) -> Vec<String> {
        resolve_list(
            cli,
            self.profiles.clone(),
            std::env::var("AWS_PROFILE").ok(),
            DEFAULT_PROFILE,
        )
    }

    /// Get effective regions (CLI > config > AWS_REGION/AWS_DEFAULT_REGION > default)
    pub fn effective_regions(&self, cli: Option<Vec<String>>) -> Vec<String> {
        let env = std::env::var("AWS_REGION")
            .ok()
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok());
        resolve_list(cli, self.regions.clone(), env, DEFAULT_REGION)
    }

    /// Get effective type filter (CLI > config > all types)
    pub fn effective_types(&self, cli: Option<Vec<String>>) -> Option<Vec<String>> {
        cli.or_else(|| self.types.clone())
    }
}

fn resolve_list(
    cli: Option<Vec<String>>,
    config: Option<Vec<String>>,
    env: Option<String>,
    default: &str,
) -> Vec<String> {
    cli.filter(|v| !v.is_empty())
        .or_else(|| config.filter(|v| !v.is_empty()))
        .or_else(|| env.filter(|v| !v.is_empty()).map(|v| vec![v]))
        .unwrap_or_else(|| vec![default.to_string()])
}
