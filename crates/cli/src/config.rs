//! Settings management for the CLI
//!
//! Layers, lowest precedence first: JSON settings file, `CLUSTEROPT_*`
//! environment variables, command-line flags.

use anyhow::{Context, Result};
use optimizer_lib::PolicySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "DATABRICKS_API_TOKEN";

/// CLI settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Workspace host
    pub host: Option<String>,
    /// Principal used by scope `mine`
    pub principal: Option<String>,
    /// Default policy values
    #[serde(default)]
    pub policy: PolicySettings,
}

impl Settings {
    /// Load settings from `path`, or the default settings file if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(
                    config::File::from(path)
                        .format(config::FileFormat::Json)
                        .required(true),
                );
            }
            None => {
                if let Some(default_path) = Self::default_path() {
                    builder = builder.add_source(
                        config::File::from(default_path)
                            .format(config::FileFormat::Json)
                            .required(false),
                    );
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("CLUSTEROPT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read settings")?;

        settings
            .try_deserialize()
            .context("Failed to parse settings")
    }

    /// `~/.config/clusteropt/config.json`
    fn default_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("clusteropt").join("config.json"))
    }
}

/// API token from the environment, if set
pub fn api_token() -> Option<String> {
    std::env::var(TOKEN_ENV).ok()
}
