use crate::domain::tag::DEFAULT_TAG_FORMAT;
use crate::domain::{LibraryReleaseContext, TagPattern};
use crate::error::{LibrarianError, Result};
use crate::notes::RepositoryIdentity;
use crate::overflow::github::DEFAULT_API_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file looked up in the working and user config directories
pub const CONFIG_FILE_NAME: &str = "librarian.toml";

/// Represents the complete configuration for librarian-release.
///
/// Contains the downstream and upstream repository identities, overflow
/// settings, tag format and the per-library release state.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_repository")]
    pub repository: RepositoryIdentity,

    #[serde(default = "default_upstream")]
    pub upstream: RepositoryIdentity,

    #[serde(default)]
    pub overflow: OverflowConfig,

    #[serde(default = "default_tag_format")]
    pub tag_format: String,

    /// Language container image, echoed in pull-request preambles
    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub libraries: Vec<LibraryReleaseContext>,
}

fn default_repository() -> RepositoryIdentity {
    RepositoryIdentity::github("", "")
}

fn default_upstream() -> RepositoryIdentity {
    RepositoryIdentity::github("googleapis", "googleapis")
}

fn default_tag_format() -> String {
    DEFAULT_TAG_FORMAT.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Settings for offloading oversized pull-request bodies.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OverflowConfig {
    /// Inline size limit in bytes; zero or negative selects the default
    #[serde(default)]
    pub max_content_size: i64,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for OverflowConfig {
    fn default() -> Self {
        OverflowConfig {
            max_content_size: 0,
            api_url: default_api_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            repository: default_repository(),
            upstream: default_upstream(),
            overflow: OverflowConfig::default(),
            tag_format: default_tag_format(),
            image: String::new(),
            libraries: Vec::new(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| LibrarianError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The tag pattern described by `tag_format`
    pub fn tag_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(self.tag_format.clone())
    }

    fn validate(&self) -> Result<()> {
        self.tag_pattern()?;

        let mut seen = Vec::new();
        for library in &self.libraries {
            if library.id.trim().is_empty() {
                return Err(LibrarianError::config("library with empty id"));
            }
            if seen.contains(&library.id.as_str()) {
                return Err(LibrarianError::config(format!(
                    "duplicate library id '{}'",
                    library.id
                )));
            }
            seen.push(library.id.as_str());
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `librarian.toml` in current directory
/// 3. `librarian.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);

    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)
            .map_err(|e| LibrarianError::config(format!("cannot read '{}': {}", path, e)))?
    } else if local.exists() {
        fs::read_to_string(&local)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    Config::from_toml(&config_str)
}
