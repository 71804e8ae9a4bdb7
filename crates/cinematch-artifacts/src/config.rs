use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::provider::{ArtifactSpec, SourcingStrategy};

/// Public Google Drive direct-download endpoint; `{id}` is the file ID.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://drive.google.com/uc?export=download&confirm=t&id={id}";

/// Configuration for cinematch.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CINEMATCH_* prefix)
/// 3. Config file (~/.config/cinematch/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where artifacts come from.
    ///
    /// Can be set via:
    /// - CLI: --strategy local-only
    /// - ENV: CINEMATCH_STRATEGY=local_only
    /// - Config: strategy = "download_to_cache_dir"
    #[serde(default)]
    pub strategy: SourcingStrategy,

    /// Directory used by the `download_to_cache_dir` strategy.
    ///
    /// Default: ~/.cache/cinematch (or platform equivalent)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Local path of the catalog artifact.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Local path of the similarity artifact.
    #[serde(default = "default_similarity_path")]
    pub similarity_path: PathBuf,

    /// Remote identifier of the catalog artifact.
    #[serde(default)]
    pub catalog_remote_id: Option<String>,

    /// Remote identifier of the similarity artifact.
    #[serde(default)]
    pub similarity_remote_id: Option<String>,

    /// Download URL with an `{id}` placeholder.
    #[serde(default = "default_url_template")]
    pub remote_url_template: String,

    /// Upper bound, in seconds, on resolving one artifact, retries included.
    ///
    /// Each HTTP attempt gets an equal share of it.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient download failures.
    #[serde(default = "default_download_retries")]
    pub download_retries: usize,

    /// Logging options handed to twyg.
    #[serde(default)]
    pub logging: twyg::Opts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: SourcingStrategy::default(),
            cache_dir: None,
            catalog_path: default_catalog_path(),
            similarity_path: default_similarity_path(),
            catalog_remote_id: None,
            similarity_remote_id: None,
            remote_url_template: default_url_template(),
            request_timeout_secs: default_request_timeout_secs(),
            download_retries: default_download_retries(),
            logging: twyg::Opts::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/cinematch/config.toml
    /// Reads environment variables with CINEMATCH_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("cinematch");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// The cache directory in effect: the configured one, or the default.
    #[must_use]
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Artifact specification for the catalog.
    #[must_use]
    pub fn catalog_spec(&self) -> ArtifactSpec {
        ArtifactSpec::new("catalog", &self.catalog_path)
            .with_remote_id(self.catalog_remote_id.clone())
    }

    /// Artifact specification for the similarity matrix.
    #[must_use]
    pub fn similarity_spec(&self) -> ArtifactSpec {
        ArtifactSpec::new("similarity", &self.similarity_path)
            .with_remote_id(self.similarity_remote_id.clone())
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("movie_list.json")
}

fn default_similarity_path() -> PathBuf {
    PathBuf::from("similarity.json")
}

fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    120
}

const fn default_download_retries() -> usize {
    3
}

/// Get the default artifact cache directory.
///
/// Returns: ~/.cache/cinematch (or platform equivalent)
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cinematch")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/cinematch/config.toml
/// - macOS: ~/Library/Application Support/cinematch/config.toml
/// - Windows: %APPDATA%\cinematch\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cinematch")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Cinematch Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CINEMATCH_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Where the catalog and similarity artifacts come from:
# - "local_only":            read local files, never download
# - "download_to_path":      download missing files to catalog_path / similarity_path
# - "download_to_cache_dir": download missing files into cache_dir
strategy = "download_to_cache_dir"

# Local artifact paths. In download_to_cache_dir mode only the file name is used.
catalog_path = "movie_list.json"
similarity_path = "similarity.json"

# Remote identifiers for the artifacts (for example Google Drive file IDs)
#catalog_remote_id = "your-catalog-file-id"
#similarity_remote_id = "your-similarity-file-id"

# Download URL; {id} is replaced with the remote identifier
#remote_url_template = "https://drive.google.com/uc?export=download&confirm=t&id={id}"

# Default: Platform-specific cache directory
#cache_dir = "/path/to/cache"

# Upper bound on resolving one artifact, in seconds, retries included.
# Each download attempt gets an equal share of it.
request_timeout_secs = 120

# Retries for transient download failures
download_retries = 3
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
