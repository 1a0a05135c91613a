//! Application configuration for numberscope.
//!
//! User config lives at `~/.numberscope/numberscope.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NumberScopeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "numberscope.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".numberscope";

/// Placeholder substituted with the number in provider URLs.
pub const NUMBER_PLACEHOLDER: &str = "{number}";

// ---------------------------------------------------------------------------
// Config structs (matching numberscope.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline limits and policy.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// External lookup providers.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// How providers are driven for each number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrchestrationPolicy {
    /// Query in priority order, stop at the first useful result.
    SequentialFallback,
    /// Query all providers concurrently and merge every result.
    #[default]
    ConcurrentMerge,
}

impl std::str::FromStr for OrchestrationPolicy {
    type Err = NumberScopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequential-fallback" | "fallback" => Ok(Self::SequentialFallback),
            "concurrent-merge" | "merge" => Ok(Self::ConcurrentMerge),
            other => Err(NumberScopeError::config(format!(
                "unknown orchestration policy '{other}': expected 'sequential-fallback' or 'concurrent-merge'"
            ))),
        }
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Region assumed for numbers written without a country prefix.
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Maximum numbers processed (and looked up) per request.
    #[serde(default = "default_max_candidates")]
    pub max_candidates_per_request: usize,

    /// Timeout applied to each individual provider call.
    #[serde(default = "default_timeout_secs")]
    pub per_provider_timeout_secs: u64,

    /// Provider orchestration policy.
    #[serde(default)]
    pub policy: OrchestrationPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            max_candidates_per_request: default_max_candidates(),
            per_provider_timeout_secs: default_timeout_secs(),
            policy: OrchestrationPolicy::default(),
        }
    }
}

fn default_region() -> String {
    "US".into()
}
fn default_max_candidates() -> usize {
    3
}
fn default_timeout_secs() -> u64 {
    10
}

/// How the credential is attached to provider requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialPlacement {
    /// `?<param>=<credential>`
    Query { param: String },
    /// `<name>: <credential>`
    Header { name: String },
    /// `Authorization: Bearer <credential>`
    Bearer,
}

/// How the number is written into the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberEncoding {
    /// `+14155552671`
    #[default]
    E164,
    /// `14155552671`
    Digits,
}

/// Dot-separated JSON paths locating each field in a provider response.
///
/// Paths walk objects by key and arrays by index, e.g. `data.carrier.name`
/// or `results.0.line_type`. Unmapped fields are never populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
    /// Path whose presence (non-null, non-false, non-empty) marks an upstream error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `[[providers]]` entry: one external lookup source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name, used for attribution.
    pub name: String,

    /// Endpoint URL; may contain `{number}`.
    pub base_url: String,

    /// Rank in the fixed priority order (lower is consulted first).
    pub priority: u32,

    /// Name of the env var holding the credential (never store the credential itself).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_env: Option<String>,

    /// Where the credential goes in the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialPlacement>,

    /// Query parameter carrying the number (when the URL has no placeholder).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_param: Option<String>,

    #[serde(default)]
    pub number_encoding: NumberEncoding,

    /// Static query parameters added to every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,

    /// Per-provider timeout override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Response field mapping.
    #[serde(default)]
    pub fields: FieldMapping,
}

impl ProviderConfig {
    /// Check that the entry is usable on its own.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(NumberScopeError::config("provider name must not be empty"));
        }

        let sample = self.base_url.replace(NUMBER_PLACEHOLDER, "0");
        Url::parse(&sample).map_err(|e| {
            NumberScopeError::config(format!(
                "provider '{}': invalid base_url '{}': {e}",
                self.name, self.base_url
            ))
        })?;

        if self.number_param.is_none() && !self.base_url.contains(NUMBER_PLACEHOLDER) {
            return Err(NumberScopeError::config(format!(
                "provider '{}': set number_param or put {NUMBER_PLACEHOLDER} in base_url",
                self.name
            )));
        }

        if self.credential.is_some() && self.credential_env.is_none() {
            return Err(NumberScopeError::config(format!(
                "provider '{}': credential placement given without credential_env",
                self.name
            )));
        }

        if self.timeout_secs == Some(0) {
            return Err(NumberScopeError::config(format!(
                "provider '{}': timeout_secs must be positive",
                self.name
            )));
        }

        Ok(())
    }
}

impl AppConfig {
    /// Validate the whole config. Errors here are fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_candidates_per_request == 0 {
            return Err(NumberScopeError::config(
                "max_candidates_per_request must be at least 1",
            ));
        }
        if self.pipeline.per_provider_timeout_secs == 0 {
            return Err(NumberScopeError::config(
                "per_provider_timeout_secs must be positive",
            ));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            provider.validate()?;
            if !seen.insert(provider.name.as_str()) {
                return Err(NumberScopeError::config(format!(
                    "duplicate provider name '{}'",
                    provider.name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pipeline settings (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline settings, merged from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Region hint used when the caller does not give one.
    pub default_region: Option<String>,
    /// Quota of numbers processed per request.
    pub max_candidates_per_request: usize,
    /// Timeout applied to each provider call.
    pub per_provider_timeout: Duration,
    pub policy: OrchestrationPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        let region = config.pipeline.default_region.trim();
        Self {
            default_region: (!region.is_empty()).then(|| region.to_string()),
            max_candidates_per_request: config.pipeline.max_candidates_per_request,
            per_provider_timeout: Duration::from_secs(config.pipeline.per_provider_timeout_secs),
            policy: config.pipeline.policy,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.numberscope/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NumberScopeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.numberscope/numberscope.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NumberScopeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NumberScopeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NumberScopeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NumberScopeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NumberScopeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
