//! SmartShopper configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::Region;

/// Main SmartShopper configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Web search configuration
    pub search: SearchConfig,

    /// Market the searches and prompts target
    pub shopping: ShoppingConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables are set.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        debug!(provider = %self.llm.provider, search = %self.search.provider, "Config::validate: called");
        if self.llm.provider == "anthropic" {
            self.llm.require_api_key()?;
        }

        if let Some(env) = self.search.api_key_env()
            && std::env::var(env).map(|v| v.is_empty()).unwrap_or(true)
        {
            return Err(eyre::eyre!(
                "Search provider '{}' needs an API key. Set the {} environment variable.",
                self.search.provider,
                env
            ));
        }

        if self.shopping.retailers.is_empty() {
            return Err(eyre::eyre!("shopping.retailers must name at least one retailer"));
        }

        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(p) => Some(p.clone()),
            None => Self::candidate_paths().into_iter().find(|p| p.exists()),
        }?;
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    /// Project-local then user config locations
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".smartshopper.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("smartshopper").join("smartshopper.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
///
/// `model`, `api-key-env` and `base-url` fall back to per-provider defaults
/// when left out, so `provider` alone is enough to switch backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" for any OpenAI-compatible endpoint, or "anthropic")
    pub provider: String,

    /// Model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// API base URL
    #[serde(rename = "base-url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            api_key_env: None,
            base_url: None,
            max_tokens: 4096,
            timeout_ms: 300_000,
        }
    }
}

/// Defaults per provider: (model, api-key-env, base-url)
///
/// The openai entry targets a local Ollama server through its
/// OpenAI-compatible endpoint.
fn provider_defaults(provider: &str) -> (&'static str, &'static str, &'static str) {
    match provider {
        "anthropic" => ("claude-sonnet-4-20250514", "ANTHROPIC_API_KEY", "https://api.anthropic.com"),
        _ => ("llama3.2:latest", "OPENAI_API_KEY", "http://localhost:11434"),
    }
}

impl LlmConfig {
    /// Model identifier, configured or the provider default
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(provider_defaults(&self.provider).0)
    }

    /// API key variable name, configured or the provider default
    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(provider_defaults(&self.provider).1)
    }

    /// Base URL without a trailing slash, configured or the provider default
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(provider_defaults(&self.provider).2)
            .trim_end_matches('/')
    }

    /// API key from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(self.api_key_env()).ok().filter(|k| !k.is_empty())
    }

    /// API key, failing when it is missing
    pub fn require_api_key(&self) -> Result<String> {
        self.api_key().ok_or_else(|| {
            eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env()
            )
        })
    }
}

/// How the Searcher agent gathers raw prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Call the search backend directly, once per item
    #[default]
    Direct,
    /// Let the Searcher model call `search_prices` itself
    Agent,
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider: "duckduckgo", "tavily", "brave", "serpapi"
    pub provider: String,

    /// Maximum hits per item
    #[serde(rename = "max-results")]
    pub max_results: usize,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    pub mode: SearchMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: "duckduckgo".to_string(),
            max_results: 5,
            timeout_ms: 30_000,
            mode: SearchMode::Direct,
        }
    }
}

impl SearchConfig {
    /// Environment variable holding the key for keyed providers
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self.provider.as_str() {
            "tavily" => Some("TAVILY_API_KEY"),
            "brave" => Some("BRAVE_API_KEY"),
            "serpapi" => Some("SERPAPI_KEY"),
            _ => None,
        }
    }
}

/// Target market
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoppingConfig {
    /// Country name used in queries and prompts
    pub country: String,

    /// Currency code used in prompts
    pub currency: String,

    /// Retailer names appended to every search query
    pub retailers: Vec<String>,

    /// Region preselected in the picker
    #[serde(rename = "default-region")]
    pub default_region: Region,
}

impl Default for ShoppingConfig {
    fn default() -> Self {
        Self {
            country: "South Africa".to_string(),
            currency: "ZAR".to_string(),
            retailers: ["Makro", "Checkers", "Shoprite", "Woolworths", "PnP"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_region: Region::Gauteng,
        }
    }
}
