//! Configuration management
//!
//! Runtime settings with sensible defaults, overridable through `TIANYU_*`
//! environment variables. Business rules (channel cutoff, significance
//! threshold, cosmetic policy) are constants of their modules, not settings.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::metrics::DEFAULT_TOP_N;
use crate::parser::DEFAULT_BATCH_SIZE;
use crate::report::assembler::DEFAULT_SUMMARY_TOP_K;
use crate::report::{AnalysisOptions, DEFAULT_TITLE};

/// Prefix of every environment variable read here
pub const ENV_PREFIX: &str = "TIANYU";

const DEFAULT_NARRATIVE_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_NARRATIVE_MODEL: &str = "gpt-4o-mini";
const DEFAULT_NARRATIVE_TIMEOUT_SECS: u64 = 60;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value for a specific field
    #[error("Invalid configuration value for '{field}': {value}\n{hint}")]
    InvalidValue {
        /// Name of the configuration field that has an invalid value
        field: String,
        /// The invalid value that was provided
        value: String,
        /// Helpful hint about how to fix the issue
        hint: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, value: impl ToString, hint: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            hint: hint.to_string(),
        }
    }
}

/// Settings of the remote narrative generator
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    /// Whether to call the remote service at all (default: false)
    pub enabled: bool,
    /// Chat-completion endpoint URL
    pub endpoint: String,
    /// Model name sent with every request
    pub model: String,
    /// Bearer token; requests go out unauthenticated when absent
    pub api_key: Option<String>,
    /// Whole-request timeout (default: 60 seconds)
    pub timeout: Duration,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_NARRATIVE_ENDPOINT.to_string(),
            model: DEFAULT_NARRATIVE_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_NARRATIVE_TIMEOUT_SECS),
        }
    }
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Lines per parser batch (default: 1000)
    pub batch_size: usize,
    /// Items kept in the product ranking (default: 20)
    pub ranking_top_n: usize,
    /// Items quoted in the summary (default: 5)
    pub summary_top_k: usize,
    /// Report title
    pub title: String,
    pub narrative: NarrativeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            ranking_top_n: DEFAULT_TOP_N,
            summary_top_k: DEFAULT_SUMMARY_TOP_K,
            title: DEFAULT_TITLE.to_string(),
            narrative: NarrativeConfig::default(),
        }
    }
}

/// Reads prefixed keys from a lookup function
struct EnvLoader<F> {
    lookup: F,
}

impl<F> EnvLoader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(&format!("{}_{}", ENV_PREFIX, key))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn load_string(&self, key: &str, current: &str) -> String {
        self.get(key).unwrap_or_else(|| current.to_string())
    }

    fn load_parsed<T: FromStr>(&self, key: &str, current: T, hint: &str) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::invalid(&format!("{}_{}", ENV_PREFIX, key), raw, hint)),
            None => Ok(current),
        }
    }

    fn load_bool(&self, key: &str, current: bool) -> Result<bool, ConfigError> {
        match self.get(key).map(|v| v.to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(v) => Err(ConfigError::invalid(
                &format!("{}_{}", ENV_PREFIX, key),
                v,
                "Use true/false, yes/no, on/off or 1/0",
            )),
            None => Ok(current),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `TIANYU_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let loader = EnvLoader { lookup };
        let mut config = Self::default();

        config.batch_size = loader.load_parsed("BATCH_SIZE", config.batch_size, "Expected a positive integer")?;
        config.ranking_top_n = loader.load_parsed("TOP_N", config.ranking_top_n, "Expected a positive integer")?;
        config.summary_top_k = loader.load_parsed("TOP_K", config.summary_top_k, "Expected a positive integer")?;
        config.title = loader.load_string("REPORT_TITLE", &config.title);

        let narrative = &mut config.narrative;
        narrative.enabled = loader.load_bool("NARRATIVE_ENABLED", narrative.enabled)?;
        narrative.endpoint = loader.load_string("NARRATIVE_ENDPOINT", &narrative.endpoint);
        narrative.model = loader.load_string("NARRATIVE_MODEL", &narrative.model);
        narrative.api_key = loader.get("NARRATIVE_API_KEY").or(narrative.api_key.take());
        let timeout_secs = loader.load_parsed(
            "NARRATIVE_TIMEOUT_SECS",
            narrative.timeout.as_secs(),
            "Expected a number of seconds",
        )?;
        narrative.timeout = Duration::from_secs(timeout_secs);

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("batch_size", self.batch_size),
            ("ranking_top_n", self.ranking_top_n),
            ("summary_top_k", self.summary_top_k),
        ];
        if let Some((field, value)) = positive.into_iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::invalid(field, value, "Must be at least 1"));
        }

        if self.narrative.timeout.is_zero() {
            return Err(ConfigError::invalid("narrative.timeout", 0, "Must be at least 1 second"));
        }

        if self.narrative.enabled && !self.narrative.endpoint.starts_with("http") {
            return Err(ConfigError::invalid(
                "narrative.endpoint",
                &self.narrative.endpoint,
                "Must be an http(s) URL when narrative generation is enabled",
            ));
        }

        Ok(())
    }

    /// Options for one analysis run
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            title: self.title.clone(),
            top_n: self.ranking_top_n,
            top_k: self.summary_top_k,
        }
    }
}
