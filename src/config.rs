// Runtime configuration resolved once at startup.
//
// Values come from environment variables with sensible defaults, the same
// way the API client resolves its gateway URL. The terminal prompts in `ui`
// only override the endpoint and model; everything else is fixed for the
// lifetime of the process and passed by reference into the components.

use crate::error::{AssistantError, Result};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_HTTP_CLIENT: &str = "curl";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Hard limit on a single run of the external HTTP client.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the inference service, e.g. `http://localhost:11434`.
    pub host: String,
    pub model: String,
    /// `None` waits for the inference service indefinitely.
    pub analysis_timeout: Option<Duration>,
    pub command_timeout: Duration,
    /// Program and leading arguments of the external HTTP client.
    pub http_client: Vec<String>,
    /// Hosts the executor may target. Empty allows every host.
    pub allowed_hosts: Vec<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            analysis_timeout: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            http_client: vec![DEFAULT_HTTP_CLIENT.to_string()],
            allowed_hosts: Vec::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Blank values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Config::default();

        let analysis_timeout = match get("CURL_ASSISTANT_ANALYSIS_TIMEOUT_SECS") {
            Some(raw) => Some(parse_secs("CURL_ASSISTANT_ANALYSIS_TIMEOUT_SECS", &raw)?),
            None => None,
        };
        let command_timeout = match get("CURL_ASSISTANT_COMMAND_TIMEOUT_SECS") {
            Some(raw) => parse_secs("CURL_ASSISTANT_COMMAND_TIMEOUT_SECS", &raw)?,
            None => defaults.command_timeout,
        };
        let http_client = get("CURL_ASSISTANT_HTTP_CLIENT")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or(defaults.http_client);
        let allowed_hosts = get("CURL_ASSISTANT_ALLOWED_HOSTS")
            .map(|raw| {
                raw.split(',')
                    .map(|h| h.trim().to_ascii_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Config {
            host: get("OLLAMA_HOST").unwrap_or(defaults.host),
            model: get("OLLAMA_MODEL").unwrap_or(defaults.model),
            analysis_timeout,
            command_timeout,
            http_client,
            allowed_hosts,
            log_level: get("CURL_ASSISTANT_LOG").unwrap_or(defaults.log_level),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the inference endpoint and model, e.g. with the answers to
    /// the startup prompts.
    pub fn with_endpoint(mut self, host: impl Into<String>, model: impl Into<String>) -> Self {
        self.host = host.into();
        self.model = model.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AssistantError::Config("inference host is empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(AssistantError::Config("model name is empty".into()));
        }
        if self.http_client.is_empty() {
            return Err(AssistantError::Config("HTTP client command is empty".into()));
        }
        if self.command_timeout.is_zero() {
            return Err(AssistantError::Config("command timeout must be positive".into()));
        }
        Ok(())
    }

    /// Full URL of the generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.host.trim_end_matches('/'))
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .parse()
        .map_err(|_| AssistantError::Config(format!("{key} must be a whole number of seconds, got `{raw}`")))?;
    if secs == 0 {
        return Err(AssistantError::Config(format!("{key} must be positive")));
    }
    Ok(Duration::from_secs(secs))
}
