//! Application configuration from the process environment.
//!
//! | variable | default |
//! |---|---|
//! | `OPENAI_API_KEY` | unset |
//! | `OPENAI_ORG_ID` | unset |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `HN_STREAM_MODEL` | `gpt-4` |
//! | `HN_STREAM_STORIES` | `5` |
//! | `HN_STREAM_MAX_RETRIES` | `3` |
//! | `HN_STREAM_MODE` | `tools` |
//! | `HN_STREAM_TIMEOUT_SECS` | unset |
//!
//! Missing credentials are not an error: requests then go out without the
//! corresponding headers and the backend decides.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::LlmError;
use crate::providers::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiConfig};
use crate::retry::RetryPolicy;
use crate::session::SessionOptions;
use crate::types::GenerateMode;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ORG_ID: &str = "OPENAI_ORG_ID";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "HN_STREAM_MODEL";
pub const ENV_STORIES: &str = "HN_STREAM_STORIES";
pub const ENV_MAX_RETRIES: &str = "HN_STREAM_MAX_RETRIES";
pub const ENV_MODE: &str = "HN_STREAM_MODE";
pub const ENV_TIMEOUT_SECS: &str = "HN_STREAM_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<SecretString>,
    pub organization: Option<String>,
    pub base_url: String,
    pub model: String,
    pub story_count: usize,
    pub max_attempts: u32,
    pub mode: GenerateMode,
    pub timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            organization: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            story_count: 5,
            max_attempts: 3,
            mode: GenerateMode::Tools,
            timeout: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.api_key = get(ENV_API_KEY).map(SecretString::from);
        config.organization = get(ENV_ORG_ID);
        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(count) = get(ENV_STORIES) {
            config.story_count = parse_number(ENV_STORIES, &count)?;
            if config.story_count == 0 {
                return Err(LlmError::ConfigurationError(format!(
                    "{ENV_STORIES} must be at least 1"
                )));
            }
        }
        if let Some(retries) = get(ENV_MAX_RETRIES) {
            config.max_attempts = parse_number(ENV_MAX_RETRIES, &retries)?;
            if config.max_attempts == 0 {
                return Err(LlmError::ConfigurationError(format!(
                    "{ENV_MAX_RETRIES} must be at least 1"
                )));
            }
        }
        if let Some(mode) = get(ENV_MODE) {
            config.mode = mode.parse().map_err(|_| {
                LlmError::ConfigurationError(format!(
                    "{ENV_MODE} must be 'tools' or 'json', got '{mode}'"
                ))
            })?;
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            config.timeout = Some(Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &secs)?));
        }

        Ok(config)
    }

    pub fn openai_config(&self) -> OpenAiConfig {
        let mut config = OpenAiConfig::default()
            .with_base_url(self.base_url.clone())
            .with_model(self.model.clone());
        config.api_key = self.api_key.clone();
        if let Some(org) = &self.organization {
            config = config.with_organization(org.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            story_count: self.story_count,
            mode: self.mode,
            retry: RetryPolicy::default().with_max_attempts(self.max_attempts),
            model: None,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, LlmError> {
    value.trim().parse().map_err(|_| {
        LlmError::ConfigurationError(format!("{key} must be a non-negative integer, got '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, LlmError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.api_key.is_none());
        assert!(config.organization.is_none());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.story_count, 5);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.mode, GenerateMode::Tools);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn reads_every_variable() {
        let config = config(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_ORG_ID, "org-1"),
            (ENV_BASE_URL, "http://localhost:8080/v1"),
            (ENV_MODEL, "gpt-4o-mini"),
            (ENV_STORIES, "3"),
            (ENV_MAX_RETRIES, "1"),
            (ENV_MODE, "json"),
            (ENV_TIMEOUT_SECS, "30"),
        ])
        .unwrap();
        assert_eq!(config.api_key.as_ref().unwrap().expose_secret(), "sk-test");
        assert_eq!(config.organization.as_deref(), Some("org-1"));
        assert_eq!(config.story_count, 3);
        assert_eq!(config.mode, GenerateMode::Json);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));

        let openai = config.openai_config();
        assert_eq!(openai.base_url, "http://localhost:8080/v1");
        assert_eq!(openai.model, "gpt-4o-mini");

        let options = config.session_options();
        assert_eq!(options.story_count, 3);
        assert_eq!(options.retry.max_attempts, 1);
    }

    #[test]
    fn blank_credentials_are_unset() {
        let config = config(&[(ENV_API_KEY, "  "), (ENV_ORG_ID, "")]).unwrap();
        assert!(config.api_key.is_none());
        assert!(config.organization.is_none());
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        for vars in [
            [(ENV_STORIES, "five")],
            [(ENV_STORIES, "0")],
            [(ENV_MAX_RETRIES, "-1")],
            [(ENV_MAX_RETRIES, "0")],
            [(ENV_MODE, "yaml")],
            [(ENV_TIMEOUT_SECS, "soon")],
        ] {
            assert!(
                matches!(config(&vars), Err(LlmError::ConfigurationError(_))),
                "{vars:?}"
            );
        }
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = config(&[(ENV_API_KEY, "sk-very-secret")]).unwrap();
        assert!(!format!("{config:?}").contains("sk-very-secret"));
    }
}
