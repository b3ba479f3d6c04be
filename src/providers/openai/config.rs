//! `OpenAI` configuration
//!
//! Credentials are optional: an unset key or organization simply omits the
//! corresponding header and leaves the backend to reject the request.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Connection and authentication settings for an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token (`OPENAI_API_KEY`)
    pub api_key: Option<SecretString>,
    /// Organization id (`OPENAI_ORG_ID`)
    pub organization: Option<String>,
    pub base_url: String,
    /// Default model for requests that do not name one
    pub model: String,
    /// Whole-request timeout; `None` defers to the backend
    pub timeout: Option<Duration>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            organization: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Request headers derived from the credentials that are set.
    pub fn get_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();

        if let Some(key) = self
            .api_key
            .as_ref()
            .filter(|k| !k.expose_secret().is_empty())
        {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", key.expose_secret()),
            );
        }
        if let Some(org) = self.organization.as_ref().filter(|o| !o.is_empty()) {
            headers.insert("OpenAI-Organization".to_string(), org.clone());
        }
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        headers
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        if self.base_url.is_empty() {
            return Err(LlmError::ConfigurationError(
                "Base URL cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(LlmError::ConfigurationError(format!(
                "Base URL must start with http:// or https://, got `{}`",
                self.base_url
            )));
        }

        if self.model.trim().is_empty() {
            return Err(LlmError::ConfigurationError(
                "Model cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
