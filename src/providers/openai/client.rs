//! `OpenAI` Client Implementation
//!
//! Streams chat completions from `{base_url}/chat/completions` and encodes
//! structured output contracts either as a forced function call or as a
//! JSON-schema `response_format`.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::LlmError;
use crate::stream::ChatStream;
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, GenerateMode, Tool, ToolChoice, sanitize_function_name};
use crate::utils::streaming::StreamFactory;

use super::config::OpenAiConfig;
use super::streaming::OpenAiEventConverter;

/// `OpenAI` Client
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    /// Shared HTTP client; connections are pooled across requests
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("provider_name", &"openai")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .field("has_api_key", &self.config.api_key.is_some())
            .field("has_organization", &self.config.organization.is_some())
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Validate the config and build a dedicated HTTP client honouring its timeout.
    pub fn from_config(config: OpenAiConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::new(config, http_client))
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Build the JSON body for a streaming chat completion.
    pub fn build_chat_request_body(&self, request: &ChatRequest) -> Result<Value, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidInput(
                "Chat request needs at least one message".to_string(),
            ));
        }

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());

        let mut body = json!({
            "model": model,
            "messages": request.messages,
            "stream": true,
            "stream_options": { "include_usage": true },
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(output) = &request.output {
            let name = sanitize_function_name(&output.name);
            let description = output
                .description
                .clone()
                .unwrap_or_else(|| "Return the final JSON object by calling this tool".to_string());
            match request.mode {
                GenerateMode::Tools => {
                    let tool = Tool::function(name.clone(), description, output.schema.clone());
                    body["tools"] = serde_json::to_value(vec![tool])?;
                    body["tool_choice"] = serde_json::to_value(ToolChoice::function(name))?;
                }
                GenerateMode::Json => {
                    body["response_format"] = json!({
                        "type": "json_schema",
                        "json_schema": {
                            "name": name,
                            "description": description,
                            "strict": false,
                            "schema": output.schema,
                        }
                    });
                }
            }
        }

        Ok(body)
    }

    fn build_headers(&self) -> Result<reqwest::header::HeaderMap, LlmError> {
        let mut headers = reqwest::header::HeaderMap::new();
        for (key, value) in self.config.get_headers() {
            let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| LlmError::ConfigurationError(format!("Invalid header name: {e}")))?;
            let header_value = reqwest::header::HeaderValue::from_str(&value)
                .map_err(|e| LlmError::ConfigurationError(format!("Invalid header value: {e}")))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ChatCapability for OpenAiClient {
    async fn chat_stream_request(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = self.build_chat_request_body(&request)?;
        let headers = self.build_headers()?;

        tracing::debug!(
            url = %url,
            model = body["model"].as_str().unwrap_or_default(),
            mode = ?request.mode,
            "sending streaming chat request"
        );

        let request_builder = self.http_client.post(&url).headers(headers).json(&body);
        StreamFactory::create_eventsource_stream(request_builder, OpenAiEventConverter::new()).await
    }
}
