//! Chat request/response types shared by the client and the structured requestor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// JSON Schema plus the metadata sent to the model as a named contract.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    /// Contract name (used as the function name in tool mode)
    pub name: String,
    /// Human-readable description used to steer the model
    pub description: Option<String>,
    /// JSON Schema document
    pub schema: serde_json::Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// How the output schema is conveyed to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerateMode {
    /// Force a single function call whose parameters are the schema.
    #[default]
    Tools,
    /// Use the JSON-schema `response_format` and read the message content.
    Json,
}

impl std::str::FromStr for GenerateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tools" | "tool" => Ok(Self::Tools),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown generate mode `{other}` (expected tools or json)")),
        }
    }
}

/// A streaming chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Overrides the client's default model when set
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Structured output contract, if any
    pub output: Option<OutputSchema>,
    pub mode: GenerateMode,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            output: None,
            mode: GenerateMode::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_output(mut self, output: OutputSchema, mode: GenerateMode) -> Self {
        self.output = Some(output);
        self.mode = mode;
        self
    }
}

/// Token usage reported at the end of a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl From<&str> for FinishReason {
    fn from(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Metadata carried by the first event of a stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMetadata {
    pub id: Option<String>,
    pub model: Option<String>,
    pub created: Option<DateTime<Utc>>,
}
