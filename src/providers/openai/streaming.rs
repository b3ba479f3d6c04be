//! OpenAI streaming implementation using eventsource-stream
//!
//! Decodes `chat.completion.chunk` payloads into [`ChatStreamEvent`]s.

use crate::error::LlmError;
use crate::stream::ChatStreamEvent;
use crate::types::{FinishReason, ResponseMetadata, Usage};
use crate::utils::streaming::{EventBuilder, SseEventConverter};
use eventsource_stream::Event;
use serde::Deserialize;

/// OpenAI stream event structure
#[derive(Debug, Clone, Deserialize)]
struct OpenAiStreamEvent {
    id: Option<String>,
    model: Option<String>,
    created: Option<i64>,
    choices: Option<Vec<OpenAiStreamChoice>>,
    usage: Option<OpenAiStreamUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiStreamChoice {
    delta: Option<OpenAiStreamDelta>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCallDelta>>,
}

/// OpenAI tool call delta; only the first fragment of a call has `id`/`name`
#[derive(Debug, Clone, Deserialize)]
struct OpenAiToolCallDelta {
    index: Option<usize>,
    id: Option<String>,
    function: Option<OpenAiFunctionCallDelta>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiFunctionCallDelta {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiStreamUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

/// OpenAI event converter
#[derive(Debug, Default)]
pub struct OpenAiEventConverter {
    stream_started: bool,
    finish_reason: Option<FinishReason>,
}

impl OpenAiEventConverter {
    pub fn new() -> Self {
        Self::default()
    }

    fn convert_openai_event(&mut self, event: OpenAiStreamEvent) -> Vec<ChatStreamEvent> {
        let mut builder = EventBuilder::new();

        if !self.stream_started {
            self.stream_started = true;
            builder = builder.add_stream_start(Self::create_stream_start_metadata(&event));
        }

        for choice in event.choices.iter().flatten() {
            if let Some(delta) = &choice.delta {
                if let Some(content) = delta.content.clone() {
                    builder = builder.add_content_delta(content);
                }
                for call in delta.tool_calls.iter().flatten() {
                    let function = call.function.as_ref();
                    builder = builder.add_tool_call_delta(
                        call.index.unwrap_or(0),
                        call.id.clone(),
                        function.and_then(|f| f.name.clone()),
                        function
                            .and_then(|f| f.arguments.clone())
                            .filter(|a| !a.is_empty()),
                    );
                }
            }
            if let Some(reason) = choice.finish_reason.as_deref() {
                self.finish_reason = Some(FinishReason::from(reason));
            }
        }

        if let Some(usage) = &event.usage {
            builder = builder.add_usage_update(Usage {
                prompt_tokens: usage.prompt_tokens.unwrap_or(0),
                completion_tokens: usage.completion_tokens.unwrap_or(0),
                total_tokens: usage.total_tokens.unwrap_or(0),
            });
        }

        builder.build()
    }

    fn create_stream_start_metadata(event: &OpenAiStreamEvent) -> ResponseMetadata {
        ResponseMetadata {
            id: event.id.clone(),
            model: event.model.clone(),
            created: event
                .created
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .or_else(|| Some(chrono::Utc::now())),
        }
    }
}

impl SseEventConverter for OpenAiEventConverter {
    fn convert_event(&mut self, event: &Event) -> Vec<Result<ChatStreamEvent, LlmError>> {
        match serde_json::from_str::<OpenAiStreamEvent>(&event.data) {
            Ok(openai_event) => self
                .convert_openai_event(openai_event)
                .into_iter()
                .map(Ok)
                .collect(),
            Err(e) => vec![Err(LlmError::ParseError(format!(
                "Failed to parse OpenAI event: {e}"
            )))],
        }
    }

    fn handle_stream_end(&mut self) -> Option<Result<ChatStreamEvent, LlmError>> {
        Some(Ok(ChatStreamEvent::StreamEnd {
            finish_reason: self.finish_reason.take(),
        }))
    }
}
