//! Common Streaming Utilities
//!
//! Turns an HTTP response carrying server-sent events into a [`ChatStream`]
//! using eventsource-stream for UTF-8 boundaries, line buffering and SSE
//! parsing. Provider specifics live behind [`SseEventConverter`].

use crate::error::LlmError;
use crate::stream::{ChatStream, ChatStreamEvent};
use crate::types::{ResponseMetadata, Usage};
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures_util::StreamExt;

/// Converts provider-specific SSE events into zero or more [`ChatStreamEvent`]s.
///
/// Converters are driven sequentially by a single stream, so they may keep
/// per-stream state behind `&mut self`.
pub trait SseEventConverter: Send {
    /// Convert one SSE event
    fn convert_event(&mut self, event: &Event) -> Vec<Result<ChatStreamEvent, LlmError>>;

    /// Produce the terminal event, called once on `[DONE]` or end of body
    fn handle_stream_end(&mut self) -> Option<Result<ChatStreamEvent, LlmError>> {
        None
    }
}

/// Stream factory for creating provider streams
pub struct StreamFactory;

impl StreamFactory {
    /// Send the request and expose its SSE body as a chat stream.
    ///
    /// Transport failures before the first byte become `BackendUnavailable`;
    /// non-2xx statuses become `ApiError`. The returned stream always ends
    /// with the converter's terminal event unless a transport error cut it
    /// short.
    pub async fn create_eventsource_stream<C>(
        request_builder: reqwest::RequestBuilder,
        mut converter: C,
    ) -> Result<ChatStream, LlmError>
    where
        C: SseEventConverter + 'static,
    {
        let response = request_builder
            .send()
            .await
            .map_err(|e| LlmError::BackendUnavailable(format!("Failed to send request: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error_from_body(status, &error_text));
        }

        let mut events = Box::pin(response.bytes_stream().eventsource());

        let chat_stream = async_stream::stream! {
            let mut finished = false;
            while let Some(event_result) = events.next().await {
                match event_result {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data == "[DONE]" {
                            if let Some(end_event) = converter.handle_stream_end() {
                                yield end_event;
                            }
                            finished = true;
                            break;
                        }
                        if data.is_empty() {
                            continue;
                        }
                        for converted in converter.convert_event(&event) {
                            yield converted;
                        }
                    }
                    Err(EventStreamError::Transport(e)) => {
                        yield Err(LlmError::BackendUnavailable(format!("Stream interrupted: {e}")));
                        finished = true;
                        break;
                    }
                    Err(e) => {
                        yield Err(LlmError::StreamError(format!("SSE parsing error: {e}")));
                        finished = true;
                        break;
                    }
                }
            }
            if !finished {
                tracing::debug!("SSE body ended without [DONE] marker");
                if let Some(end_event) = converter.handle_stream_end() {
                    yield end_event;
                }
            }
        };

        Ok(Box::pin(chat_stream))
    }
}

/// Build an `ApiError` from a non-success body, preferring the
/// `{"error": {"message": ...}}` shape.
pub fn api_error_from_body(status: u16, body: &str) -> LlmError {
    let details = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = details
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        });
    LlmError::ApiError {
        code: status,
        message,
        details,
    }
}

/// Helper utilities for efficient event building
pub struct EventBuilder {
    events: Vec<ChatStreamEvent>,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(2), // most chunks produce 1-2 events
        }
    }

    pub fn add_stream_start(mut self, metadata: ResponseMetadata) -> Self {
        self.events.push(ChatStreamEvent::StreamStart { metadata });
        self
    }

    /// Add a ContentDelta event (only if delta is not empty)
    pub fn add_content_delta(mut self, delta: String) -> Self {
        if !delta.is_empty() {
            self.events.push(ChatStreamEvent::ContentDelta { delta });
        }
        self
    }

    pub fn add_tool_call_delta(
        mut self,
        index: usize,
        id: Option<String>,
        function_name: Option<String>,
        arguments_delta: Option<String>,
    ) -> Self {
        self.events.push(ChatStreamEvent::ToolCallDelta {
            index,
            id,
            function_name,
            arguments_delta,
        });
        self
    }

    pub fn add_usage_update(mut self, usage: Usage) -> Self {
        self.events.push(ChatStreamEvent::UsageUpdate { usage });
        self
    }

    pub fn build(self) -> Vec<ChatStreamEvent> {
        self.events
    }
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new()
    }
}
