//! Streaming structured object generation
//!
//! [`stream_object`] sends one streaming completion request carrying an
//! output schema and yields a typed snapshot every time the decoded value
//! grows. Snapshots are cumulative: each one holds everything received so far
//! for this request, so consumers replace rather than merge.
//!
//! Failed attempts are retried according to the [`RetryPolicy`] as long as
//! nothing has been yielded yet. After the first snapshot the sequence is
//! committed to that attempt and any failure ends it.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LlmError;
use crate::retry::RetryPolicy;
use crate::stream::ChatStreamEvent;
use crate::structured_output::{RepairFn, StructuredDecoder, decode_typed};
use crate::traits::ChatCapability;
use crate::types::{ChatMessage, ChatRequest, GenerateMode, OutputSchema};

/// Lazy sequence of typed snapshots.
pub type ObjectStream<T> = Pin<Box<dyn Stream<Item = Result<T, LlmError>> + Send>>;

/// Options for [`stream_object`].
#[derive(Clone)]
pub struct StreamObjectOptions {
    /// Declared shape of the result, sent to the backend and used for validation.
    pub schema: OutputSchema,
    /// How the schema is conveyed to the backend.
    pub mode: GenerateMode,
    /// Attempt budget and backoff between attempts.
    pub retry: RetryPolicy,
    /// Overrides the client's default model.
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Custom repair for the final text; the built-in repair is used otherwise.
    pub repair_text: Option<RepairFn>,
    pub max_repair_rounds: usize,
}

impl std::fmt::Debug for StreamObjectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamObjectOptions")
            .field("schema", &self.schema.name)
            .field("mode", &self.mode)
            .field("retry", &self.retry)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_repair_rounds", &self.max_repair_rounds)
            .finish_non_exhaustive()
    }
}

impl StreamObjectOptions {
    pub fn new(schema: OutputSchema) -> Self {
        Self {
            schema,
            mode: GenerateMode::default(),
            retry: RetryPolicy::default(),
            model: None,
            temperature: None,
            repair_text: None,
            max_repair_rounds: 1,
        }
    }

    pub const fn with_mode(mut self, mode: GenerateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_repair(mut self, repair: RepairFn) -> Self {
        self.repair_text = Some(repair);
        self
    }

    fn decoder(&self) -> Result<StructuredDecoder, LlmError> {
        let decoder =
            StructuredDecoder::new(&self.schema)?.with_max_repair_rounds(self.max_repair_rounds);
        Ok(match &self.repair_text {
            Some(repair) => decoder.with_repair(repair.clone()),
            None => decoder,
        })
    }

    fn request(&self, messages: &[ChatMessage]) -> ChatRequest {
        let mut request =
            ChatRequest::new(messages.to_vec()).with_output(self.schema.clone(), self.mode);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }
}

/// Collects the model's output text for one attempt.
///
/// Tool-call arguments win over message content: in tool mode the object
/// arrives as arguments, and any content is commentary.
#[derive(Debug, Default)]
struct ObjectAccumulator {
    tool_args: String,
    content: String,
}

impl ObjectAccumulator {
    /// Feed one event; returns true if the decodable text grew.
    fn push(&mut self, event: ChatStreamEvent) -> bool {
        match event {
            ChatStreamEvent::ToolCallDelta {
                index: 0,
                arguments_delta: Some(delta),
                ..
            } if !delta.is_empty() => {
                self.tool_args.push_str(&delta);
                true
            }
            ChatStreamEvent::ContentDelta { delta } if !delta.is_empty() => {
                self.content.push_str(&delta);
                self.tool_args.is_empty()
            }
            ChatStreamEvent::UsageUpdate { usage } => {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "structured completion usage"
                );
                false
            }
            ChatStreamEvent::StreamEnd {
                finish_reason: Some(reason),
            } => {
                tracing::debug!(?reason, "structured completion finished");
                false
            }
            _ => false,
        }
    }

    fn text(&self) -> &str {
        if self.tool_args.is_empty() {
            &self.content
        } else {
            &self.tool_args
        }
    }
}

/// Stream typed snapshots of a structured completion.
///
/// Nothing is sent until the returned stream is first polled. Each yielded
/// value was decoded from a snapshot that validated against the schema with
/// `required` relaxed; the last one additionally passed the full schema. A
/// value identical to the previous snapshot is not yielded again.
pub fn stream_object<T, M>(
    model: Arc<M>,
    messages: Vec<ChatMessage>,
    opts: StreamObjectOptions,
) -> ObjectStream<T>
where
    T: DeserializeOwned + Send + 'static,
    M: ChatCapability + ?Sized + 'static,
{
    let s = async_stream::try_stream! {
        let decoder = opts.decoder()?;
        let policy = opts.retry.clone();
        let mut attempts = 0u32;
        let mut emitted = false;
        let mut last: Option<Value> = None;

        loop {
            attempts += 1;
            let outcome: Result<Value, LlmError> = 'attempt: {
                let mut events = match model.chat_stream_request(opts.request(&messages)).await {
                    Ok(events) => events,
                    Err(e) => break 'attempt Err(e),
                };
                let mut acc = ObjectAccumulator::default();
                while let Some(item) = events.next().await {
                    let event = match item {
                        Ok(event) => event,
                        Err(e) => break 'attempt Err(e),
                    };
                    if !acc.push(event) {
                        continue;
                    }
                    match decoder.decode_partial(acc.text()) {
                        Ok(Some(value)) if last.as_ref() != Some(&value) => {
                            let typed = match decode_typed::<T>(value.clone()) {
                                Ok(typed) => typed,
                                Err(e) => break 'attempt Err(e),
                            };
                            last = Some(value);
                            emitted = true;
                            yield typed;
                        }
                        Ok(_) => {}
                        Err(e) => break 'attempt Err(e),
                    }
                }
                decoder.decode_final(acc.text())
            };

            match outcome {
                Ok(value) => {
                    if last.as_ref() != Some(&value) {
                        yield decode_typed::<T>(value)?;
                    }
                    break;
                }
                Err(e) => {
                    if !emitted && policy.has_attempts_left(attempts) && policy.should_retry(&e) {
                        let delay = policy.calculate_delay(attempts - 1);
                        tracing::debug!(
                            schema = %opts.schema.name,
                            attempt = attempts,
                            ?delay,
                            "structured completion attempt failed, retrying: {}",
                            e
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        schema = %opts.schema.name,
                        attempts,
                        "structured completion failed: {}",
                        e
                    );
                    Err::<(), LlmError>(e)?;
                    break;
                }
            }
        }
    };
    Box::pin(s)
}
