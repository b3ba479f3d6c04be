//! Provider-agnostic chat stream events

use crate::error::LlmError;
use crate::types::{FinishReason, ResponseMetadata, Usage};
use futures::Stream;
use std::pin::Pin;

/// One decoded event of a streaming chat completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStreamEvent {
    /// First event of every stream
    StreamStart { metadata: ResponseMetadata },
    /// Assistant message text
    ContentDelta { delta: String },
    /// Fragment of a tool call. `id` and `function_name` only arrive on the
    /// first fragment of each call; later fragments are matched by `index`.
    ToolCallDelta {
        index: usize,
        id: Option<String>,
        function_name: Option<String>,
        arguments_delta: Option<String>,
    },
    UsageUpdate { usage: Usage },
    /// Emitted exactly once, after `[DONE]` or when the body ends without it
    StreamEnd { finish_reason: Option<FinishReason> },
}

/// Boxed stream of chat events.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatStreamEvent, LlmError>> + Send>>;
