//! Chat capability trait

use crate::error::LlmError;
use crate::stream::ChatStream;
use crate::types::ChatRequest;
use async_trait::async_trait;

/// A backend able to stream chat completions.
///
/// Implementations must not buffer: events should surface as the backend
/// produces them so partial structured output can be rendered early.
#[async_trait]
pub trait ChatCapability: Send + Sync {
    /// Issue one streaming request. Each call is a fresh backend request.
    async fn chat_stream_request(&self, request: ChatRequest) -> Result<ChatStream, LlmError>;
}
