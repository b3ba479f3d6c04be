//! # hn-stream
//!
//! Streams fabricated Hacker News front pages from an OpenAI-compatible chat
//! backend. Stories and their comment trees are requested as structured
//! output, validated against JSON Schemas while they stream, and rendered as
//! tables after every update.
//!
//! ## Layout
//!
//! - [`providers::openai`]: streaming chat client (SSE over `reqwest`)
//! - [`highlevel::stream_object`]: typed, schema-checked snapshots of one completion
//! - [`session`]: story stream, per-story comment streams, single state owner
//! - [`render`]: terminal tables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hn_stream::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let client = Arc::new(OpenAiClient::from_config(config.openai_config())?);
//!     let session = Session::new(client, config.session_options());
//!
//!     let report = session.run(&mut TerminalRenderer::stdout()).await;
//!     println!("{} stories", report.state.stories.len());
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod highlevel;
pub mod hn;
pub mod providers;
pub mod render;
pub mod retry;
pub mod schema;
pub mod session;
pub mod stream;
pub mod structured_output;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::LlmError;

/// Commonly used items.
pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::error::{ErrorCategory, LlmError};
    pub use crate::highlevel::{ObjectStream, StreamObjectOptions, stream_object};
    pub use crate::hn::{Comment, Story, StoryType};
    pub use crate::providers::openai::{OpenAiClient, OpenAiConfig};
    pub use crate::render::{Renderer, TerminalRenderer};
    pub use crate::retry::RetryPolicy;
    pub use crate::session::{Session, SessionOptions, SessionReport, SessionState};
    pub use crate::stream::{ChatStream, ChatStreamEvent};
    pub use crate::traits::ChatCapability;
    pub use crate::types::{ChatMessage, ChatRequest, GenerateMode, OutputSchema};
}
