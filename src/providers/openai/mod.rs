//! OpenAI-compatible chat completions backend

pub mod client;
pub mod config;
pub mod streaming;

pub use client::OpenAiClient;
pub use config::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiConfig};
pub use streaming::OpenAiEventConverter;
