//! Core request/response types

pub mod chat;
pub mod tools;

pub use chat::*;
pub use tools::{Tool, ToolChoice, ToolFunction, sanitize_function_name};
