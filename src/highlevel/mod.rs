//! High-level structured generation APIs

pub mod object;

pub use object::{ObjectStream, StreamObjectOptions, stream_object};
