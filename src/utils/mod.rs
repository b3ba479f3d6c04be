//! Utility modules
//!
//! SSE plumbing shared by providers.

pub mod streaming;

pub use streaming::*;
