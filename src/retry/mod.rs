//! Retry module (ergonomic namespace)
//! - policy.rs: attempt budget and backoff delays

pub mod policy;

pub use policy::*;
