//! Backend providers

pub mod openai;
