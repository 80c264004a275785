//! LLM comparison service library
//!
//! Sends one prompt to a fixed catalog of Gemini, ChatGPT and Claude models
//! concurrently and returns every model's answer keyed by model id.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod services;

// Re-export commonly used types
pub use config::Settings;
pub use error::ApiError;
pub use server::App;
