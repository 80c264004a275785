//! Schema module
//!
//! Wire formats for each upstream provider.

pub mod anthropic;
pub mod gemini;
pub mod openai;
