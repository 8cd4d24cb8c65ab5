// LLM module

pub mod client;
pub mod fallback;
pub mod prompts;

pub use client::LlmClient;
pub use prompts::*;
