//! LLM integration for storyforge.
//!
//! This module provides the provider trait the pipeline generates through
//! and a client for the hosted Anthropic Messages API.
//!
//! # Usage
//!
//! ```ignore
//! use storyforge::llm::{AnthropicClient, GenerationRequest, LlmProvider, Message};
//!
//! let client = AnthropicClient::from_env()?;
//!
//! let request = GenerationRequest::new(
//!     "claude-opus-4-1-20250805",
//!     vec![Message::user("Write a one-line pitch for a story about a robot painter.")],
//! )
//! .with_system("You are a master pitch writer.")
//! .with_temperature(0.7)
//! .with_max_tokens(1000);
//!
//! let response = client.generate(request).await?;
//! println!("{}", response.text);
//! ```
//!
//! Stage runners call providers through the [`LlmProvider`] trait, which is
//! the seam tests replace with scripted mock backends.

pub mod client;

pub use client::{
    AnthropicClient, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
