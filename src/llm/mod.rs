//! LLM layer
//!
//! Stages and the technical advisor speak to a model through [`LlmClient`]
//! with one [`Prompt`] per call. The Anthropic client is the live backend;
//! the disabled and scripted clients cover offline runs and tests.

pub mod anthropic;
pub mod client;
pub mod json;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{DisabledLlmClient, LlmClient, MockLlmClient};
pub use json::{extract_json, parse_reply};
pub use types::{Finish, Prompt, Reply, ReplyFormat, TokenCount};
