//! LLM client trait and the in-process implementations

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DealflowError, Result};
use crate::llm::types::{Prompt, Reply};

/// Answers one prompt at a time; calls share no conversation state
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<Reply>;

    fn model(&self) -> &str;
}

/// Client used when no credentials are configured. Every call fails, so
/// stages fall back to their deterministic defaults.
#[derive(Debug, Default)]
pub struct DisabledLlmClient;

#[async_trait]
impl LlmClient for DisabledLlmClient {
    async fn complete(&self, _prompt: &Prompt) -> Result<Reply> {
        Err(DealflowError::Llm("no LLM configured (set ANTHROPIC_API_KEY)".to_string()))
    }

    fn model(&self) -> &str {
        "disabled"
    }
}

/// Scripted client for tests: replays queued replies in order and records
/// every prompt it saw. An exhausted queue yields an error.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Result<Reply>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl MockLlmClient {
    /// Queue plain text replies
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(texts.into_iter().map(|t| Ok(Reply::complete(t))).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: Reply) {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(Ok(reply));
        }
    }

    pub fn push_error(&self, message: impl Into<String>) {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(Err(DealflowError::Llm(message.into())));
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &Prompt) -> Result<Reply> {
        if let Ok(mut seen) = self.prompts.lock() {
            seen.push(prompt.clone());
        }
        let next = self
            .replies
            .lock()
            .map_err(|_| DealflowError::Llm("mock queue poisoned".to_string()))?
            .pop_front();
        next.unwrap_or_else(|| Err(DealflowError::Llm("mock reply queue exhausted".to_string())))
    }

    fn model(&self) -> &str {
        "mock"
    }
}
