//! Anthropic Messages API client
//!
//! Sends each [`Prompt`] as a single user turn at temperature 0 and folds the
//! text blocks of the answer into one [`Reply`]. Rate limits, overloads and
//! transport timeouts are retried a bounded number of times.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{DealflowError, Result};
use crate::llm::client::LlmClient;
use crate::llm::types::{Finish, Prompt, Reply, ReplyFormat, TokenCount};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Appended to the system prompt of JSON prompts
const JSON_ONLY: &str = "Respond with a single JSON value and nothing else. Do not add commentary.";

/// Upper bound on any single wait between attempts
const MAX_RETRY_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub model: String,
    pub timeout: Duration,
    /// Extra attempts after a transient failure
    pub max_retries: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(300),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: [UserTurn<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Why one attempt failed
#[derive(Debug)]
enum AttemptError {
    /// Worth another try after `wait`
    Transient { wait: Option<Duration>, reason: String },
    Fatal(DealflowError),
}

pub struct AnthropicClient {
    http: Client,
    api_key: String,
    config: AnthropicConfig,
}

impl AnthropicClient {
    /// Reads ANTHROPIC_API_KEY from the environment
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DealflowError::Llm("ANTHROPIC_API_KEY not set".to_string()))?;
        Self::with_api_key(api_key, config)
    }

    pub fn with_api_key(api_key: String, config: AnthropicConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DealflowError::Llm(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, api_key, config })
    }

    fn request_body<'a>(&'a self, prompt: &'a Prompt) -> MessagesRequest<'a> {
        let system = match prompt.format {
            ReplyFormat::Json => format!("{}\n\n{}", prompt.system, JSON_ONLY),
            ReplyFormat::Prose => prompt.system.clone(),
        };
        MessagesRequest {
            model: &self.config.model,
            max_tokens: prompt.max_tokens,
            temperature: 0.0,
            system,
            messages: [UserTurn {
                role: "user",
                content: &prompt.instruction,
            }],
        }
    }

    async fn attempt(&self, body: &MessagesRequest<'_>) -> std::result::Result<MessagesResponse, AttemptError> {
        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AttemptError::Transient {
                        wait: None,
                        reason: format!("request failed: {}", e),
                    }
                } else {
                    AttemptError::Fatal(DealflowError::Llm(format!("request failed: {}", e)))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AttemptError::Fatal(DealflowError::Llm(format!("unreadable response: {}", e))));
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();
        let reason = error_message(status, &body);

        if is_transient(status) {
            Err(AttemptError::Transient {
                wait: retry_after,
                reason,
            })
        } else {
            Err(AttemptError::Fatal(DealflowError::Llm(reason)))
        }
    }

    async fn send(&self, body: &MessagesRequest<'_>) -> Result<MessagesResponse> {
        let mut retries = 0;
        loop {
            match self.attempt(body).await {
                Ok(response) => return Ok(response),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient { reason, .. }) if retries >= self.config.max_retries => {
                    return Err(DealflowError::Llm(format!("{} (gave up after {} retries)", reason, retries)));
                }
                Err(AttemptError::Transient { wait, reason }) => {
                    retries += 1;
                    let delay = retry_delay(wait, retries);
                    warn!(
                        "anthropic: {}; retry {}/{} in {:?}",
                        reason, retries, self.config.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Statuses worth retrying: rate limits, overloads and gateway trouble
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 529 || status.is_server_error()
}

/// Server-requested wait when given, else exponential backoff from one second
fn retry_delay(requested: Option<Duration>, retry: u32) -> Duration {
    requested
        .unwrap_or_else(|| Duration::from_secs(1u64 << retry.saturating_sub(1).min(4)))
        .min(MAX_RETRY_WAIT)
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => format!("API error {} ({}): {}", status, parsed.error.kind, parsed.error.message),
        Err(_) => {
            let preview: String = body.chars().take(200).collect();
            format!("API error {}: {}", status, preview)
        }
    }
}

fn into_reply(response: MessagesResponse) -> Reply {
    let text = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect::<String>();
    Reply {
        text,
        finish: Finish::from_stop_reason(response.stop_reason.as_deref()),
        tokens: TokenCount {
            input: response.usage.input_tokens,
            output: response.usage.output_tokens,
        },
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &Prompt) -> Result<Reply> {
        let body = self.request_body(prompt);
        let reply = into_reply(self.send(&body).await?);
        debug!(
            "anthropic: {} in / {} out tokens, {:?}",
            reply.tokens.input, reply.tokens.output, reply.finish
        );
        if reply.finish == Finish::Truncated {
            warn!("anthropic: reply hit max_tokens={}", prompt.max_tokens);
        }
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("max_retries", &self.config.max_retries)
            .finish()
    }
}
