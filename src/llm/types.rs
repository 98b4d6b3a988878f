//! Prompt and reply types for single-shot analyst calls
//!
//! Every stage call is one stateless exchange. The system prompt sets the
//! analyst role, one instruction carries the context, and the reply is
//! either a JSON payload or a block of prose.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DealflowError, Result};
use crate::llm::json::parse_reply;

/// Shape of the reply a prompt asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyFormat {
    Json,
    Prose,
}

/// One analyst call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub instruction: String,
    pub max_tokens: u32,
    pub format: ReplyFormat,
}

impl Prompt {
    /// A prompt whose reply must carry a JSON object or array
    pub fn json(system: impl Into<String>, instruction: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            instruction: instruction.into(),
            max_tokens,
            format: ReplyFormat::Json,
        }
    }

    /// A prompt answered in free text
    pub fn prose(system: impl Into<String>, instruction: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            format: ReplyFormat::Prose,
            ..Self::json(system, instruction, max_tokens)
        }
    }
}

/// How generation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Finish {
    #[default]
    Complete,
    /// Cut off at the token budget
    Truncated,
}

impl Finish {
    pub fn from_stop_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("max_tokens") => Finish::Truncated,
            _ => Finish::Complete,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCount {
    pub input: u64,
    pub output: u64,
}

/// Text returned for one prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub finish: Finish,
    pub tokens: TokenCount,
}

impl Reply {
    pub fn complete(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Decode the JSON payload. A truncated reply is refused before parsing.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.finish == Finish::Truncated {
            return Err(DealflowError::Parse(format!(
                "reply cut off after {} output tokens",
                self.tokens.output
            )));
        }
        parse_reply(&self.text)
    }

    /// Trimmed prose; an empty reply is an error
    pub fn prose(&self) -> Result<String> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(DealflowError::Parse("empty reply".to_string()));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_prompt_formats() {
        let json = Prompt::json("You are a market analyst", "Size the market", 1024);
        let prose = Prompt::prose("You are a market analyst", "Size the market", 1024);
        assert_eq!(json.format, ReplyFormat::Json);
        assert_eq!(prose.format, ReplyFormat::Prose);
        assert_eq!(prose.system, json.system);
        assert_eq!(prose.max_tokens, 1024);
    }

    #[test]
    fn test_finish_from_stop_reason() {
        assert_eq!(Finish::from_stop_reason(Some("end_turn")), Finish::Complete);
        assert_eq!(Finish::from_stop_reason(Some("max_tokens")), Finish::Truncated);
        assert_eq!(Finish::from_stop_reason(None), Finish::Complete);
    }

    #[test]
    fn test_reply_json() {
        let reply = Reply::complete("```json\n{\"cagr\": \"24%\"}\n```");
        let value: Value = reply.json().unwrap();
        assert_eq!(value["cagr"], "24%");
    }

    #[test]
    fn test_truncated_reply_refused() {
        let reply = Reply {
            text: "{\"scores\": [1, 1, 0]}".into(),
            finish: Finish::Truncated,
            tokens: TokenCount { input: 10, output: 512 },
        };
        let result: Result<Value> = reply.json();
        assert!(matches!(result, Err(DealflowError::Parse(msg)) if msg.contains("512")));
    }

    #[test]
    fn test_prose_trims_and_rejects_empty() {
        assert_eq!(Reply::complete("  Solid team.\n").prose().unwrap(), "Solid team.");
        assert!(Reply::complete(" \n ").prose().is_err());
    }
}
