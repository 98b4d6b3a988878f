//! Model-backed judgement calls made inside the technical sub-workflow.
//!
//! The sub-workflow decides *when* to ask; the advisor decides *what* the
//! answer is. Every method may fail and the caller substitutes a fallback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::evidence::EvidenceDraft;
use super::signals::Signal;
use crate::domain::{Evidence, ScoreDimension, ScoreVector};
use crate::error::Result;
use crate::llm::{LlmClient, Prompt};

/// Context handed to the narrative writer
#[derive(Debug, Clone)]
pub struct NarrativeBrief {
    pub name: String,
    pub segment: String,
    pub scores: ScoreVector,
    pub final_score: f64,
    pub positioning: String,
    pub evidence: Vec<Evidence>,
}

#[async_trait]
pub trait TechAdvisor: Send + Sync {
    /// Proposed value per dimension; the caller bounds how far it may move
    async fn adjust_scores(&self, signals: &[Signal], base: &ScoreVector) -> Result<HashMap<ScoreDimension, f64>>;

    async fn distill_evidence(&self, top: &[Signal]) -> Result<Vec<EvidenceDraft>>;

    async fn positioning(&self, scores: &ScoreVector, strengths: &[String], risks: &[String]) -> Result<String>;

    async fn narrative(&self, brief: &NarrativeBrief) -> Result<String>;
}

const ANALYST_SYSTEM: &str = "You are a technical due-diligence analyst for Real-World Asset (RWA) tokenization startups.";

pub struct LlmTechAdvisor {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl LlmTechAdvisor {
    pub fn new(llm: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    async fn ask_json(&self, instruction: String) -> Result<Map<String, Value>> {
        let prompt = Prompt::json(ANALYST_SYSTEM, instruction, self.max_tokens);
        self.llm.complete(&prompt).await?.json()
    }

    async fn ask_prose(&self, instruction: String) -> Result<String> {
        let prompt = Prompt::prose(ANALYST_SYSTEM, instruction, self.max_tokens);
        self.llm.complete(&prompt).await?.prose()
    }
}

fn signal_brief(signals: &[Signal]) -> String {
    signals
        .iter()
        .map(|s| format!("- ({}) {} | {}", s.source, s.snippet, s.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl TechAdvisor for LlmTechAdvisor {
    async fn adjust_scores(&self, signals: &[Signal], base: &ScoreVector) -> Result<HashMap<ScoreDimension, f64>> {
        let prompt = format!(
            "Adjust RWA tech scores [0,1] with small corrections. Return JSON only, an object keyed by \
             domain_fit, tech_maturity, credibility, compliance_risk, ecosystem.\nSignals:\n{}\nBase:\n{}",
            signal_brief(&signals[..signals.len().min(8)]),
            serde_json::to_string(base)?
        );
        let reply = self.ask_json(prompt).await?;

        Ok(reply
            .iter()
            .filter_map(|(key, value)| Some((ScoreDimension::from_key(key)?, value.as_f64()?)))
            .collect())
    }

    async fn distill_evidence(&self, top: &[Signal]) -> Result<Vec<EvidenceDraft>> {
        let prompt = format!(
            "Summarize 1-2 short evidence items per score dimension (domain_fit, tech_maturity, credibility, \
             compliance_risk, ecosystem) from the signals. Return a JSON object mapping each dimension to an \
             array; each item has 'snippet', 'url', 'source'.\nSignals:\n{}",
            signal_brief(top)
        );
        let reply = self.ask_json(prompt).await?;

        let mut drafts = Vec::new();
        for (dimension, items) in &reply {
            let Some(items) = items.as_array() else {
                continue;
            };
            for item in items.iter().filter(|i| i.is_object()) {
                let field = |k: &str| item[k].as_str().unwrap_or_default().to_string();
                drafts.push(EvidenceDraft {
                    dimension: dimension.clone(),
                    snippet: field("snippet"),
                    url: field("url"),
                    source: field("source"),
                });
            }
        }
        Ok(drafts)
    }

    async fn positioning(&self, scores: &ScoreVector, strengths: &[String], risks: &[String]) -> Result<String> {
        let prompt = format!(
            "Write one positioning sentence. Be neutral.\nscores={}\nstrengths={:?}\nrisks={:?}",
            serde_json::to_string(scores)?,
            strengths,
            risks
        );
        self.ask_prose(prompt).await
    }

    async fn narrative(&self, brief: &NarrativeBrief) -> Result<String> {
        let evidence_block = brief
            .evidence
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let snippet: String = e.snippet.chars().take(100).collect();
                format!("- [{}] ({}) {}... ({})", i + 1, e.source, snippet, e.url)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Write a 350-500 word markdown DD report with exact headers: Overview, Technology & Architecture, \
             Governance & Compliance, Credibility & Ecosystem, Risks & Watchpoints, Bottom Line.\n\
             Context: Company: {}, Segment: {}, Scores: {}, Final: {:.3}, Pos: {}, Evidence:\n{}",
            brief.name,
            brief.segment,
            serde_json::to_string(&brief.scores)?,
            brief.final_score,
            brief.positioning,
            evidence_block
        );
        self.ask_prose(prompt).await
    }
}
