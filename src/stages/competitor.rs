//! Competitor identification with a short SWOT per rival.

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use super::ask_json;
use crate::domain::{CompetitorAnalysis, EvaluationRecord, StageOutput};
use crate::error::{DealflowError, Result};
use crate::llm::LlmClient;
use crate::search::{SearchClient, search_or_placeholder};
use crate::workflow::{Stage, StageKind};

/// Competitors kept from a reply
pub const MAX_COMPETITORS: usize = 3;

const COMPETITOR_SYSTEM: &str = "You are a strategy consultant. Return only JSON.";

pub struct CompetitorStage {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
    max_results: usize,
    max_tokens: u32,
}

impl CompetitorStage {
    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchClient>, max_results: usize, max_tokens: u32) -> Self {
        Self {
            llm,
            search,
            max_results,
            max_tokens,
        }
    }

    async fn analyze(&self, name: &str, sector: &str) -> Result<CompetitorAnalysis> {
        let query = format!("main competitors for {} in {}", name, sector);
        let hits = search_or_placeholder(self.search.as_ref(), &query, self.max_results).await;
        let context = hits.iter().map(|h| h.content.as_str()).collect::<Vec<_>>().join("\n");

        let prompt = format!(
            "Identify 2-3 main competitors for '{name}' based on context.\n\
             Provide a brief SWOT (Strengths, Weaknesses) analysis for each competitor relative to {name}.\n\
             Context: {context}\n\
             {{\"competitors\": [{{\"name\": \"Competitor A\", \"swot\": \"Strength: ..., Weakness: ...\"}}]}}"
        );
        let mut analysis: CompetitorAnalysis =
            ask_json(self.llm.as_ref(), COMPETITOR_SYSTEM, prompt, self.max_tokens).await?;

        analysis.competitors.retain(|c| !c.name.trim().is_empty());
        if analysis.competitors.is_empty() {
            return Err(DealflowError::Parse("reply named no competitors".to_string()));
        }
        analysis.competitors.truncate(MAX_COMPETITORS);
        Ok(analysis)
    }
}

#[async_trait]
impl Stage for CompetitorStage {
    fn kind(&self) -> StageKind {
        StageKind::Competitor
    }

    async fn run(&self, mut record: EvaluationRecord) -> EvaluationRecord {
        let Some(candidate) = record.current_candidate() else {
            record.competitor_analysis = Some(StageOutput::unavailable("No current candidate."));
            return record;
        };
        let (name, sector) = (candidate.name.clone(), candidate.sector.clone());

        let output = match self.analyze(&name, &sector).await {
            Ok(analysis) => {
                info!("competitor[{}]: {} competitor(s) identified", name, analysis.competitors.len());
                StageOutput::Ready(analysis)
            }
            Err(e) => {
                warn!("competitor[{}]: analysis failed: {}", name, e);
                StageOutput::unavailable(e.to_string())
            }
        };
        record.competitor_analysis = Some(output);
        record
    }
}
