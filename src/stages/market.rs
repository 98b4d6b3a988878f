//! Market assessment from retrieved web passages.
//!
//! Hits are split into overlapping chunks, the chunks sharing the most terms
//! with the query are kept, and the model summarizes them into TAM/SAM/SOM,
//! CAGR and target audience.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::ask_json;
use crate::domain::{EvaluationRecord, MarketAssessment, StageOutput};
use crate::llm::LlmClient;
use crate::search::{SearchClient, search_or_placeholder};
use crate::workflow::{Stage, StageKind};

pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;
pub const TOP_CHUNKS: usize = 3;

pub const NO_MARKET_DATA: &str = "No market data found.";

const MARKET_SYSTEM: &str = "You are a market analyst for Real-World Asset (RWA) tokenization startups. Return JSON only.";

/// Split `text` into windows of `size` chars, each overlapping the previous by `overlap`
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || size == 0 {
        return Vec::new();
    }
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| t.to_lowercase())
        .collect()
}

/// The `k` chunks sharing the most distinct terms with `query`; ties keep chunk order
pub fn top_chunks(chunks: &[String], query: &str, k: usize) -> Vec<String> {
    let wanted = terms(query);
    let mut scored: Vec<(usize, &String)> = chunks
        .iter()
        .map(|chunk| (terms(chunk).intersection(&wanted).count(), chunk))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(k).map(|(_, chunk)| chunk.clone()).collect()
}

pub struct MarketStage {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
    max_results: usize,
    max_tokens: u32,
}

impl MarketStage {
    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchClient>, max_results: usize, max_tokens: u32) -> Self {
        Self {
            llm,
            search,
            max_results,
            max_tokens,
        }
    }

    async fn assess(&self, name: &str, sector: &str) -> StageOutput<MarketAssessment> {
        let query = format!("{} {} market size TAM SAM SOM CAGR", name, sector);
        let hits = search_or_placeholder(self.search.as_ref(), &query, self.max_results).await;

        let chunks: Vec<String> = hits
            .iter()
            .filter(|h| !h.content.trim().is_empty())
            .flat_map(|h| chunk_text(&h.content, CHUNK_SIZE, CHUNK_OVERLAP))
            .collect();
        if chunks.is_empty() {
            warn!("market[{}]: no documents retrieved", name);
            return StageOutput::unavailable(NO_MARKET_DATA);
        }

        let context = top_chunks(&chunks, &query, TOP_CHUNKS).join("\n\n");
        debug!("market[{}]: {} chunk(s), {} context chars", name, chunks.len(), context.len());

        let prompt = format!(
            "Based on context, analyze the market for '{}'.\nContext: {}\nAnalyze:\n\
             1. tam_sam_som: Estimated TAM, SAM, and SOM.\n\
             2. cagr: Estimated CAGR for this market.\n\
             3. target_audience: Primary target audience.\n\
             {{ \"tam_sam_som\": \"...\", \"cagr\": \"...\", \"target_audience\": \"...\" }}",
            name, context
        );
        match ask_json::<MarketAssessment>(self.llm.as_ref(), MARKET_SYSTEM, prompt, self.max_tokens).await {
            Ok(assessment) => StageOutput::Ready(assessment),
            Err(e) => {
                warn!("market[{}]: assessment failed: {}", name, e);
                StageOutput::unavailable(e.to_string())
            }
        }
    }
}

#[async_trait]
impl Stage for MarketStage {
    fn kind(&self) -> StageKind {
        StageKind::Market
    }

    async fn run(&self, mut record: EvaluationRecord) -> EvaluationRecord {
        let Some(candidate) = record.current_candidate() else {
            record.market_assessment = Some(StageOutput::unavailable("No current candidate."));
            return record;
        };
        let (name, sector) = (candidate.name.clone(), candidate.sector.clone());

        let output = self.assess(&name, &sector).await;
        info!("market[{}]: {}", name, if output.is_ready() { "assessed" } else { "unavailable" });
        record.market_assessment = Some(output);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidateEvaluation, CandidateInput, SubScores};
    use crate::llm::MockLlmClient;
    use crate::search::{MockSearchClient, SearchHit};

    fn record_for(name: &str) -> EvaluationRecord {
        let input = CandidateInput::new(name, "RWA", "bonds");
        let mut record = EvaluationRecord::new();
        record
            .set_ranking(vec![CandidateEvaluation::from_input(
                &input,
                SubScores::new(50.0, 50.0, 50.0, 50.0),
                50.0,
            )])
            .unwrap();
        record
    }

    #[test]
    fn test_chunk_text_overlaps() {
        let text = "a".repeat(2500);
        let chunks = chunk_text(&text, 1000, 200);
        // starts at 0, 800, 1600
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[2].len(), 900);
    }

    #[test]
    fn test_chunk_text_short_and_empty() {
        assert_eq!(chunk_text("short", 1000, 200), vec!["short".to_string()]);
        assert!(chunk_text("", 1000, 200).is_empty());
    }

    #[test]
    fn test_top_chunks_by_term_overlap() {
        let chunks = vec![
            "unrelated text about weather".to_string(),
            "market size and CAGR figures".to_string(),
            "the TAM SAM SOM market size".to_string(),
        ];
        let top = top_chunks(&chunks, "Acme RWA market size TAM SAM SOM CAGR", 2);
        assert_eq!(top[0], "the TAM SAM SOM market size");
        assert_eq!(top[1], "market size and CAGR figures");
    }

    #[tokio::test]
    async fn test_market_assessment_ready() {
        let llm = Arc::new(MockLlmClient::with_texts([
            r#"{"tam_sam_som": "$16T / $2T / $50B", "cagr": "25%", "target_audience": "institutions"}"#,
        ]));
        let search = Arc::new(MockSearchClient::new().with_rule(
            "market size",
            vec![SearchHit::new("report", "https://r.com", "RWA market size TAM is large")],
        ));
        let stage = MarketStage::new(llm.clone(), search.clone(), 5, 1024);
        let record = stage.run(record_for("Acme")).await;

        let assessment = record.market_assessment.as_ref().and_then(|m| m.ready()).unwrap();
        assert_eq!(assessment.cagr, "25%");
        assert_eq!(search.queries(), vec!["Acme RWA market size TAM SAM SOM CAGR"]);
        assert!(llm.prompts()[0].instruction.contains("TAM is large"));
    }

    #[tokio::test]
    async fn test_hits_without_content_unavailable() {
        let search = Arc::new(MockSearchClient::new().with_rule(
            "market size",
            vec![SearchHit::new("empty", "https://r.com", "  ")],
        ));
        let stage = MarketStage::new(Arc::new(MockLlmClient::default()), search, 5, 1024);
        let record = stage.run(record_for("Acme")).await;

        assert_eq!(
            record.market_assessment,
            Some(StageOutput::unavailable(NO_MARKET_DATA))
        );
    }

    #[tokio::test]
    async fn test_llm_failure_unavailable() {
        let stage = MarketStage::new(Arc::new(MockLlmClient::default()), Arc::new(MockSearchClient::new()), 5, 1024);
        let record = stage.run(record_for("Acme")).await;

        assert!(matches!(
            record.market_assessment,
            Some(StageOutput::Unavailable { .. })
        ));
    }
}
