//! Candidate ranking under the selected persona's weights.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;

use super::ask_json;
use crate::domain::{CandidateEvaluation, CandidateInput, EvaluationRecord, Persona, SubScores};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::policy::EvaluationPolicy;
use crate::search::{SearchClient, search_or_placeholder};
use crate::workflow::{Stage, StageKind};

/// Produces sub-scores for a candidate that arrived without them
#[async_trait]
pub trait CandidateScorer: Send + Sync {
    async fn score(&self, candidate: &CandidateInput) -> Result<SubScores>;
}

const SCORER_SYSTEM: &str = "You are a VC analyst. Evaluate the startup (0-100) based on criteria. Return JSON only.";

const CRITERIA: &str = r#"{
  "seed_early": "Seed/Early Stage: early-stage innovation and potential",
  "regional_esg": "Regional/ESG: regional influence and ESG relevance",
  "growth_partnership": "Growth + Partnership: growth rate, potential, partnerships",
  "regulation_monetization": "Regulation/Monetization: regulatory adaptability, revenue model"
}"#;

#[derive(Debug, Deserialize)]
struct CriterionScore {
    score: f64,
}

#[derive(Debug, Deserialize)]
struct ScoreReply {
    seed_early: CriterionScore,
    regional_esg: CriterionScore,
    growth_partnership: CriterionScore,
    regulation_monetization: CriterionScore,
}

/// Scores a candidate from web context with one model call
pub struct LlmCandidateScorer {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
    max_results: usize,
    max_tokens: u32,
}

impl LlmCandidateScorer {
    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchClient>, max_results: usize, max_tokens: u32) -> Self {
        Self {
            llm,
            search,
            max_results,
            max_tokens,
        }
    }
}

#[async_trait]
impl CandidateScorer for LlmCandidateScorer {
    async fn score(&self, candidate: &CandidateInput) -> Result<SubScores> {
        let query = format!("{} blockchain tokenization official website funding", candidate.name);
        let hits = search_or_placeholder(self.search.as_ref(), &query, self.max_results).await;
        let context = hits
            .iter()
            .map(|h| h.content.chars().take(200).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Criteria: {}\n\nContext:\nInfo: {}\nSearch: {}\n\nRespond with only a JSON object keyed by criterion, \
             each value {{\"score\": 0-100, \"rationale\": \"...\"}}.",
            CRITERIA, candidate.strength, context
        );
        let reply: ScoreReply = ask_json(self.llm.as_ref(), SCORER_SYSTEM, prompt, self.max_tokens).await?;

        Ok(SubScores::new(
            reply.seed_early.score,
            reply.regional_esg.score,
            reply.growth_partnership.score,
            reply.regulation_monetization.score,
        ))
    }
}

pub struct RankingStage {
    policy: Arc<EvaluationPolicy>,
    candidates: Vec<CandidateInput>,
    scorer: Arc<dyn CandidateScorer>,
}

impl RankingStage {
    pub fn new(policy: Arc<EvaluationPolicy>, candidates: Vec<CandidateInput>, scorer: Arc<dyn CandidateScorer>) -> Self {
        Self {
            policy,
            candidates,
            scorer,
        }
    }

    /// Score every candidate under `persona` and sort descending; ties keep input order
    pub async fn rank(&self, persona: Persona) -> Vec<CandidateEvaluation> {
        let mut ranked = Vec::with_capacity(self.candidates.len());

        for (idx, candidate) in self.candidates.iter().enumerate() {
            debug!("ranking [{}/{}] {}", idx + 1, self.candidates.len(), candidate.name);
            let sub_scores = match candidate.sub_scores {
                Some(scores) => scores.clamped(),
                None => match self.scorer.score(candidate).await {
                    Ok(scores) => scores,
                    Err(e) => {
                        warn!("skipping {}: scoring failed ({})", candidate.name, e);
                        continue;
                    }
                },
            };
            let total = self.policy.rank_score(persona, &sub_scores);
            ranked.push(CandidateEvaluation::from_input(candidate, sub_scores, total));
        }

        ranked.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        ranked
    }
}

#[async_trait]
impl Stage for RankingStage {
    fn kind(&self) -> StageKind {
        StageKind::Ranking
    }

    async fn run(&self, mut record: EvaluationRecord) -> EvaluationRecord {
        let persona = record.persona().unwrap_or_else(|| {
            warn!("no persona on record, ranking as conservative");
            Persona::Conservative
        });

        let ranked = self.rank(persona).await;
        info!("ranked {} of {} candidate(s) as {}", ranked.len(), self.candidates.len(), persona);
        for (idx, c) in ranked.iter().enumerate() {
            debug!("  #{} {} {:.2}", idx + 1, c.name, c.total_score);
        }

        if let Err(e) = record.set_ranking(ranked) {
            warn!("failed to store ranking: {}", e);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidateCursor, PersonaAnswers, PersonaAssessment};
    use crate::error::DealflowError;
    use crate::llm::MockLlmClient;
    use crate::search::MockSearchClient;

    struct FailingScorer;

    #[async_trait]
    impl CandidateScorer for FailingScorer {
        async fn score(&self, _candidate: &CandidateInput) -> Result<SubScores> {
            Err(DealflowError::Llm("offline".into()))
        }
    }

    fn scored(name: &str, scores: [f64; 4]) -> CandidateInput {
        CandidateInput::new(name, "RWA", "compliance-first")
            .with_sub_scores(SubScores::new(scores[0], scores[1], scores[2], scores[3]))
    }

    fn aggressive_record() -> EvaluationRecord {
        let mut record = EvaluationRecord::new();
        let answers = PersonaAnswers::new([5, 5, 1, 1, 5]).unwrap();
        record.assign_persona(PersonaAssessment::from_answers(&answers)).unwrap();
        record
    }

    #[tokio::test]
    async fn test_ranking_sorted_by_persona_weights() {
        let candidates = vec![
            scored("Steady", [10.0, 90.0, 10.0, 90.0]),
            scored("Rocket", [90.0, 10.0, 90.0, 10.0]),
        ];
        let stage = RankingStage::new(Arc::new(EvaluationPolicy::default()), candidates, Arc::new(FailingScorer));
        let record = stage.run(aggressive_record()).await;

        let names: Vec<&str> = record.ranked_candidates().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Rocket", "Steady"]);
        // 90*.40 + 10*.15 + 90*.35 + 10*.10
        assert_eq!(record.ranked_candidates()[0].total_score, 70.0);
        assert_eq!(record.ranked_candidates()[0].final_score, 0.7);
        assert_eq!(record.cursor(), CandidateCursor::Active(0));
        assert_eq!(record.current_candidate().unwrap().name, "Rocket");
    }

    #[tokio::test]
    async fn test_ties_keep_input_order() {
        let candidates = vec![
            scored("First", [50.0, 50.0, 50.0, 50.0]),
            scored("Second", [50.0, 50.0, 50.0, 50.0]),
        ];
        let stage = RankingStage::new(Arc::new(EvaluationPolicy::default()), candidates, Arc::new(FailingScorer));
        let ranked = stage.rank(Persona::Conservative).await;
        assert_eq!(ranked[0].name, "First");
        assert_eq!(ranked[1].name, "Second");
    }

    #[tokio::test]
    async fn test_unscored_candidate_skipped_on_failure() {
        let candidates = vec![
            scored("Known", [50.0, 50.0, 50.0, 50.0]),
            CandidateInput::new("Mystery", "RWA", "unknown"),
        ];
        let stage = RankingStage::new(Arc::new(EvaluationPolicy::default()), candidates, Arc::new(FailingScorer));
        let record = stage.run(aggressive_record()).await;
        assert_eq!(record.ranked_candidates().len(), 1);
        assert_eq!(record.ranked_candidates()[0].name, "Known");
    }

    #[tokio::test]
    async fn test_empty_ranking_exhausts_cursor() {
        let candidates = vec![CandidateInput::new("Mystery", "RWA", "unknown")];
        let stage = RankingStage::new(Arc::new(EvaluationPolicy::default()), candidates, Arc::new(FailingScorer));
        let record = stage.run(aggressive_record()).await;
        assert!(record.is_ranked());
        assert_eq!(record.cursor(), CandidateCursor::Exhausted);
    }

    #[tokio::test]
    async fn test_missing_persona_ranks_conservative() {
        let candidates = vec![
            scored("Rocket", [90.0, 10.0, 90.0, 10.0]),
            scored("Steady", [10.0, 90.0, 10.0, 90.0]),
        ];
        let stage = RankingStage::new(Arc::new(EvaluationPolicy::default()), candidates, Arc::new(FailingScorer));
        let record = stage.run(EvaluationRecord::new()).await;
        assert_eq!(record.ranked_candidates()[0].name, "Steady");
    }

    #[tokio::test]
    async fn test_llm_scorer_parses_reply() {
        let llm = Arc::new(MockLlmClient::with_texts([r#"```json
{"seed_early": {"score": 80, "rationale": "a"}, "regional_esg": {"score": 40, "rationale": "b"},
 "growth_partnership": {"score": 70, "rationale": "c"}, "regulation_monetization": {"score": 150, "rationale": "d"}}
```"#]));
        let search = Arc::new(MockSearchClient::new());
        let scorer = LlmCandidateScorer::new(llm.clone(), search.clone(), 5, 1024);

        let scores = scorer.score(&CandidateInput::new("Acme", "RWA", "bonds")).await.unwrap();
        assert_eq!(scores, SubScores::new(80.0, 40.0, 70.0, 100.0));
        assert_eq!(search.queries(), vec!["Acme blockchain tokenization official website funding"]);
        assert!(llm.prompts()[0].instruction.contains("bonds"));
    }
}
