//! Investment decision against the 20-point checklist.

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use super::ask_json;
use crate::domain::{
    CandidateEvaluation, EvaluationRecord, InvestmentDecision, checklist_total, normalize_checklist,
};
use crate::error::{DealflowError, Result};
use crate::llm::LlmClient;
use crate::policy::EvaluationPolicy;
use crate::workflow::{Stage, StageKind};

/// Checklist labels quoted in the strength/weakness summaries
const SUMMARY_LABELS: usize = 3;

const DECISION_SYSTEM: &str = "You are a senior VC partner evaluating an early-stage RWA (Real-World Asset) startup.";

const GUIDELINES: &str = "CRITICAL EVALUATION GUIDELINES:
1. For early-stage companies, lack of public data is not failure
2. Score based on potential and indicators, not just proven metrics
3. If the technical analysis shows tech_maturity > 0.5, consider Question 6 as PASS (1)
4. If the technical analysis shows credibility > 0.6, consider Question 16 as PASS (1)
5. If the technical analysis shows compliance_risk < 0.35, consider Question 18 as PASS (1)
6. If the technical analysis shows ecosystem > 0.6, consider Question 13 as PASS (1)
7. For the RWA sector, regulatory awareness is critical but perfection is not expected
8. Strong fundamentals (market, team, tech) should outweigh missing traction data";

#[derive(Debug, Deserialize)]
struct DecisionReply {
    #[serde(default)]
    scores: Vec<Value>,
    #[serde(default)]
    reasoning: String,
}

/// Coerce a reply score (number, bool or numeric string) to an integer
fn as_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub struct DecisionStage {
    llm: Arc<dyn LlmClient>,
    policy: Arc<EvaluationPolicy>,
    max_tokens: u32,
}

impl DecisionStage {
    pub fn new(llm: Arc<dyn LlmClient>, policy: Arc<EvaluationPolicy>, max_tokens: u32) -> Self {
        Self {
            llm,
            policy,
            max_tokens,
        }
    }

    fn context(record: &EvaluationRecord, candidate: &CandidateEvaluation) -> Result<String> {
        Ok(format!(
            "### Startup Overview\n{}\n\n### Technical Analysis\n{}\n\n### Market Assessment\n{}\n\n### Competitive Landscape\n{}",
            serde_json::to_string_pretty(candidate)?,
            serde_json::to_string_pretty(&record.tech_summary)?,
            serde_json::to_string_pretty(&record.market_assessment)?,
            serde_json::to_string_pretty(&record.competitor_analysis)?,
        ))
    }

    async fn decide(&self, record: &EvaluationRecord) -> Result<InvestmentDecision> {
        let candidate = record
            .current_candidate()
            .ok_or_else(|| DealflowError::InvalidState("no current candidate".to_string()))?;

        let checklist = self.policy.checklist.join("\n");
        let prompt = format!(
            "{}\n\nAnswer 0 (No/Weak) or 1 (Yes/Strong) for each of the {} questions.\n\
             Be reasonably optimistic for promising early-stage startups.\n\n\
             ### Complete Data Context ###\n{}\n\n### VC 20-Point Checklist ###\n{}\n\n\
             Output format (JSON only):\n{{\"scores\": [1, 0, 1, ..., 1], \"reasoning\": \"Concise 2-3 sentence evaluation summary.\"}}",
            GUIDELINES,
            self.policy.checklist.len(),
            Self::context(record, candidate)?,
            checklist
        );
        let reply: DecisionReply = ask_json(self.llm.as_ref(), DECISION_SYSTEM, prompt, self.max_tokens).await?;

        let raw: Vec<i64> = reply.scores.iter().map(as_int).collect();
        if raw.len() != self.policy.checklist.len() {
            warn!("decision[{}]: {} checklist score(s) returned, normalizing", candidate.name, raw.len());
        }
        let checklist_scores = normalize_checklist(&raw);
        let total_score = checklist_total(&checklist_scores);

        Ok(InvestmentDecision {
            total_score,
            outcome: self.policy.classify(total_score),
            reasoning: reply.reasoning,
            checklist_scores,
        })
    }

    fn log_summary(&self, name: &str, decision: &InvestmentDecision) {
        let scores = &decision.checklist_scores;
        if decision.total_score >= self.policy.hold_threshold {
            info!(
                "decision[{}]: key strengths: {}",
                name,
                self.policy.summarize(scores, true, SUMMARY_LABELS)
            );
        }
        if decision.total_score < self.policy.accept_threshold {
            info!(
                "decision[{}]: areas of concern: {}",
                name,
                self.policy.summarize(scores, false, SUMMARY_LABELS)
            );
        }
    }
}

#[async_trait]
impl Stage for DecisionStage {
    fn kind(&self) -> StageKind {
        StageKind::Decision
    }

    async fn run(&self, mut record: EvaluationRecord) -> EvaluationRecord {
        let name = record
            .current_candidate()
            .map(|c| c.name.clone())
            .unwrap_or_default();

        let decision = match self.decide(&record).await {
            Ok(decision) => {
                info!(
                    "decision[{}]: {} ({}/{})",
                    name,
                    decision.outcome,
                    decision.total_score,
                    self.policy.checklist.len()
                );
                self.log_summary(&name, &decision);
                decision
            }
            Err(e) => {
                warn!("decision[{}]: evaluation failed, recording default: {}", name, e);
                InvestmentDecision::fallback()
            }
        };
        record.decision = Some(decision);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidateInput, DecisionOutcome, StageOutput, SubScores};
    use crate::llm::MockLlmClient;

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
        record.market_assessment = Some(StageOutput::unavailable("No market data found."));
        record
    }

    fn reply(passes: usize, len: usize) -> String {
        let scores: Vec<String> = (0..len).map(|i| if i < passes { "1" } else { "0" }.to_string()).collect();
        format!(r#"{{"scores": [{}], "reasoning": "solid"}}"#, scores.join(", "))
    }

    async fn decide_with(text: String) -> InvestmentDecision {
        let llm = Arc::new(MockLlmClient::with_texts([text]));
        let stage = DecisionStage::new(llm, Arc::new(EvaluationPolicy::default()), 1024);
        stage.run(record_for("Acme")).await.decision.unwrap()
    }

    #[tokio::test]
    async fn test_thresholds() {
        assert_eq!(decide_with(reply(15, 20)).await.outcome, DecisionOutcome::Accept);
        assert_eq!(decide_with(reply(14, 20)).await.outcome, DecisionOutcome::Hold);
        assert_eq!(decide_with(reply(12, 20)).await.outcome, DecisionOutcome::Hold);
        assert_eq!(decide_with(reply(11, 20)).await.outcome, DecisionOutcome::Reject);
    }

    #[tokio::test]
    async fn test_short_score_list_padded() {
        let decision = decide_with(reply(13, 13)).await;
        assert_eq!(decision.checklist_scores.len(), 20);
        assert_eq!(decision.total_score, 13);
        assert_eq!(decision.outcome, DecisionOutcome::Hold);
        assert_eq!(decision.reasoning, "solid");
    }

    #[tokio::test]
    async fn test_long_score_list_truncated() {
        let decision = decide_with(reply(25, 25)).await;
        assert_eq!(decision.checklist_scores.len(), 20);
        assert_eq!(decision.total_score, 20);
    }

    #[tokio::test]
    async fn test_mixed_score_types() {
        let text = r#"{"scores": [1, true, "1", 2, 0.0, null], "reasoning": "x"}"#.to_string();
        let decision = decide_with(text).await;
        assert_eq!(decision.total_score, 4);
    }

    #[tokio::test]
    async fn test_failure_records_default_hold() {
        let decision = decide_with("I cannot evaluate this.".to_string()).await;
        assert_eq!(decision, InvestmentDecision::fallback());
        assert_eq!(decision.outcome, DecisionOutcome::Hold);
        assert_eq!(decision.total_score, 0);
    }

    #[tokio::test]
    async fn test_no_candidate_records_default() {
        let stage = DecisionStage::new(
            Arc::new(MockLlmClient::default()),
            Arc::new(EvaluationPolicy::default()),
            1024,
        );
        let record = stage.run(EvaluationRecord::new()).await;
        assert_eq!(record.decision, Some(InvestmentDecision::fallback()));
    }

    #[tokio::test]
    async fn test_decision_stage_does_not_touch_log() {
        let llm = Arc::new(MockLlmClient::with_texts([reply(16, 20)]));
        let stage = DecisionStage::new(llm.clone(), Arc::new(EvaluationPolicy::default()), 1024);
        let record = stage.run(record_for("Acme")).await;

        assert!(record.decision_log().is_empty());
        let prompt = llm.prompts()[0].instruction.clone();
        assert!(prompt.contains("No market data found."));
        assert!(prompt.contains("20. Fit(Positioning)"));
    }
}
