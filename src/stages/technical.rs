//! Technical analysis: runs the guarded sub-workflow for the current candidate.

use async_trait::async_trait;
use log::{info, warn};

use crate::domain::{EvaluationRecord, StageOutput};
use crate::tech::{GuardedSubWorkflow, TechInput};
use crate::workflow::{Stage, StageKind};

pub struct TechnicalStage {
    workflow: GuardedSubWorkflow,
}

impl TechnicalStage {
    pub fn new(workflow: GuardedSubWorkflow) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl Stage for TechnicalStage {
    fn kind(&self) -> StageKind {
        StageKind::Technical
    }

    async fn run(&self, mut record: EvaluationRecord) -> EvaluationRecord {
        let Some(candidate) = record.current_candidate() else {
            warn!("technical analysis without a current candidate");
            record.tech_summary = Some(StageOutput::unavailable("No current candidate."));
            return record;
        };

        let input = TechInput {
            name: candidate.name.clone(),
            website: candidate.website.clone(),
            segment: candidate.sector.clone(),
            region: candidate.region.clone(),
            funding_stage: candidate.funding_stage.clone(),
        };

        let payload = self.workflow.run(input).await;
        info!(
            "technical analysis of {}: final score {:.3}, {} evidence item(s), {} issue(s)",
            payload.name,
            payload.final_score,
            payload.evidence.len(),
            payload.issues.len()
        );
        record.tech_summary = Some(StageOutput::Ready(payload));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidateEvaluation, CandidateInput, SubScores};
    use crate::llm::MockLlmClient;
    use crate::search::{MockSearchClient, SearchHit};
    use crate::tech::{LlmTechAdvisor, TechLimits};
    use std::sync::Arc;

    fn stage(search: MockSearchClient) -> TechnicalStage {
        // An empty mock queue makes every advisor call fail, exercising the fallbacks
        let advisor = LlmTechAdvisor::new(Arc::new(MockLlmClient::default()), 512);
        TechnicalStage::new(GuardedSubWorkflow::new(
            Arc::new(search),
            Arc::new(advisor),
            TechLimits::default(),
        ))
    }

    fn ranked_record() -> EvaluationRecord {
        let input = CandidateInput::new("Acme", "RWA tokenization", "bonds").with_website("https://acme.io");
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

    #[tokio::test]
    async fn test_no_candidate_marks_unavailable() {
        let record = stage(MockSearchClient::new()).run(EvaluationRecord::new()).await;
        assert!(matches!(record.tech_summary, Some(StageOutput::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_payload_written_for_current_candidate() {
        let search = MockSearchClient::new().with_rule(
            "Acme",
            vec![SearchHit::new(
                "Acme",
                "https://acme.io/about",
                "Acme tokenization platform with KYC and AML licensing",
            )],
        );
        let record = stage(search).run(ranked_record()).await;

        let payload = record.tech_summary.as_ref().and_then(|t| t.ready()).unwrap();
        assert_eq!(payload.name, "Acme");
        assert_eq!(payload.segment, "RWA tokenization");
        assert!(payload.final_score >= 0.0 && payload.final_score <= 1.0);
    }

    #[tokio::test]
    async fn test_search_outage_still_produces_payload() {
        let record = stage(MockSearchClient::new()).run(ranked_record()).await;
        let payload = record.tech_summary.as_ref().and_then(|t| t.ready()).unwrap();
        assert!(!payload.issues.is_empty());
    }
}
