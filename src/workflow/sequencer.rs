//! Top-level stage sequencing.
//!
//! persona -> ranking -> { technical -> market -> competitor -> decision }
//! -> stop? report : advance -> remaining? technical : report
//!
//! The sequencer interprets only two things: the decision outcome (through
//! [`LoopController`]) and the cursor (through [`CandidateAdvancer`]). It owns
//! the decision log append and the termination record so that every path into
//! the report stage is uniform.

use std::sync::Arc;

use log::{info, warn};

use super::controller::{CandidateAdvancer, DEFAULT_REJECTION_BUDGET, LoopController, LoopDecision, StopCause};
use super::stage::{Stage, StageKind};
use crate::domain::{EvaluationRecord, InvestmentDecision, Termination};
use crate::error::{DealflowError, Result};

/// Default hard ceiling on stage invocations per run
pub const DEFAULT_MAX_STEPS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowLimits {
    /// Hard ceiling on stage invocations, independent of the candidate budget
    pub max_steps: u32,
    /// Hold/reject outcomes tolerated before stopping
    pub rejection_budget: usize,
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            rejection_budget: DEFAULT_REJECTION_BUDGET,
        }
    }
}

impl WorkflowLimits {
    /// Invocations of the longest run the rejection budget allows: persona,
    /// ranking, four deep-analysis stages per candidate, then the report.
    /// At least one candidate is always evaluated.
    pub fn budgeted_steps(&self) -> u32 {
        let candidates = u32::try_from(self.rejection_budget.max(1)).unwrap_or(u32::MAX);
        let deep = StageKind::ALL.iter().filter(|k| k.is_deep_analysis()).count() as u32;
        candidates.saturating_mul(deep).saturating_add(3)
    }

    /// Whether the ceiling leaves room for every budgeted candidate and the report
    pub fn covers_budget(&self) -> bool {
        self.max_steps >= self.budgeted_steps()
    }
}

/// One implementation per top-level stage
#[derive(Clone)]
pub struct StageSet {
    pub persona: Arc<dyn Stage>,
    pub ranking: Arc<dyn Stage>,
    pub technical: Arc<dyn Stage>,
    pub market: Arc<dyn Stage>,
    pub competitor: Arc<dyn Stage>,
    pub decision: Arc<dyn Stage>,
    pub report: Arc<dyn Stage>,
}

impl StageSet {
    pub fn get(&self, kind: StageKind) -> &Arc<dyn Stage> {
        match kind {
            StageKind::Persona => &self.persona,
            StageKind::Ranking => &self.ranking,
            StageKind::Technical => &self.technical,
            StageKind::Market => &self.market,
            StageKind::Competitor => &self.competitor,
            StageKind::Decision => &self.decision,
            StageKind::Report => &self.report,
        }
    }

    /// Every slot must hold a stage of the matching kind
    pub fn validate(&self) -> Result<()> {
        for kind in StageKind::ALL {
            let actual = self.get(kind).kind();
            if actual != kind {
                return Err(DealflowError::InvalidInput(format!(
                    "stage slot '{}' holds a '{}' stage",
                    kind, actual
                )));
            }
        }
        Ok(())
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub record: EvaluationRecord,
    /// Stage invocations performed
    pub steps: u32,
}

impl RunOutcome {
    pub fn final_report(&self) -> Option<&str> {
        self.record.final_report()
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.record.termination()
    }
}

/// Where control goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Run(StageKind),
    Advance,
    Finished,
}

pub struct StageSequencer {
    stages: StageSet,
    controller: LoopController,
    advancer: CandidateAdvancer,
    limits: WorkflowLimits,
}

impl StageSequencer {
    pub fn new(stages: StageSet, limits: WorkflowLimits) -> Result<Self> {
        stages.validate()?;
        if !limits.covers_budget() {
            warn!(
                "step ceiling {} is below the {} steps a rejection budget of {} can take; long runs end without a report",
                limits.max_steps,
                limits.budgeted_steps(),
                limits.rejection_budget
            );
        }
        Ok(Self {
            stages,
            controller: LoopController::new(limits.rejection_budget),
            advancer: CandidateAdvancer,
            limits,
        })
    }

    pub fn limits(&self) -> &WorkflowLimits {
        &self.limits
    }

    /// Drive a fresh record through the pipeline until the report stage has run
    pub async fn run(&self, record: EvaluationRecord) -> Result<RunOutcome> {
        let mut record = record;
        let mut steps = 0u32;
        let mut next = Step::Run(StageKind::Persona);

        loop {
            next = match next {
                Step::Run(kind) => {
                    if steps >= self.limits.max_steps {
                        warn!("step ceiling {} reached before '{}' stage", self.limits.max_steps, kind);
                        return Err(DealflowError::StepLimitExceeded {
                            limit: self.limits.max_steps,
                        });
                    }
                    steps += 1;
                    record = self.invoke(kind, record, steps).await;
                    self.route_after(kind, &mut record)
                }
                Step::Advance => {
                    let cursor = self.advancer.advance(record.ranked_candidates().len(), record.cursor());
                    record.move_to(cursor);
                    if self.advancer.has_remaining(cursor) {
                        Step::Run(StageKind::Technical)
                    } else {
                        record.set_termination(self.list_exhausted(&record));
                        Step::Run(StageKind::Report)
                    }
                }
                Step::Finished => break,
            };
        }

        if let Some(termination) = record.termination() {
            info!("run finished after {} step(s): {}", steps, termination.reason());
        }
        Ok(RunOutcome { record, steps })
    }

    async fn invoke(&self, kind: StageKind, record: EvaluationRecord, step: u32) -> EvaluationRecord {
        let candidate = record
            .current_candidate()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(stage = %kind, step = step, candidate = %candidate, "stage started");

        let record = self.stages.get(kind).run(record).await;

        tracing::debug!(stage = %kind, step = step, decisions = record.decision_log().len(), "stage finished");
        record
    }

    fn route_after(&self, kind: StageKind, record: &mut EvaluationRecord) -> Step {
        match kind {
            StageKind::Persona => Step::Run(StageKind::Ranking),
            StageKind::Ranking => {
                if self.advancer.has_remaining(record.cursor()) {
                    Step::Run(StageKind::Technical)
                } else {
                    warn!("ranking produced no candidates");
                    record.set_termination(self.list_exhausted(record));
                    Step::Run(StageKind::Report)
                }
            }
            StageKind::Technical => Step::Run(StageKind::Market),
            StageKind::Market => Step::Run(StageKind::Competitor),
            StageKind::Competitor => Step::Run(StageKind::Decision),
            StageKind::Decision => self.after_decision(record),
            StageKind::Report => Step::Finished,
        }
    }

    fn after_decision(&self, record: &mut EvaluationRecord) -> Step {
        let decision = match &record.decision {
            Some(decision) => decision.clone(),
            None => {
                warn!("decision stage left no decision, recording the default");
                let fallback = InvestmentDecision::fallback();
                record.decision = Some(fallback.clone());
                fallback
            }
        };

        record.log_decision(decision.outcome);
        let candidate = record
            .current_candidate()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        tracing::info!(
            candidate = %candidate,
            outcome = %decision.outcome,
            score = decision.total_score,
            evaluated = record.decision_log().len(),
            "decision recorded"
        );

        match self.controller.decide(decision.outcome, record.decision_log()) {
            LoopDecision::Stop(StopCause::Accepted) => {
                record.set_termination(Termination::Accepted { candidate });
                Step::Run(StageKind::Report)
            }
            LoopDecision::Stop(StopCause::BudgetExhausted) => {
                record.set_termination(Termination::BudgetExhausted {
                    evaluated: record.decision_log().len(),
                });
                Step::Run(StageKind::Report)
            }
            LoopDecision::Continue => Step::Advance,
        }
    }

    fn list_exhausted(&self, record: &EvaluationRecord) -> Termination {
        Termination::CandidatesExhausted {
            evaluated: record.decision_log().len(),
            total: record.ranked_candidates().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CandidateEvaluation, CandidateInput, DecisionOutcome, PersonaAnswers, PersonaAssessment, SubScores,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Stage that records its invocations and optionally mutates the record
    struct ScriptedStage {
        kind: StageKind,
        calls: Arc<Mutex<Vec<StageKind>>>,
        outcomes: Mutex<VecDeque<Option<DecisionOutcome>>>,
        candidates: usize,
    }

    #[async_trait]
    impl Stage for ScriptedStage {
        fn kind(&self) -> StageKind {
            self.kind
        }

        async fn run(&self, mut record: EvaluationRecord) -> EvaluationRecord {
            self.calls.lock().unwrap().push(self.kind);
            match self.kind {
                StageKind::Persona => {
                    let answers = PersonaAnswers::new([5, 5, 1, 1, 5]).unwrap();
                    record.assign_persona(PersonaAssessment::from_answers(&answers)).unwrap();
                }
                StageKind::Ranking => {
                    let ranked = (0..self.candidates)
                        .map(|i| {
                            let input = CandidateInput::new(format!("C{}", i), "RWA", "strong");
                            CandidateEvaluation::from_input(&input, SubScores::new(50.0, 50.0, 50.0, 50.0), 50.0)
                        })
                        .collect();
                    record.set_ranking(ranked).unwrap();
                }
                StageKind::Decision => {
                    let next = self.outcomes.lock().unwrap().pop_front().flatten();
                    record.decision = next.map(|outcome| InvestmentDecision {
                        total_score: match outcome {
                            DecisionOutcome::Accept => 16,
                            DecisionOutcome::Hold => 13,
                            DecisionOutcome::Reject => 5,
                        },
                        outcome,
                        reasoning: "scripted".into(),
                        checklist_scores: vec![0; 20],
                    });
                }
                StageKind::Report => {
                    record.set_final_report("# done".into()).unwrap();
                }
                _ => {}
            }
            record
        }
    }

    fn sequencer(
        candidates: usize,
        outcomes: Vec<Option<DecisionOutcome>>,
        limits: WorkflowLimits,
    ) -> (StageSequencer, Arc<Mutex<Vec<StageKind>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let scripted = |kind: StageKind, outcomes: Vec<Option<DecisionOutcome>>| -> Arc<dyn Stage> {
            Arc::new(ScriptedStage {
                kind,
                calls: calls.clone(),
                outcomes: Mutex::new(outcomes.into()),
                candidates,
            })
        };
        let stages = StageSet {
            persona: scripted(StageKind::Persona, vec![]),
            ranking: scripted(StageKind::Ranking, vec![]),
            technical: scripted(StageKind::Technical, vec![]),
            market: scripted(StageKind::Market, vec![]),
            competitor: scripted(StageKind::Competitor, vec![]),
            decision: scripted(StageKind::Decision, outcomes),
            report: scripted(StageKind::Report, vec![]),
        };
        (StageSequencer::new(stages, limits).unwrap(), calls)
    }

    use DecisionOutcome::*;

    #[tokio::test]
    async fn test_stops_on_first_accept() {
        let (seq, calls) = sequencer(3, vec![Some(Reject), Some(Hold), Some(Accept)], WorkflowLimits::default());
        let outcome = seq.run(EvaluationRecord::new()).await.unwrap();

        assert_eq!(outcome.record.decision_log(), &[Reject, Hold, Accept]);
        assert_eq!(
            outcome.termination(),
            Some(&Termination::Accepted { candidate: "C2".into() })
        );
        assert_eq!(outcome.final_report(), Some("# done"));
        // persona + ranking + 3 x 4 deep stages + report
        assert_eq!(outcome.steps, 15);
        assert_eq!(calls.lock().unwrap().last(), Some(&StageKind::Report));
    }

    #[tokio::test]
    async fn test_budget_stops_before_sixth_candidate() {
        let (seq, calls) = sequencer(6, vec![Some(Hold); 6], WorkflowLimits::default());
        let outcome = seq.run(EvaluationRecord::new()).await.unwrap();

        assert_eq!(outcome.record.decision_log().len(), 5);
        assert_eq!(outcome.termination(), Some(&Termination::BudgetExhausted { evaluated: 5 }));
        let technical_runs = calls.lock().unwrap().iter().filter(|k| **k == StageKind::Technical).count();
        assert_eq!(technical_runs, 5);
    }

    #[tokio::test]
    async fn test_list_exhausted_before_budget() {
        let (seq, _) = sequencer(2, vec![Some(Reject), Some(Reject)], WorkflowLimits::default());
        let outcome = seq.run(EvaluationRecord::new()).await.unwrap();

        assert_eq!(outcome.record.decision_log(), &[Reject, Reject]);
        assert_eq!(
            outcome.termination(),
            Some(&Termination::CandidatesExhausted { evaluated: 2, total: 2 })
        );
        assert!(outcome.final_report().is_some());
    }

    #[tokio::test]
    async fn test_missing_decision_logs_default_hold() {
        let (seq, _) = sequencer(1, vec![None], WorkflowLimits::default());
        let outcome = seq.run(EvaluationRecord::new()).await.unwrap();

        assert_eq!(outcome.record.decision_log(), &[Hold]);
        assert_eq!(outcome.record.decision, None);
        assert_eq!(
            outcome.termination(),
            Some(&Termination::CandidatesExhausted { evaluated: 1, total: 1 })
        );
    }

    #[tokio::test]
    async fn test_empty_ranking_goes_straight_to_report() {
        let (seq, calls) = sequencer(0, vec![], WorkflowLimits::default());
        let outcome = seq.run(EvaluationRecord::new()).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![StageKind::Persona, StageKind::Ranking, StageKind::Report]
        );
        assert_eq!(
            outcome.termination(),
            Some(&Termination::CandidatesExhausted { evaluated: 0, total: 0 })
        );
    }

    #[tokio::test]
    async fn test_step_ceiling() {
        let limits = WorkflowLimits {
            max_steps: 7,
            rejection_budget: 5,
        };
        let (seq, calls) = sequencer(6, vec![Some(Hold); 6], limits);
        let result = seq.run(EvaluationRecord::new()).await;

        assert!(matches!(result, Err(DealflowError::StepLimitExceeded { limit: 7 })));
        assert_eq!(calls.lock().unwrap().len(), 7);
    }

    #[test]
    fn test_budgeted_steps() {
        assert_eq!(WorkflowLimits::default().budgeted_steps(), 23);
        assert!(WorkflowLimits::default().covers_budget());

        let wide = WorkflowLimits {
            max_steps: DEFAULT_MAX_STEPS,
            rejection_budget: 12,
        };
        assert_eq!(wide.budgeted_steps(), 51);
        assert!(!wide.covers_budget());

        let zero = WorkflowLimits {
            max_steps: 7,
            rejection_budget: 0,
        };
        assert_eq!(zero.budgeted_steps(), 7);
        assert!(zero.covers_budget());
    }

    #[tokio::test]
    async fn test_budgeted_ceiling_reaches_report() {
        let mut limits = WorkflowLimits::default();
        limits.max_steps = limits.budgeted_steps();
        let (seq, _) = sequencer(6, vec![Some(Hold); 6], limits);
        let outcome = seq.run(EvaluationRecord::new()).await.unwrap();
        assert_eq!(outcome.steps, 23);
        assert!(outcome.final_report().is_some());
    }

    #[test]
    fn test_mismatched_stage_slot_rejected() {
        let (seq, _) = sequencer(1, vec![], WorkflowLimits::default());
        let mut stages = seq.stages.clone();
        stages.market = stages.competitor.clone();
        assert!(matches!(
            StageSequencer::new(stages, WorkflowLimits::default()),
            Err(DealflowError::InvalidInput(_))
        ));
    }
}
