//! The evaluation record threaded through every stage of a run.
//!
//! Invariants enforced here:
//! - the persona is assigned at most once
//! - the ranked list is fixed once ranking has run
//! - the cursor points into the ranked list or is `Exhausted`
//! - the decision log only grows
//! - the final report is written at most once

use serde::{Deserialize, Serialize};

use super::candidate::CandidateEvaluation;
use super::decision::{DecisionOutcome, InvestmentDecision};
use super::payload::{CompetitorAnalysis, MarketAssessment, StageOutput, TechPayload};
use super::persona::{Persona, PersonaAssessment};
use crate::error::{DealflowError, Result};

/// Position of the candidate currently under evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateCursor {
    Active(usize),
    Exhausted,
}

impl CandidateCursor {
    pub fn index(&self) -> Option<usize> {
        match self {
            CandidateCursor::Active(idx) => Some(*idx),
            CandidateCursor::Exhausted => None,
        }
    }

    /// Legacy integer form: the index, or -1 once exhausted
    pub fn as_sentinel(&self) -> i64 {
        match self {
            CandidateCursor::Active(idx) => *idx as i64,
            CandidateCursor::Exhausted => -1,
        }
    }
}

/// Why the candidate loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// A candidate cleared the bar
    Accepted { candidate: String },
    /// The hold/reject budget ran out
    BudgetExhausted { evaluated: usize },
    /// Every ranked candidate was examined before the budget ran out
    CandidatesExhausted { evaluated: usize, total: usize },
}

impl Termination {
    pub fn is_success(&self) -> bool {
        matches!(self, Termination::Accepted { .. })
    }

    pub fn reason(&self) -> String {
        match self {
            Termination::Accepted { candidate } => format!("{} accepted", candidate),
            Termination::BudgetExhausted { evaluated } => {
                format!("Rejection budget exhausted after {} hold/reject decisions", evaluated)
            }
            Termination::CandidatesExhausted { evaluated, total } => {
                format!(
                    "Candidate list exhausted: {} of {} ranked candidates evaluated",
                    evaluated, total
                )
            }
        }
    }
}

/// The shared record. Created empty at run start, mutated stage by stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    persona: Option<PersonaAssessment>,
    ranked_candidates: Vec<CandidateEvaluation>,
    ranked: bool,
    cursor: CandidateCursor,
    current_candidate: Option<CandidateEvaluation>,

    // Per-candidate analysis slots, overwritten on every pass
    pub tech_summary: Option<StageOutput<TechPayload>>,
    pub market_assessment: Option<StageOutput<MarketAssessment>>,
    pub competitor_analysis: Option<StageOutput<CompetitorAnalysis>>,
    pub decision: Option<InvestmentDecision>,

    decision_log: Vec<DecisionOutcome>,
    termination: Option<Termination>,
    final_report: Option<String>,
}

impl Default for EvaluationRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationRecord {
    pub fn new() -> Self {
        Self {
            persona: None,
            ranked_candidates: Vec::new(),
            ranked: false,
            cursor: CandidateCursor::Exhausted,
            current_candidate: None,
            tech_summary: None,
            market_assessment: None,
            competitor_analysis: None,
            decision: None,
            decision_log: Vec::new(),
            termination: None,
            final_report: None,
        }
    }

    //=== Persona ===

    pub fn persona_assessment(&self) -> Option<&PersonaAssessment> {
        self.persona.as_ref()
    }

    pub fn persona(&self) -> Option<Persona> {
        self.persona.as_ref().map(|p| p.persona)
    }

    pub fn assign_persona(&mut self, assessment: PersonaAssessment) -> Result<()> {
        if self.persona.is_some() {
            return Err(DealflowError::InvalidState("persona already assigned".to_string()));
        }
        self.persona = Some(assessment);
        Ok(())
    }

    //=== Ranking and cursor ===

    /// Fix the ranked list and point the cursor at its first entry
    pub fn set_ranking(&mut self, ranked: Vec<CandidateEvaluation>) -> Result<()> {
        if self.ranked {
            return Err(DealflowError::InvalidState("ranking already fixed".to_string()));
        }
        self.ranked_candidates = ranked;
        self.ranked = true;
        let first = if self.ranked_candidates.is_empty() {
            CandidateCursor::Exhausted
        } else {
            CandidateCursor::Active(0)
        };
        self.move_to(first);
        Ok(())
    }

    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    pub fn ranked_candidates(&self) -> &[CandidateEvaluation] {
        &self.ranked_candidates
    }

    pub fn cursor(&self) -> CandidateCursor {
        self.cursor
    }

    pub fn current_candidate(&self) -> Option<&CandidateEvaluation> {
        self.current_candidate.as_ref()
    }

    /// Working copy for stage-local enrichment; never written back to the ranking
    pub fn current_candidate_mut(&mut self) -> Option<&mut CandidateEvaluation> {
        self.current_candidate.as_mut()
    }

    /// Move the cursor, refresh the working copy and reset the analysis slots
    pub(crate) fn move_to(&mut self, cursor: CandidateCursor) {
        let cursor = match cursor {
            CandidateCursor::Active(idx) if idx < self.ranked_candidates.len() => cursor,
            _ => CandidateCursor::Exhausted,
        };
        self.cursor = cursor;
        self.current_candidate = cursor.index().map(|idx| self.ranked_candidates[idx].clone());
        self.clear_analysis();
    }

    fn clear_analysis(&mut self) {
        self.tech_summary = None;
        self.market_assessment = None;
        self.competitor_analysis = None;
        self.decision = None;
    }

    //=== Decision log ===

    pub fn decision_log(&self) -> &[DecisionOutcome] {
        &self.decision_log
    }

    /// Authoritative count of fully evaluated candidates
    pub fn candidates_processed(&self) -> usize {
        self.decision_log.len()
    }

    pub(crate) fn log_decision(&mut self, outcome: DecisionOutcome) {
        self.decision_log.push(outcome);
    }

    //=== Termination and report ===

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub(crate) fn set_termination(&mut self, termination: Termination) {
        self.termination = Some(termination);
    }

    pub fn final_report(&self) -> Option<&str> {
        self.final_report.as_deref()
    }

    pub fn set_final_report(&mut self, report: String) -> Result<()> {
        if self.final_report.is_some() {
            return Err(DealflowError::InvalidState("final report already written".to_string()));
        }
        self.final_report = Some(report);
        Ok(())
    }

    /// Ranked candidates that have a decision, paired with it, in evaluation order
    pub fn evaluated_candidates(&self) -> impl Iterator<Item = (&CandidateEvaluation, DecisionOutcome)> {
        self.ranked_candidates
            .iter()
            .zip(self.decision_log.iter().copied())
    }
}
