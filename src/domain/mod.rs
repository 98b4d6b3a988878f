//! Domain types for dealflow
//!
//! This module contains the core domain types:
//! - Persona: investor weighting profile and the answers that select it
//! - Candidate: input records and their ranked evaluations
//! - Decision: per-candidate verdicts and checklist normalization
//! - Payload: typed outputs of the deep-analysis stages
//! - Record: the evaluation record threaded through every stage

pub mod candidate;
pub mod decision;
pub mod payload;
pub mod persona;
pub mod record;

pub use candidate::{CandidateEvaluation, CandidateInput, SubScores, UNKNOWN, load_candidates, round2};
pub use decision::{CHECKLIST_LEN, DecisionOutcome, InvestmentDecision, checklist_total, normalize_checklist};
pub use payload::{
    Competitor, CompetitorAnalysis, DecisionNotes, Evidence, MarketAssessment, ScoreDimension, ScoreVector,
    SourceKind, StageOutput, Swot, TechPayload,
};
pub use persona::{PERSONA_QUESTIONS, Persona, PersonaAnswers, PersonaAssessment};
pub use record::{CandidateCursor, EvaluationRecord, Termination};
