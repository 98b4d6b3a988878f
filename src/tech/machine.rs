//! The guarded technical-analysis sub-workflow.
//!
//! A small state machine: each [`TechNode`] does one piece of work on the
//! local [`TechState`], and [`transition`] picks the next node from the state
//! alone. Two back-edges exist: `GuardCheck -> CollectSignals` when no signals
//! were found, and `QualityGate -> BuildEvidence` when evidence is empty. Both
//! are bounded by attempt counters in [`TechLimits`].

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use super::advisor::{NarrativeBrief, TechAdvisor};
use super::evidence;
use super::scoring::{self, FALLBACK_NARRATIVE, FALLBACK_POSITIONING};
use super::signals::{self, RawSignal, Signal};
use crate::domain::{DecisionNotes, Evidence, ScoreVector, TechPayload, UNKNOWN};
use crate::search::SearchClient;

/// Company fields the sub-workflow reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechInput {
    pub name: String,
    pub website: String,
    pub segment: String,
    pub region: String,
    pub funding_stage: String,
}

/// Retry bounds and search width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechLimits {
    /// Collection attempts before giving up on signals
    pub signal_attempts: u32,
    /// Evidence builds before the gate accepts an empty list
    pub evidence_attempts: u32,
    /// Hits requested per query
    pub max_results: usize,
}

impl Default for TechLimits {
    fn default() -> Self {
        Self {
            signal_attempts: 3,
            evidence_attempts: 3,
            max_results: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TechNode {
    Ingest,
    CollectSignals,
    Normalize,
    GuardCheck,
    Score,
    Finalize,
    BuildEvidence,
    DecisionNotes,
    Narrative,
    Emit,
    QualityGate,
    /// Signal collection exhausted its attempts; fill in fallback data
    Degrade,
    Done,
}

impl fmt::Display for TechNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TechNode::Ingest => "ingest",
            TechNode::CollectSignals => "collect_signals",
            TechNode::Normalize => "normalize",
            TechNode::GuardCheck => "guard_check",
            TechNode::Score => "score",
            TechNode::Finalize => "finalize",
            TechNode::BuildEvidence => "build_evidence",
            TechNode::DecisionNotes => "decision_notes",
            TechNode::Narrative => "narrative",
            TechNode::Emit => "emit",
            TechNode::QualityGate => "quality_gate",
            TechNode::Degrade => "degrade",
            TechNode::Done => "done",
        };
        f.write_str(name)
    }
}

/// Working state of one sub-workflow run, discarded afterwards
#[derive(Debug, Clone, Default)]
pub struct TechState {
    pub company: TechInput,
    pub raw_signals: Vec<RawSignal>,
    pub signals: Vec<Signal>,
    pub scores: Option<ScoreVector>,
    pub final_score: f64,
    pub evidence: Vec<Evidence>,
    pub notes: DecisionNotes,
    pub narrative: String,
    pub payload: Option<TechPayload>,
    pub signal_attempts: u32,
    pub evidence_attempts: u32,
    pub degraded: bool,
    pub issues: Vec<String>,
}

/// Outcome of the quality gate over an emitted payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Pass,
    /// Evidence is empty and another build is allowed
    Fix,
    /// Terminal with an unresolved finding
    Fail(String),
}

/// Judge an emitted payload
pub fn quality_gate(payload: &TechPayload, evidence_attempts: u32, limits: &TechLimits, degraded: bool) -> GateVerdict {
    if payload.name.trim().is_empty() {
        return GateVerdict::Fail("missing name".to_string());
    }
    if payload.narrative.trim().is_empty() {
        return GateVerdict::Fail("missing narrative".to_string());
    }
    if payload.evidence.is_empty() {
        if degraded || evidence_attempts >= limits.evidence_attempts {
            return GateVerdict::Fail(format!("no evidence after {} attempt(s)", evidence_attempts));
        }
        return GateVerdict::Fix;
    }
    GateVerdict::Pass
}

/// Pick the node that follows `node`, given the state it left behind
pub fn transition(node: TechNode, state: &TechState, limits: &TechLimits) -> TechNode {
    match node {
        TechNode::Ingest => TechNode::CollectSignals,
        TechNode::CollectSignals => TechNode::Normalize,
        TechNode::Normalize => TechNode::GuardCheck,
        TechNode::GuardCheck => {
            if !state.signals.is_empty() {
                TechNode::Score
            } else if state.signal_attempts < limits.signal_attempts {
                TechNode::CollectSignals
            } else {
                TechNode::Degrade
            }
        }
        TechNode::Score => TechNode::Finalize,
        TechNode::Finalize => TechNode::BuildEvidence,
        TechNode::BuildEvidence => TechNode::DecisionNotes,
        TechNode::DecisionNotes => TechNode::Narrative,
        TechNode::Narrative => TechNode::Emit,
        TechNode::Degrade => TechNode::Emit,
        TechNode::Emit => TechNode::QualityGate,
        TechNode::QualityGate => match &state.payload {
            Some(payload) => match quality_gate(payload, state.evidence_attempts, limits, state.degraded) {
                GateVerdict::Fix => TechNode::BuildEvidence,
                GateVerdict::Pass | GateVerdict::Fail(_) => TechNode::Done,
            },
            None => TechNode::Done,
        },
        TechNode::Done => TechNode::Done,
    }
}

/// Runs the sub-workflow against a search client and an advisor
pub struct GuardedSubWorkflow {
    search: Arc<dyn SearchClient>,
    advisor: Arc<dyn TechAdvisor>,
    limits: TechLimits,
}

impl GuardedSubWorkflow {
    pub fn new(search: Arc<dyn SearchClient>, advisor: Arc<dyn TechAdvisor>, limits: TechLimits) -> Self {
        Self { search, advisor, limits }
    }

    pub fn limits(&self) -> &TechLimits {
        &self.limits
    }

    /// Run to completion. Never fails: every lookup has a fallback.
    pub async fn run(&self, input: TechInput) -> TechPayload {
        let mut state = TechState {
            company: input,
            ..Default::default()
        };
        let mut node = TechNode::Ingest;
        let mut visited = 0u32;

        while node != TechNode::Done {
            visited += 1;
            debug!("tech[{}]: node {} (visit {})", state.company.name, node, visited);
            self.execute(node, &mut state).await;
            node = transition(node, &state, &self.limits);
        }

        let mut payload = match state.payload.take() {
            Some(payload) => payload,
            None => emit(&state),
        };
        payload.issues = state.issues;
        info!(
            "tech[{}]: final score {:.3}, {} evidence item(s), {} issue(s)",
            payload.name,
            payload.final_score,
            payload.evidence.len(),
            payload.issues.len()
        );
        payload
    }

    async fn execute(&self, node: TechNode, state: &mut TechState) {
        match node {
            TechNode::Ingest => ingest(state),
            TechNode::CollectSignals => self.collect_signals(state).await,
            TechNode::Normalize => {
                state.signals = signals::normalize(&state.raw_signals);
                debug!("tech[{}]: {} signal(s) normalized", state.company.name, state.signals.len());
            }
            TechNode::GuardCheck => {
                if state.signals.is_empty() {
                    warn!(
                        "tech[{}]: no signals after attempt {}/{}",
                        state.company.name, state.signal_attempts, self.limits.signal_attempts
                    );
                }
            }
            TechNode::Score => self.score(state).await,
            TechNode::Finalize => {
                let scores = state.scores.unwrap_or_else(|| scoring::base_scores(&state.company.segment, &[]));
                state.final_score = scoring::final_score(&scores);
            }
            TechNode::BuildEvidence => self.build_evidence(state).await,
            TechNode::DecisionNotes => self.decision_notes(state).await,
            TechNode::Narrative => self.narrative(state).await,
            TechNode::Emit => state.payload = Some(emit(state)),
            TechNode::QualityGate => self.quality_gate(state),
            TechNode::Degrade => degrade(state, self.limits.signal_attempts),
            TechNode::Done => {}
        }
    }

    async fn collect_signals(&self, state: &mut TechState) {
        state.signal_attempts += 1;
        let today = chrono::Utc::now().date_naive().to_string();
        let mut hits = Vec::new();

        for query in signals::signal_queries(&state.company.name, &state.company.segment) {
            match self.search.search(&query, self.limits.max_results).await {
                Ok(found) => hits.extend(found),
                Err(e) => warn!("tech[{}]: search '{}' failed: {}", state.company.name, query, e),
            }
        }

        state.raw_signals = signals::collect_from_hits(&hits, &state.company.website, &today);
        debug!("tech[{}]: {} raw signal(s) collected", state.company.name, state.raw_signals.len());
    }

    async fn score(&self, state: &mut TechState) {
        let base = scoring::base_scores(&state.company.segment, &state.signals);
        let scores = match self.advisor.adjust_scores(&state.signals, &base).await {
            Ok(proposed) => scoring::apply_correction(&base, &proposed),
            Err(e) => {
                warn!("tech[{}]: score correction failed, using base scores: {}", state.company.name, e);
                base
            }
        };
        state.scores = Some(scores);
    }

    async fn build_evidence(&self, state: &mut TechState) {
        state.evidence_attempts += 1;
        if state.signals.is_empty() {
            state.evidence = Vec::new();
            return;
        }

        let top = evidence::select_top(&state.signals);
        let today = chrono::Utc::now().date_naive().to_string();
        let distilled = match self.advisor.distill_evidence(&top).await {
            Ok(drafts) => evidence::distill(&drafts, &today),
            Err(e) => {
                warn!("tech[{}]: evidence distillation failed: {}", state.company.name, e);
                Vec::new()
            }
        };

        // Top signals stand in only once the gate has no rebuilds left
        state.evidence = if !distilled.is_empty() {
            distilled
        } else if state.evidence_attempts >= self.limits.evidence_attempts {
            warn!(
                "tech[{}]: no usable evidence after {} attempt(s), using top signals",
                state.company.name, state.evidence_attempts
            );
            evidence::fallback(&top)
        } else {
            debug!(
                "tech[{}]: no usable evidence on attempt {}/{}",
                state.company.name, state.evidence_attempts, self.limits.evidence_attempts
            );
            Vec::new()
        };
        debug!("tech[{}]: {} evidence item(s)", state.company.name, state.evidence.len());
    }

    async fn decision_notes(&self, state: &mut TechState) {
        let scores = state.scores.unwrap_or_else(|| scoring::base_scores(&state.company.segment, &[]));
        let (strengths, risks) = scoring::strengths_and_risks(&scores);
        let positioning = match self.advisor.positioning(&scores, &strengths, &risks).await {
            Ok(sentence) => sentence,
            Err(e) => {
                warn!("tech[{}]: positioning failed: {}", state.company.name, e);
                FALLBACK_POSITIONING.to_string()
            }
        };
        state.notes = DecisionNotes {
            strengths,
            risks,
            positioning,
        };
    }

    async fn narrative(&self, state: &mut TechState) {
        let brief = NarrativeBrief {
            name: state.company.name.clone(),
            segment: state.company.segment.clone(),
            scores: state.scores.unwrap_or_else(|| scoring::base_scores(&state.company.segment, &[])),
            final_score: state.final_score,
            positioning: state.notes.positioning.clone(),
            evidence: state.evidence.iter().take(evidence::EVIDENCE_POOL).cloned().collect(),
        };
        state.narrative = match self.advisor.narrative(&brief).await {
            Ok(text) => text,
            Err(e) => {
                warn!("tech[{}]: narrative failed: {}", state.company.name, e);
                FALLBACK_NARRATIVE.to_string()
            }
        };
    }

    fn quality_gate(&self, state: &mut TechState) {
        let Some(payload) = &state.payload else {
            state.issues.push("no payload emitted".to_string());
            return;
        };
        match quality_gate(payload, state.evidence_attempts, &self.limits, state.degraded) {
            GateVerdict::Pass => debug!("tech[{}]: quality gate passed", state.company.name),
            GateVerdict::Fix => warn!(
                "tech[{}]: quality gate found no evidence, rebuilding (attempt {}/{})",
                state.company.name,
                state.evidence_attempts + 1,
                self.limits.evidence_attempts
            ),
            GateVerdict::Fail(issue) => {
                warn!("tech[{}]: quality gate failed: {}", state.company.name, issue);
                if !state.issues.contains(&issue) {
                    state.issues.push(issue);
                }
            }
        }
    }
}

fn ingest(state: &mut TechState) {
    let company = &mut state.company;
    company.name = company.name.trim().to_string();
    for field in [&mut company.website, &mut company.region, &mut company.funding_stage] {
        if field.trim().is_empty() {
            *field = UNKNOWN.to_string();
        }
    }
}

/// Fill the state with deterministic fallback data after signal collection gave up
fn degrade(state: &mut TechState, attempts: u32) {
    state.degraded = true;
    let scores = scoring::base_scores(&state.company.segment, &[]);
    let (strengths, risks) = scoring::strengths_and_risks(&scores);
    state.scores = Some(scores);
    state.final_score = scoring::final_score(&scores);
    state.evidence = Vec::new();
    state.notes = DecisionNotes {
        strengths,
        risks,
        positioning: FALLBACK_POSITIONING.to_string(),
    };
    state.narrative = FALLBACK_NARRATIVE.to_string();
    state.issues.push(format!("no signals collected after {} attempt(s)", attempts));
    warn!("tech[{}]: degraded payload, no signals after {} attempt(s)", state.company.name, attempts);
}

fn emit(state: &TechState) -> TechPayload {
    let company = &state.company;
    TechPayload {
        name: company.name.clone(),
        website: company.website.clone(),
        segment: company.segment.clone(),
        region: company.region.clone(),
        funding_stage: company.funding_stage.clone(),
        scores: state.scores.unwrap_or_else(|| scoring::base_scores(&company.segment, &[])),
        final_score: state.final_score,
        reason: state.notes.positioning.clone(),
        evidence: state.evidence.clone(),
        notes: state.notes.clone(),
        narrative: state.narrative.clone(),
        issues: Vec::new(),
    }
}
