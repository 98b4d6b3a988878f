//! Per-candidate verdicts and checklist normalization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of yes/no criteria on the decision checklist
pub const CHECKLIST_LEN: usize = 20;

/// Verdict rendered for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Accept,
    Hold,
    Reject,
}

impl DecisionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionOutcome::Accept => "accept",
            DecisionOutcome::Hold => "hold",
            DecisionOutcome::Reject => "reject",
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, DecisionOutcome::Accept)
    }

    /// Short marker used in report tables
    pub fn marker(&self) -> &'static str {
        match self {
            DecisionOutcome::Accept => "✅",
            DecisionOutcome::Hold => "⏸️",
            DecisionOutcome::Reject => "❌",
        }
    }
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the decision stage for the current candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentDecision {
    /// Number of passed checklist items, 0-20
    pub total_score: u32,
    pub outcome: DecisionOutcome,
    pub reasoning: String,
    /// Exactly [`CHECKLIST_LEN`] binary entries
    pub checklist_scores: Vec<u8>,
}

impl InvestmentDecision {
    /// Decision substituted when the decision stage could not produce one
    pub fn fallback() -> Self {
        Self {
            total_score: 0,
            outcome: DecisionOutcome::Hold,
            reasoning: "Evaluation incomplete due to technical error.".to_string(),
            checklist_scores: vec![0; CHECKLIST_LEN],
        }
    }

    pub fn passed_count(&self) -> usize {
        self.checklist_scores.iter().filter(|s| **s == 1).count()
    }
}

/// Force a returned score array to exactly [`CHECKLIST_LEN`] binary entries.
///
/// Longer arrays are truncated, shorter ones zero-padded; any value >= 1
/// counts as a pass so the total always lands in 0..=20.
pub fn normalize_checklist(raw: &[i64]) -> Vec<u8> {
    let mut scores: Vec<u8> = raw
        .iter()
        .take(CHECKLIST_LEN)
        .map(|v| if *v >= 1 { 1 } else { 0 })
        .collect();
    scores.resize(CHECKLIST_LEN, 0);
    scores
}

/// Sum of a normalized checklist
pub fn checklist_total(scores: &[u8]) -> u32 {
    scores.iter().map(|s| *s as u32).sum()
}
