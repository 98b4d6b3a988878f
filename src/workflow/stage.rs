//! The stage seam between the sequencer and the analysis steps.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::EvaluationRecord;

/// The seven top-level stages, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Persona,
    Ranking,
    Technical,
    Market,
    Competitor,
    Decision,
    Report,
}

impl StageKind {
    pub const ALL: [StageKind; 7] = [
        StageKind::Persona,
        StageKind::Ranking,
        StageKind::Technical,
        StageKind::Market,
        StageKind::Competitor,
        StageKind::Decision,
        StageKind::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Persona => "persona",
            StageKind::Ranking => "ranking",
            StageKind::Technical => "technical",
            StageKind::Market => "market",
            StageKind::Competitor => "competitor",
            StageKind::Decision => "decision",
            StageKind::Report => "report",
        }
    }

    /// Stages re-run for every candidate
    pub fn is_deep_analysis(&self) -> bool {
        matches!(
            self,
            StageKind::Technical | StageKind::Market | StageKind::Competitor | StageKind::Decision
        )
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the pipeline.
///
/// A stage takes the record by value, so it owns it exclusively for the
/// duration of the call, and must hand back a structurally valid record even
/// when its collaborators fail. Errors never cross this boundary.
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    async fn run(&self, record: EvaluationRecord) -> EvaluationRecord;
}
