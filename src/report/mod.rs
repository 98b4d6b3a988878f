//! Final report rendering and artifact output

pub mod render;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::{CandidateEvaluation, DecisionOutcome, EvaluationRecord, PersonaAssessment, Termination};
use crate::error::Result;

pub use render::{RiskRating, render_exhaustion, render_report, render_success};

pub const DEFAULT_REPORT_FILE: &str = "Final_Investment_Report.md";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Machine-readable companion to the markdown report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub generated_at: String,
    pub persona: Option<PersonaAssessment>,
    pub ranking: Vec<CandidateEvaluation>,
    pub decision_log: Vec<DecisionOutcome>,
    pub candidates_processed: usize,
    /// Final cursor position; -1 once the ranked list was exhausted
    pub cursor: i64,
    pub termination: Option<Termination>,
}

impl RunSummary {
    pub fn from_record(record: &EvaluationRecord, run_id: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            generated_at: generated_at.into(),
            persona: record.persona_assessment().cloned(),
            ranking: record.ranked_candidates().to_vec(),
            decision_log: record.decision_log().to_vec(),
            candidates_processed: record.candidates_processed(),
            cursor: record.cursor().as_sentinel(),
            termination: record.termination().cloned(),
        }
    }
}

/// Write the report, and the summary when given, into `dir`. Returns the report path.
pub fn write_artifacts(dir: &Path, file_name: &str, report: &str, summary: Option<&RunSummary>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let report_path = dir.join(file_name);
    fs::write(&report_path, report)?;
    debug!("wrote {}", report_path.display());

    if let Some(summary) = summary {
        let summary_path = dir.join(SUMMARY_FILE);
        fs::write(&summary_path, serde_json::to_string_pretty(summary)?)?;
        debug!("wrote {}", summary_path.display());
    }
    Ok(report_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidateCursor, CandidateInput, SubScores};
    use tempfile::TempDir;

    #[test]
    fn test_write_report_and_summary() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        let mut record = EvaluationRecord::new();
        record.log_decision(DecisionOutcome::Hold);
        record.set_termination(Termination::BudgetExhausted { evaluated: 1 });
        let summary = RunSummary::from_record(&record, "run-1", "2026-01-01 09:00:00");

        let path = write_artifacts(&dir, DEFAULT_REPORT_FILE, "# report", Some(&summary)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# report");

        let json = fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap();
        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
        assert_eq!(parsed.decision_log, vec![DecisionOutcome::Hold]);
        assert_eq!(parsed.candidates_processed, 1);
        assert_eq!(parsed.cursor, -1);
        assert!(json.contains("\"cursor\": -1"));
    }

    #[test]
    fn test_summary_records_active_cursor() {
        let mut record = EvaluationRecord::new();
        let input = CandidateInput::new("Acme", "RWA", "licensed custody");
        let ranked = vec![
            CandidateEvaluation::from_input(&input, SubScores::new(70.0, 70.0, 70.0, 70.0), 70.0),
            CandidateEvaluation::from_input(&input, SubScores::new(60.0, 60.0, 60.0, 60.0), 60.0),
        ];
        record.set_ranking(ranked).unwrap();
        record.log_decision(DecisionOutcome::Reject);
        record.move_to(CandidateCursor::Active(1));

        let summary = RunSummary::from_record(&record, "run-2", "2026-01-01 09:00:00");
        assert_eq!(summary.candidates_processed, 1);
        assert_eq!(summary.cursor, 1);
    }

    #[test]
    fn test_summary_optional() {
        let temp = TempDir::new().unwrap();
        write_artifacts(temp.path(), "r.md", "x", None).unwrap();
        assert!(!temp.path().join(SUMMARY_FILE).exists());
    }
}
