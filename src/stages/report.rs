//! Report stage: renders the final report and writes it to disk.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use crate::domain::EvaluationRecord;
use crate::policy::EvaluationPolicy;
use crate::report::{self, DEFAULT_REPORT_FILE, RunSummary};
use crate::workflow::{Stage, StageKind};

/// Where and what the report stage writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub write_summary: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: DEFAULT_REPORT_FILE.to_string(),
            write_summary: true,
        }
    }
}

pub struct ReportStage {
    policy: Arc<EvaluationPolicy>,
    settings: ReportSettings,
    run_id: String,
}

impl ReportStage {
    pub fn new(policy: Arc<EvaluationPolicy>, settings: ReportSettings, run_id: impl Into<String>) -> Self {
        Self {
            policy,
            settings,
            run_id: run_id.into(),
        }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }
}

#[async_trait]
impl Stage for ReportStage {
    fn kind(&self) -> StageKind {
        StageKind::Report
    }

    async fn run(&self, mut record: EvaluationRecord) -> EvaluationRecord {
        if record.final_report().is_some() {
            warn!("final report already written, skipping");
            return record;
        }

        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let content = report::render_report(&record, &self.policy, &generated_at);

        let summary = self
            .settings
            .write_summary
            .then(|| RunSummary::from_record(&record, &self.run_id, &generated_at));
        match report::write_artifacts(
            &self.settings.output_dir,
            &self.settings.file_name,
            &content,
            summary.as_ref(),
        ) {
            Ok(path) => info!("report written to {}", path.display()),
            Err(e) => warn!("failed to write report to {}: {}", self.settings.output_dir.display(), e),
        }

        if let Err(e) = record.set_final_report(content) {
            warn!("failed to store final report: {}", e);
        }
        record
    }
}
