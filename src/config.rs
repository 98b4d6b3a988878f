use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use dealflow::llm::anthropic::DEFAULT_MODEL;
use dealflow::report::DEFAULT_REPORT_FILE;
use dealflow::stages::ReportSettings;
use dealflow::tech::TechLimits;
use dealflow::workflow::WorkflowLimits;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub workflow: WorkflowConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            timeout_ms: 300000,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_ms: 30000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub max_steps: u32,
    pub rejection_budget: usize,
    pub signal_attempts: u32,
    pub evidence_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            rejection_budget: 5,
            signal_attempts: 3,
            evidence_attempts: 3,
        }
    }
}

impl WorkflowConfig {
    /// Run limits; a ceiling too low for the rejection budget is raised to fit it
    pub fn limits(&self) -> WorkflowLimits {
        let mut limits = WorkflowLimits {
            max_steps: self.max_steps,
            rejection_budget: self.rejection_budget,
        };
        if !limits.covers_budget() {
            log::warn!(
                "workflow.max_steps {} cannot cover rejection_budget {}, raising to {}",
                self.max_steps,
                self.rejection_budget,
                limits.budgeted_steps()
            );
            limits.max_steps = limits.budgeted_steps();
        }
        limits
    }

    pub fn tech_limits(&self, max_results: usize) -> TechLimits {
        TechLimits {
            signal_attempts: self.signal_attempts.max(1),
            evidence_attempts: self.evidence_attempts.max(1),
            max_results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub write_summary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: DEFAULT_REPORT_FILE.to_string(),
            write_summary: true,
        }
    }
}

impl ReportConfig {
    pub fn settings(&self, output_dir: Option<&PathBuf>) -> ReportSettings {
        ReportSettings {
            output_dir: output_dir.cloned().unwrap_or_else(|| self.output_dir.clone()),
            file_name: self.file_name.clone(),
            write_summary: self.write_summary,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            workflow: WorkflowConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.workflow.limits(), WorkflowLimits::default());
        assert_eq!(config.report.file_name, "Final_Investment_Report.md");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dealflow.yml");
        fs::write(&path, "workflow:\n  rejection_budget: 3\nreport:\n  write_summary: false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.workflow.rejection_budget, 3);
        assert_eq!(config.workflow.max_steps, 50);
        assert!(!config.report.write_summary);
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn test_broken_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yml");
        fs::write(&path, "workflow: [not, a, map").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_report_output_override() {
        let config = ReportConfig::default();
        let override_dir = PathBuf::from("/tmp/reports");
        assert_eq!(config.settings(Some(&override_dir)).output_dir, override_dir);
        assert_eq!(config.settings(None).output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_step_ceiling_raised_for_large_budget() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dealflow.yml");
        fs::write(&path, "workflow:\n  rejection_budget: 12\n").unwrap();

        let limits = Config::load(Some(&path)).unwrap().workflow.limits();
        assert_eq!(limits.rejection_budget, 12);
        assert_eq!(limits.max_steps, 51);

        let roomy = WorkflowConfig {
            max_steps: 80,
            rejection_budget: 12,
            ..Default::default()
        };
        assert_eq!(roomy.limits().max_steps, 80);
    }

    #[test]
    fn test_tech_limits_floor() {
        let workflow = WorkflowConfig {
            signal_attempts: 0,
            ..Default::default()
        };
        let limits = workflow.tech_limits(7);
        assert_eq!(limits.signal_attempts, 1);
        assert_eq!(limits.max_results, 7);
    }
}
