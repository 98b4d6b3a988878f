//! Typed payloads produced by the deep-analysis stages.
//!
//! Each analysis slot on the record holds a [`StageOutput`], so consumers
//! match on `Ready` / `Unavailable` instead of probing for optional keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result slot of one analysis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum StageOutput<T> {
    Ready(T),
    Unavailable { reason: String },
}

impl<T> StageOutput<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StageOutput::Unavailable { reason: reason.into() }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            StageOutput::Ready(value) => Some(value),
            StageOutput::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, StageOutput::Ready(_))
    }
}

/// The five technical score dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDimension {
    DomainFit,
    TechMaturity,
    Credibility,
    ComplianceRisk,
    Ecosystem,
}

impl ScoreDimension {
    pub const ALL: [ScoreDimension; 5] = [
        ScoreDimension::DomainFit,
        ScoreDimension::TechMaturity,
        ScoreDimension::Credibility,
        ScoreDimension::ComplianceRisk,
        ScoreDimension::Ecosystem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreDimension::DomainFit => "domain_fit",
            ScoreDimension::TechMaturity => "tech_maturity",
            ScoreDimension::Credibility => "credibility",
            ScoreDimension::ComplianceRisk => "compliance_risk",
            ScoreDimension::Ecosystem => "ecosystem",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == key.trim())
    }
}

impl fmt::Display for ScoreDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-shape technical score vector, every dimension in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub domain_fit: f64,
    pub tech_maturity: f64,
    pub credibility: f64,
    pub compliance_risk: f64,
    pub ecosystem: f64,
}

impl ScoreVector {
    pub fn get(&self, dimension: ScoreDimension) -> f64 {
        match dimension {
            ScoreDimension::DomainFit => self.domain_fit,
            ScoreDimension::TechMaturity => self.tech_maturity,
            ScoreDimension::Credibility => self.credibility,
            ScoreDimension::ComplianceRisk => self.compliance_risk,
            ScoreDimension::Ecosystem => self.ecosystem,
        }
    }

    /// Store `value` clamped to [0, 1]; NaN stores 0
    pub fn set(&mut self, dimension: ScoreDimension, value: f64) {
        let slot = match dimension {
            ScoreDimension::DomainFit => &mut self.domain_fit,
            ScoreDimension::TechMaturity => &mut self.tech_maturity,
            ScoreDimension::Credibility => &mut self.credibility,
            ScoreDimension::ComplianceRisk => &mut self.compliance_risk,
            ScoreDimension::Ecosystem => &mut self.ecosystem,
        };
        *slot = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    }
}

/// Provenance category of a collected signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Site,
    Repo,
    Report,
    Press,
    Other,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Site => "site",
            SourceKind::Repo => "repo",
            SourceKind::Report => "report",
            SourceKind::Press => "press",
            SourceKind::Other => "other",
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "site" => SourceKind::Site,
            "repo" => SourceKind::Repo,
            "report" => SourceKind::Report,
            "press" => SourceKind::Press,
            _ => SourceKind::Other,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evidence item supporting a score dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub source: SourceKind,
    pub url: String,
    pub date: String,
    pub snippet: String,
    /// `None` marks generic evidence not tied to one dimension
    pub relates_to: Option<ScoreDimension>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionNotes {
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub positioning: String,
}

/// Payload emitted by the technical sub-workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechPayload {
    pub name: String,
    pub website: String,
    pub segment: String,
    pub region: String,
    pub funding_stage: String,
    pub scores: ScoreVector,
    pub final_score: f64,
    pub reason: String,
    pub evidence: Vec<Evidence>,
    pub notes: DecisionNotes,
    pub narrative: String,
    /// Quality-gate findings that were left unresolved; empty when the gate passed
    #[serde(default)]
    pub issues: Vec<String>,
}

impl TechPayload {
    pub fn passed_quality_gate(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketAssessment {
    pub tam_sam_som: String,
    pub cagr: String,
    pub target_audience: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Swot {
    Split {
        #[serde(alias = "Strength")]
        strength: String,
        #[serde(alias = "Weakness")]
        weakness: String,
    },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub swot: Swot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub competitors: Vec<Competitor>,
}
