//! Candidate records: the pre-loaded input list and the ranked evaluations.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DealflowError, Result};

/// Placeholder for enrichment fields nobody could determine
pub const UNKNOWN: &str = "Unknown";

/// The four 0-100 criterion scores combined into a rank score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub seed_early: f64,
    pub regional_esg: f64,
    pub growth_partnership: f64,
    pub regulation_monetization: f64,
}

impl SubScores {
    pub fn new(seed_early: f64, regional_esg: f64, growth_partnership: f64, regulation_monetization: f64) -> Self {
        Self {
            seed_early,
            regional_esg,
            growth_partnership,
            regulation_monetization,
        }
        .clamped()
    }

    /// Clamp every criterion into 0-100
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
        Self {
            seed_early: clamp(self.seed_early),
            regional_esg: clamp(self.regional_esg),
            growth_partnership: clamp(self.growth_partnership),
            regulation_monetization: clamp(self.regulation_monetization),
        }
    }

    /// (seed_early + growth_partnership) / 200
    pub fn domain_fit(&self) -> f64 {
        (self.seed_early + self.growth_partnership) / 200.0
    }

    /// (regulation_monetization + regional_esg) / 200
    pub fn credibility(&self) -> f64 {
        (self.regulation_monetization + self.regional_esg) / 200.0
    }
}

/// One entry of the candidate list as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInput {
    pub name: String,
    pub sector: String,
    pub strength: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_scores: Option<SubScores>,
}

impl CandidateInput {
    pub fn new(name: impl Into<String>, sector: impl Into<String>, strength: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sector: sector.into(),
            strength: strength.into(),
            website: None,
            region: None,
            funding_stage: None,
            sub_scores: None,
        }
    }

    pub fn with_sub_scores(mut self, sub_scores: SubScores) -> Self {
        self.sub_scores = Some(sub_scores);
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }
}

/// Load the candidate list from a JSON array file
pub fn load_candidates(path: &Path) -> Result<Vec<CandidateInput>> {
    let content = fs::read_to_string(path)?;
    let candidates: Vec<CandidateInput> = serde_json::from_str(&content)?;
    if candidates.is_empty() {
        return Err(DealflowError::InvalidInput(format!(
            "candidate list {} is empty",
            path.display()
        )));
    }
    if let Some(unnamed) = candidates.iter().position(|c| c.name.trim().is_empty()) {
        return Err(DealflowError::InvalidInput(format!("candidate #{} has an empty name", unnamed + 1)));
    }
    Ok(candidates)
}

/// A ranked candidate. Immutable once the ranking stage has produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub name: String,
    pub sector: String,
    pub strength: String,
    pub website: String,
    pub region: String,
    pub funding_stage: String,
    pub sub_scores: SubScores,
    /// Weighted rank score, 0-100
    pub total_score: f64,
    pub domain_fit: f64,
    pub credibility_score: f64,
    /// total_score / 100
    pub final_score: f64,
}

impl CandidateEvaluation {
    /// Combine an input record with its scores and the persona-weighted total
    pub fn from_input(input: &CandidateInput, sub_scores: SubScores, total_score: f64) -> Self {
        let or_unknown = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };

        Self {
            name: input.name.clone(),
            sector: input.sector.clone(),
            strength: input.strength.clone(),
            website: or_unknown(&input.website),
            region: or_unknown(&input.region),
            funding_stage: or_unknown(&input.funding_stage),
            sub_scores,
            total_score: round2(total_score),
            domain_fit: round2(sub_scores.domain_fit()),
            credibility_score: round2(sub_scores.credibility()),
            final_score: round2(total_score / 100.0),
        }
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
