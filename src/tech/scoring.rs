//! Rule-based technical scoring with a bounded corrective pass.

use std::collections::HashMap;

use super::signals::Signal;
use crate::domain::{ScoreDimension, ScoreVector, SourceKind};
use crate::policy::tech_weights;

/// Largest correction the adjustment pass may apply to one dimension
pub const MAX_CORRECTION: f64 = 0.05;

pub const FALLBACK_POSITIONING: &str = "Potential observed, monitoring required.";
pub const FALLBACK_NARRATIVE: &str = "## Overview\nAnalysis failed.";

fn clamp01(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Indicator-driven base scores
pub fn base_scores(segment: &str, signals: &[Signal]) -> ScoreVector {
    let mentions = |needle: &str| signals.iter().any(|s| s.snippet.to_lowercase().contains(needle));
    let has_kyc = mentions("kyc") || mentions("aml");
    let has_report = signals.iter().any(|s| s.source == SourceKind::Report);
    let has_partnership = mentions("partnership");

    ScoreVector {
        domain_fit: if segment.to_lowercase().contains("token") { 0.82 } else { 0.65 },
        tech_maturity: if has_kyc { 0.74 } else { 0.62 },
        credibility: if has_report { 0.73 } else { 0.60 },
        compliance_risk: if has_kyc { 0.18 } else { 0.32 },
        ecosystem: if has_partnership { 0.78 } else { 0.62 },
    }
}

/// Nudge each dimension toward a proposed value by at most [`MAX_CORRECTION`].
///
/// Missing or non-finite proposals leave the dimension unchanged; every
/// result is clamped to [0, 1].
pub fn apply_correction(base: &ScoreVector, proposed: &HashMap<ScoreDimension, f64>) -> ScoreVector {
    let mut fused = *base;
    for dim in ScoreDimension::ALL {
        let current = base.get(dim);
        let delta = match proposed.get(&dim) {
            Some(target) if target.is_finite() => (target - current).clamp(-MAX_CORRECTION, MAX_CORRECTION),
            _ => 0.0,
        };
        fused.set(dim, current + delta);
    }
    fused
}

/// Fixed linear combination of the five dimensions, clamped to [0, 1]
pub fn final_score(scores: &ScoreVector) -> f64 {
    let raw = tech_weights::DOMAIN_FIT * scores.domain_fit
        + tech_weights::TECH_MATURITY * scores.tech_maturity
        + tech_weights::CREDIBILITY * scores.credibility
        + tech_weights::ECOSYSTEM * scores.ecosystem
        + tech_weights::COMPLIANCE_RISK * scores.compliance_risk;
    clamp01(raw)
}

/// Threshold-derived strengths and risks
pub fn strengths_and_risks(scores: &ScoreVector) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    if scores.domain_fit >= 0.75 {
        strengths.push("High domain fit.".to_string());
    }
    if scores.tech_maturity >= 0.70 {
        strengths.push("Mature tech.".to_string());
    }
    if scores.ecosystem >= 0.70 {
        strengths.push("Solid partners.".to_string());
    }

    let mut risks = Vec::new();
    if scores.compliance_risk >= 0.25 {
        risks.push("Regulatory risk.".to_string());
    }
    if scores.credibility < 0.65 {
        risks.push("Needs more credibility proof.".to_string());
    }
    (strengths, risks)
}
