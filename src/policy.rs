//! Immutable evaluation policy.
//!
//! The persona weight table, the decision checklist and the verdict
//! thresholds are built once at startup and handed to the stages that need
//! them as `Arc<EvaluationPolicy>`. Nothing here is read from process state.

use serde::{Deserialize, Serialize};

use crate::domain::{CHECKLIST_LEN, DecisionOutcome, Persona, SubScores};
use crate::error::{DealflowError, Result};

/// Weights of the technical final score. Design constants, not configurable.
pub mod tech_weights {
    pub const DOMAIN_FIT: f64 = 0.30;
    pub const TECH_MATURITY: f64 = 0.25;
    pub const CREDIBILITY: f64 = 0.25;
    pub const ECOSYSTEM: f64 = 0.10;
    pub const COMPLIANCE_RISK: f64 = -0.20;
}

/// The 20-point checklist used by the decision stage
pub const VC_CHECKLIST: [&str; CHECKLIST_LEN] = [
    "1. Market(TAM): Is the market size (TAM) significant (> $1B)?",
    "2. Market(CAGR): Is the market growing rapidly (> 20% CAGR)?",
    "3. Problem: Is the customer problem clear and urgent?",
    "4. Product: Does the product offer a 10x improvement over alternatives?",
    "5. Tech(Moat): Is there a strong, defensible technical moat?",
    "6. Tech(Maturity): Is the platform's security and scalability proven? (Ref: tech_maturity > 0.7)",
    "7. Team(Expertise): Does the team have deep domain expertise (finance, RE, blockchain)?",
    "8. Team(Execution): Does the team demonstrate strong execution capability?",
    "9. Competition(Differentiation): Is there clear differentiation from competitors?",
    "10. Competition(Barrier): Are there high barriers to entry?",
    "11. BizModel(Clarity): Is the revenue model clear and viable?",
    "12. BizModel(LTV/CAC): Is the LTV/CAC ratio estimated to be > 3x?",
    "13. Traction(Partners): Are there significant early customers or institutional partnerships? (Ref: ecosystem)",
    "14. Traction(Users): Are there active users with good retention rates?",
    "15. Credibility(VC): Has the startup secured funding from reputable VCs?",
    "16. Credibility(Media): Is there positive validation from credible reports/media? (Ref: credibility > 0.7)",
    "17. Regulation(Strategy): Is the team aware of regulatory risks (KYC/AML) with a clear strategy?",
    "18. Regulation(RiskScore): Is the compliance risk score low? (Ref: compliance_risk < 0.25)",
    "19. Scalability(Global): Is the business model scalable beyond its initial region?",
    "20. Fit(Positioning): Does it have a unique and strong positioning in the RWA sector?",
];

/// One row of the persona weight table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonaWeights {
    pub seed_early: f64,
    pub regional_esg: f64,
    pub growth_partnership: f64,
    pub regulation_monetization: f64,
}

impl PersonaWeights {
    pub fn sum(&self) -> f64 {
        self.seed_early + self.regional_esg + self.growth_partnership + self.regulation_monetization
    }

    /// Weighted sum of four 0-100 sub-scores
    pub fn apply(&self, scores: &SubScores) -> f64 {
        scores.seed_early * self.seed_early
            + scores.regional_esg * self.regional_esg
            + scores.growth_partnership * self.growth_partnership
            + scores.regulation_monetization * self.regulation_monetization
    }

    /// (criterion, weight) pairs in table order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("seed_early", self.seed_early),
            ("regional_esg", self.regional_esg),
            ("growth_partnership", self.growth_partnership),
            ("regulation_monetization", self.regulation_monetization),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPolicy {
    pub aggressive: PersonaWeights,
    pub conservative: PersonaWeights,
    pub checklist: Vec<String>,
    /// Minimum checklist total for `accept`
    pub accept_threshold: u32,
    /// Minimum checklist total for `hold`
    pub hold_threshold: u32,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            aggressive: PersonaWeights {
                seed_early: 0.40,
                regional_esg: 0.15,
                growth_partnership: 0.35,
                regulation_monetization: 0.10,
            },
            conservative: PersonaWeights {
                seed_early: 0.10,
                regional_esg: 0.30,
                growth_partnership: 0.20,
                regulation_monetization: 0.40,
            },
            checklist: VC_CHECKLIST.iter().map(|s| s.to_string()).collect(),
            accept_threshold: 15,
            hold_threshold: 12,
        }
    }
}

impl EvaluationPolicy {
    pub fn weights(&self, persona: Persona) -> &PersonaWeights {
        match persona {
            Persona::Aggressive => &self.aggressive,
            Persona::Conservative => &self.conservative,
        }
    }

    /// Persona-weighted rank score, 0-100
    pub fn rank_score(&self, persona: Persona, scores: &SubScores) -> f64 {
        self.weights(persona).apply(&scores.clamped())
    }

    /// Map a checklist total to a verdict
    pub fn classify(&self, total: u32) -> DecisionOutcome {
        if total >= self.accept_threshold {
            DecisionOutcome::Accept
        } else if total >= self.hold_threshold {
            DecisionOutcome::Hold
        } else {
            DecisionOutcome::Reject
        }
    }

    /// Short label of a checklist item, e.g. `Market(TAM)`
    pub fn checklist_label(&self, index: usize) -> Option<&str> {
        let item = self.checklist.get(index)?;
        let head = item.split(':').next().unwrap_or(item);
        Some(match head.split_once(". ") {
            Some((num, rest)) if num.chars().all(|c| c.is_ascii_digit()) => rest,
            _ => head,
        })
    }

    /// Labels of the first `limit` items whose score matches `passed`
    pub fn summarize(&self, scores: &[u8], passed: bool, limit: usize) -> String {
        let wanted = if passed { 1 } else { 0 };
        let labels: Vec<&str> = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == wanted)
            .filter_map(|(i, _)| self.checklist_label(i))
            .take(limit)
            .collect();
        if labels.is_empty() {
            "None identified".to_string()
        } else {
            labels.join(", ")
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, row) in [("aggressive", &self.aggressive), ("conservative", &self.conservative)] {
            if (row.sum() - 1.0).abs() > 1e-6 {
                return Err(DealflowError::InvalidInput(format!(
                    "{} weights sum to {:.3}, expected 1.0",
                    name,
                    row.sum()
                )));
            }
        }
        if self.checklist.len() != CHECKLIST_LEN {
            return Err(DealflowError::InvalidInput(format!(
                "checklist has {} items, expected {}",
                self.checklist.len(),
                CHECKLIST_LEN
            )));
        }
        if self.hold_threshold >= self.accept_threshold || self.accept_threshold > CHECKLIST_LEN as u32 {
            return Err(DealflowError::InvalidInput(format!(
                "invalid thresholds: hold {} accept {}",
                self.hold_threshold, self.accept_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = EvaluationPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.checklist.len(), 20);
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let mut policy = EvaluationPolicy::default();
        policy.aggressive.seed_early = 0.9;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_checklist() {
        let mut policy = EvaluationPolicy::default();
        policy.checklist.pop();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_rank_score_by_persona() {
        let policy = EvaluationPolicy::default();
        let scores = SubScores::new(80.0, 60.0, 70.0, 40.0);
        // 80*.4 + 60*.15 + 70*.35 + 40*.1 = 32 + 9 + 24.5 + 4
        assert!((policy.rank_score(Persona::Aggressive, &scores) - 69.5).abs() < 1e-9);
        // 80*.1 + 60*.3 + 70*.2 + 40*.4 = 8 + 18 + 14 + 16
        assert!((policy.rank_score(Persona::Conservative, &scores) - 56.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify_thresholds() {
        let policy = EvaluationPolicy::default();
        assert_eq!(policy.classify(20), DecisionOutcome::Accept);
        assert_eq!(policy.classify(15), DecisionOutcome::Accept);
        assert_eq!(policy.classify(14), DecisionOutcome::Hold);
        assert_eq!(policy.classify(12), DecisionOutcome::Hold);
        assert_eq!(policy.classify(11), DecisionOutcome::Reject);
        assert_eq!(policy.classify(0), DecisionOutcome::Reject);
    }

    #[test]
    fn test_checklist_labels() {
        let policy = EvaluationPolicy::default();
        assert_eq!(policy.checklist_label(0), Some("Market(TAM)"));
        assert_eq!(policy.checklist_label(2), Some("Problem"));
        assert_eq!(policy.checklist_label(19), Some("Fit(Positioning)"));
        assert_eq!(policy.checklist_label(20), None);
    }

    #[test]
    fn test_summarize_takes_first_three() {
        let policy = EvaluationPolicy::default();
        let mut scores = vec![0u8; 20];
        scores[1] = 1;
        scores[4] = 1;
        scores[6] = 1;
        scores[9] = 1;
        assert_eq!(policy.summarize(&scores, true, 3), "Market(CAGR), Tech(Moat), Team(Expertise)");
        assert_eq!(policy.summarize(&[1; 20], false, 3), "None identified");
    }
}
