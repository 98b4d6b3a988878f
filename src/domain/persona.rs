//! Investor persona types and the answer-to-persona reduction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DealflowError, Result};

/// The two weighting profiles an investor can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Aggressive,
    Conservative,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Aggressive => "aggressive",
            Persona::Conservative => "conservative",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five assessment questions, in the order answers are collected
pub const PERSONA_QUESTIONS: [&str; 5] = [
    "1. Do you pursue high returns even with high risk? (1-5)",
    "2. How much experience do you have investing in early-stage (Seed/Series A) startups? (1-5)",
    "3. How important is a stable revenue model and cash flow? (1-5)",
    "4. How much do you consider ESG (Environmental, Social, Governance) factors in investment decisions? (1-5)",
    "5. Do you prefer rapid growth or stable growth? (1: Stable, 5: Rapid)",
];

/// Answers to the five persona questions, each on a 1-5 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaAnswers {
    pub risk: u8,
    pub experience: u8,
    pub stability: u8,
    pub esg: u8,
    pub growth: u8,
}

impl PersonaAnswers {
    /// Build answers from the raw values in question order, rejecting anything outside 1-5
    pub fn new(values: [u8; 5]) -> Result<Self> {
        for (idx, value) in values.iter().enumerate() {
            if !(1..=5).contains(value) {
                return Err(DealflowError::InvalidInput(format!(
                    "answer {} must be between 1 and 5, got {}",
                    idx + 1,
                    value
                )));
            }
        }
        let [risk, experience, stability, esg, growth] = values;
        Ok(Self {
            risk,
            experience,
            stability,
            esg,
            growth,
        })
    }

    pub fn aggressive_score(&self) -> f64 {
        (self.risk as f64 + self.experience as f64 + self.growth as f64) / 3.0
    }

    pub fn conservative_score(&self) -> f64 {
        (self.stability as f64 + self.esg as f64 + (6 - self.growth) as f64) / 3.0
    }
}

impl FromStr for PersonaAnswers {
    type Err = DealflowError;

    /// Parse a comma-separated list such as `4,5,2,1,5`
    fn from_str(s: &str) -> Result<Self> {
        let parsed: Vec<u8> = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u8>()
                    .map_err(|_| DealflowError::InvalidInput(format!("not a number: '{}'", part.trim())))
            })
            .collect::<Result<_>>()?;

        let values: [u8; 5] = parsed.as_slice().try_into().map_err(|_| {
            DealflowError::InvalidInput(format!("expected 5 answers, got {}", parsed.len()))
        })?;
        Self::new(values)
    }
}

/// Outcome of the persona assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaAssessment {
    pub persona: Persona,
    pub aggressive_score: f64,
    pub conservative_score: f64,
    pub rationale: String,
}

impl PersonaAssessment {
    /// Reduce the answers to a persona. Ties go to conservative.
    pub fn from_answers(answers: &PersonaAnswers) -> Self {
        let aggressive_score = answers.aggressive_score();
        let conservative_score = answers.conservative_score();

        let persona = if aggressive_score > conservative_score {
            Persona::Aggressive
        } else {
            Persona::Conservative
        };

        let rationale = format!(
            "[INVESTOR PERSONA ANALYSIS: {} INVESTOR]\naggressive score {:.2}, conservative score {:.2}",
            persona.as_str().to_uppercase(),
            aggressive_score,
            conservative_score
        );

        Self {
            persona,
            aggressive_score,
            conservative_score,
            rationale,
        }
    }

    /// Assessment used when no answers could be collected
    pub fn fallback(reason: &str) -> Self {
        Self {
            persona: Persona::Conservative,
            aggressive_score: 0.0,
            conservative_score: 0.0,
            rationale: format!(
                "[INVESTOR PERSONA ANALYSIS: CONSERVATIVE INVESTOR]\nassessment unavailable ({}), defaulted to conservative",
                reason
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_reject_out_of_range() {
        assert!(PersonaAnswers::new([0, 3, 3, 3, 3]).is_err());
        assert!(PersonaAnswers::new([3, 3, 3, 3, 6]).is_err());
        assert!(PersonaAnswers::new([1, 2, 3, 4, 5]).is_ok());
    }

    #[test]
    fn test_answers_from_str() {
        let answers: PersonaAnswers = "5, 4,2,1,5".parse().unwrap();
        assert_eq!(answers.risk, 5);
        assert_eq!(answers.growth, 5);
        assert!("1,2,3".parse::<PersonaAnswers>().is_err());
        assert!("1,2,x,4,5".parse::<PersonaAnswers>().is_err());
    }

    #[test]
    fn test_aggressive_persona() {
        let answers = PersonaAnswers::new([5, 5, 1, 1, 5]).unwrap();
        let assessment = PersonaAssessment::from_answers(&answers);
        assert_eq!(assessment.persona, Persona::Aggressive);
        assert!((assessment.aggressive_score - 5.0).abs() < 1e-9);
        assert!((assessment.conservative_score - 1.0).abs() < 1e-9);
        assert!(assessment.rationale.contains("AGGRESSIVE"));
    }

    #[test]
    fn test_conservative_persona() {
        let answers = PersonaAnswers::new([1, 1, 5, 5, 1]).unwrap();
        let assessment = PersonaAssessment::from_answers(&answers);
        assert_eq!(assessment.persona, Persona::Conservative);
    }

    #[test]
    fn test_tie_resolves_to_conservative() {
        // aggressive = (3 + 3 + 3) / 3 = 3, conservative = (3 + 3 + 3) / 3 = 3
        let answers = PersonaAnswers::new([3, 3, 3, 3, 3]).unwrap();
        let assessment = PersonaAssessment::from_answers(&answers);
        assert_eq!(assessment.aggressive_score, assessment.conservative_score);
        assert_eq!(assessment.persona, Persona::Conservative);
    }

    #[test]
    fn test_fallback_is_conservative() {
        let assessment = PersonaAssessment::fallback("stdin closed");
        assert_eq!(assessment.persona, Persona::Conservative);
        assert!(assessment.rationale.contains("stdin closed"));
    }

    #[test]
    fn test_persona_serialization() {
        assert_eq!(serde_json::to_string(&Persona::Aggressive).unwrap(), "\"aggressive\"");
        assert_eq!(Persona::Conservative.to_string(), "conservative");
    }
}
