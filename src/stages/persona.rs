//! Persona assessment: collect five answers and reduce them to a persona.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use log::{info, warn};

use crate::domain::{EvaluationRecord, PERSONA_QUESTIONS, PersonaAnswers, PersonaAssessment};
use crate::error::{DealflowError, Result};
use crate::workflow::{Stage, StageKind};

/// Where the five answers come from
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn answers(&self) -> Result<PersonaAnswers>;
}

/// Answers supplied up front, e.g. from `--answers`
#[derive(Debug, Clone)]
pub struct FixedAnswers(pub PersonaAnswers);

#[async_trait]
impl AnswerSource for FixedAnswers {
    async fn answers(&self) -> Result<PersonaAnswers> {
        Ok(self.0)
    }
}

/// Interactive prompting on stdin/stdout
#[derive(Debug, Clone, Default)]
pub struct StdinAnswers;

#[async_trait]
impl AnswerSource for StdinAnswers {
    async fn answers(&self) -> Result<PersonaAnswers> {
        tokio::task::spawn_blocking(|| {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            read_answers(&mut stdin.lock(), &mut stdout)
        })
        .await
        .map_err(|e| DealflowError::InvalidState(format!("answer prompt task failed: {}", e)))?
    }
}

/// Ask each question until a value in 1-5 is entered. EOF is an error.
pub fn read_answers<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<PersonaAnswers> {
    let mut values = [0u8; 5];
    for (idx, question) in PERSONA_QUESTIONS.iter().enumerate() {
        loop {
            write!(output, "{}\n> ", question)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(DealflowError::InvalidInput(format!(
                    "input closed before question {} was answered",
                    idx + 1
                )));
            }
            match line.trim().parse::<u8>() {
                Ok(v) if (1..=5).contains(&v) => {
                    values[idx] = v;
                    break;
                }
                _ => writeln!(output, "Please enter a number between 1 and 5.")?,
            }
        }
    }
    PersonaAnswers::new(values)
}

pub struct PersonaStage {
    source: Box<dyn AnswerSource>,
}

impl PersonaStage {
    pub fn new(source: Box<dyn AnswerSource>) -> Self {
        Self { source }
    }

    async fn assess(&self) -> PersonaAssessment {
        match self.source.answers().await {
            Ok(answers) => PersonaAssessment::from_answers(&answers),
            Err(e) => {
                warn!("persona answers unavailable ({}), defaulting to conservative", e);
                PersonaAssessment::fallback(&e.to_string())
            }
        }
    }
}

#[async_trait]
impl Stage for PersonaStage {
    fn kind(&self) -> StageKind {
        StageKind::Persona
    }

    async fn run(&self, mut record: EvaluationRecord) -> EvaluationRecord {
        if record.persona().is_some() {
            warn!("persona already assigned, keeping the existing assessment");
            return record;
        }

        let assessment = self.assess().await;
        info!(
            "persona: {} (aggressive {:.2}, conservative {:.2})",
            assessment.persona, assessment.aggressive_score, assessment.conservative_score
        );
        if let Err(e) = record.assign_persona(assessment) {
            warn!("failed to assign persona: {}", e);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Persona;
    use std::io::Cursor;

    struct BrokenSource;

    #[async_trait]
    impl AnswerSource for BrokenSource {
        async fn answers(&self) -> Result<PersonaAnswers> {
            Err(DealflowError::InvalidInput("no terminal".into()))
        }
    }

    #[test]
    fn test_read_answers_reprompts_on_bad_input() {
        let mut input = Cursor::new("abc\n4\n9\n5\n2\n1\n5\n");
        let mut output = Vec::new();
        let answers = read_answers(&mut input, &mut output).unwrap();

        assert_eq!(answers, PersonaAnswers::new([4, 5, 2, 1, 5]).unwrap());
        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("Please enter a number between 1 and 5.").count(), 2);
    }

    #[test]
    fn test_read_answers_eof_is_error() {
        let mut input = Cursor::new("3\n3\n");
        let mut output = Vec::new();
        assert!(matches!(
            read_answers(&mut input, &mut output),
            Err(DealflowError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_fixed_answers_aggressive() {
        let answers = PersonaAnswers::new([4, 5, 2, 1, 5]).unwrap();
        let stage = PersonaStage::new(Box::new(FixedAnswers(answers)));
        let record = stage.run(EvaluationRecord::new()).await;

        assert_eq!(record.persona(), Some(Persona::Aggressive));
    }

    #[tokio::test]
    async fn test_source_failure_falls_back_to_conservative() {
        let stage = PersonaStage::new(Box::new(BrokenSource));
        let record = stage.run(EvaluationRecord::new()).await;

        assert_eq!(record.persona(), Some(Persona::Conservative));
        assert!(record.persona_assessment().unwrap().rationale.contains("no terminal"));
    }

    #[tokio::test]
    async fn test_existing_persona_kept() {
        let aggressive = PersonaAnswers::new([5, 5, 1, 1, 5]).unwrap();
        let mut record = EvaluationRecord::new();
        record.assign_persona(PersonaAssessment::from_answers(&aggressive)).unwrap();

        let stage = PersonaStage::new(Box::new(BrokenSource));
        let record = stage.run(record).await;
        assert_eq!(record.persona(), Some(Persona::Aggressive));
    }
}
