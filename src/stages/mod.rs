//! Concrete pipeline stages
//!
//! Each stage implements [`Stage`](crate::workflow::Stage): it reads the
//! record, calls its collaborators, writes its own slot and hands the record
//! back. Collaborator failures become documented fallbacks here and never
//! reach the sequencer.

pub mod competitor;
pub mod decision;
pub mod market;
pub mod persona;
pub mod ranking;
pub mod report;
pub mod technical;

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::llm::{LlmClient, Prompt};

pub use competitor::CompetitorStage;
pub use decision::DecisionStage;
pub use market::{MarketStage, chunk_text, top_chunks};
pub use persona::{AnswerSource, FixedAnswers, PersonaStage, StdinAnswers, read_answers};
pub use ranking::{CandidateScorer, LlmCandidateScorer, RankingStage};
pub use report::{ReportSettings, ReportStage};
pub use technical::TechnicalStage;

/// Send one prompt and decode the JSON object in the reply
pub(crate) async fn ask_json<T: DeserializeOwned>(
    llm: &dyn LlmClient,
    system: &str,
    prompt: String,
    max_tokens: u32,
) -> Result<T> {
    llm.complete(&Prompt::json(system, prompt, max_tokens)).await?.json()
}
