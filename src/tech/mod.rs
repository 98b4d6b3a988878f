//! Technical due-diligence sub-workflow
//!
//! Collects web signals about one candidate, scores them, distills evidence
//! and writes a narrative. The parent stage only sees [`GuardedSubWorkflow::run`]
//! and the [`TechPayload`](crate::domain::TechPayload) it returns.

pub mod advisor;
pub mod evidence;
pub mod machine;
pub mod scoring;
pub mod signals;

pub use advisor::{LlmTechAdvisor, NarrativeBrief, TechAdvisor};
pub use evidence::EvidenceDraft;
pub use machine::{GateVerdict, GuardedSubWorkflow, TechInput, TechLimits, TechNode, TechState, quality_gate, transition};
pub use signals::{RawSignal, Signal};
