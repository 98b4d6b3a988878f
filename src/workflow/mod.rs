//! Pipeline orchestration: the stage seam, the loop controller and the
//! sequencer that wires them together.

pub mod controller;
pub mod sequencer;
pub mod stage;

pub use controller::{CandidateAdvancer, DEFAULT_REJECTION_BUDGET, LoopController, LoopDecision, StopCause};
pub use sequencer::{DEFAULT_MAX_STEPS, RunOutcome, StageSequencer, StageSet, WorkflowLimits};
pub use stage::{Stage, StageKind};
