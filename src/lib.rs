//! Dealflow - a staged startup-evaluation workflow engine
//!
//! Dealflow maps an investor to a persona, ranks a candidate list under that
//! persona's weights, then walks the ranking one candidate at a time through
//! technical, market, competitor and decision analysis until a candidate is
//! accepted or the rejection budget runs out, and finally writes a report.

pub mod domain;
pub mod error;
pub mod id;
pub mod llm;
pub mod policy;
pub mod report;
pub mod search;
pub mod stages;
pub mod tech;
pub mod workflow;

pub use error::{DealflowError, Result};
