//! Evidence selection and distillation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::signals::Signal;
use crate::domain::{Evidence, ScoreDimension, SourceKind};
use crate::id::evidence_id;

/// Signals considered when building evidence
pub const EVIDENCE_POOL: usize = 8;
/// Evidence items kept per score dimension
pub const PER_DIMENSION: usize = 2;
/// Signals promoted to generic evidence when distillation yields nothing
pub const FALLBACK_COUNT: usize = 3;

/// One evidence item as proposed by the advisor, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDraft {
    pub dimension: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
}

/// Highest-credibility signals; ties keep collection order
pub fn select_top(signals: &[Signal]) -> Vec<Signal> {
    let mut ranked = signals.to_vec();
    ranked.sort_by(|a, b| b.credibility.total_cmp(&a.credibility));
    ranked.truncate(EVIDENCE_POOL);
    ranked
}

/// Keep at most [`PER_DIMENSION`] drafts for each known dimension
pub fn distill(drafts: &[EvidenceDraft], date: &str) -> Vec<Evidence> {
    let mut per_dim: HashMap<ScoreDimension, usize> = HashMap::new();
    let mut out = Vec::new();

    for draft in drafts {
        let Some(dim) = ScoreDimension::from_key(&draft.dimension) else {
            continue;
        };
        if draft.snippet.trim().is_empty() && draft.url.trim().is_empty() {
            continue;
        }
        let count = per_dim.entry(dim).or_insert(0);
        if *count >= PER_DIMENSION {
            continue;
        }
        *count += 1;
        out.push(Evidence {
            id: evidence_id(&draft.url, &draft.snippet),
            source: SourceKind::from_key(&draft.source),
            url: draft.url.clone(),
            date: date.to_string(),
            snippet: draft.snippet.clone(),
            relates_to: Some(dim),
        });
    }
    out
}

/// Generic evidence taken straight from the top signals
pub fn fallback(top: &[Signal]) -> Vec<Evidence> {
    top.iter()
        .take(FALLBACK_COUNT)
        .map(|s| Evidence {
            id: evidence_id(&s.url, &s.snippet),
            source: s.source,
            url: s.url.clone(),
            date: s.date.clone(),
            snippet: s.snippet.clone(),
            relates_to: None,
        })
        .collect()
}
