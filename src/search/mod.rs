//! Web search seam used by the analysis stages
//!
//! Stages see search through the [`SearchClient`] trait. Market and
//! competitor stages go through [`search_or_placeholder`], which never fails;
//! the technical sub-workflow calls the client directly so an empty result can
//! drive its resample loop.

pub mod web;

use std::sync::Mutex;

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{DealflowError, Result};

pub use web::{SearchConfig, SearchProvider, WebSearch};

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    fn name(&self) -> &str;
}

/// Search client used when no API key is configured
#[derive(Debug, Default)]
pub struct DisabledSearch;

#[async_trait]
impl SearchClient for DisabledSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Err(DealflowError::Search(
            "no search API configured (set TAVILY_API_KEY, BRAVE_API_KEY or SERPAPI_KEY)".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Scripted client for tests: returns the hits of the first rule whose
/// needle occurs in the query, and records every query
#[derive(Debug, Default)]
pub struct MockSearchClient {
    rules: Vec<(String, Vec<SearchHit>)>,
    queries: Mutex<Vec<String>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, needle: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        self.rules.push((needle.into(), hits));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if let Ok(mut seen) = self.queries.lock() {
            seen.push(query.to_string());
        }
        let hits = self
            .rules
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, hits)| hits.iter().take(max_results).cloned().collect())
            .unwrap_or_default();
        Ok(hits)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Deterministic stand-in hit used when search yields nothing
pub fn placeholder_hits(query: &str) -> Vec<SearchHit> {
    let company = query.split_whitespace().next().unwrap_or("company");
    vec![SearchHit::new(
        format!("{} - RWA Platform", company),
        format!("https://duckduckgo.com/?q={}", query.replace(' ', "+")),
        format!(
            "{} operates in the Real-World Asset tokenization sector with focus on compliance and \
             institutional adoption. Key areas include regulatory frameworks, technical architecture, \
             and market partnerships.",
            company
        ),
    )]
}

/// Search, substituting the placeholder hit on failure or an empty result
pub async fn search_or_placeholder(client: &dyn SearchClient, query: &str, max_results: usize) -> Vec<SearchHit> {
    match client.search(query, max_results).await {
        Ok(hits) if !hits.is_empty() => hits,
        Ok(_) => {
            warn!("search '{}' returned nothing, using placeholder", query);
            placeholder_hits(query)
        }
        Err(e) => {
            warn!("search '{}' failed ({}), using placeholder", query, e);
            placeholder_hits(query)
        }
    }
}
