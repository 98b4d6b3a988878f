//! Web search providers: Tavily, Brave and SerpAPI

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use super::{SearchClient, SearchHit};
use crate::error::{DealflowError, Result};

/// Supported search APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    Tavily,
    Brave,
    SerpApi,
}

impl SearchProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchProvider::Tavily => "tavily",
            SearchProvider::Brave => "brave",
            SearchProvider::SerpApi => "serpapi",
        }
    }
}

/// Provider and key for the search API
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub provider: SearchProvider,
    pub api_key: String,
}

impl SearchConfig {
    /// Load from environment variables
    pub fn from_env() -> Option<Self> {
        let candidates = [
            ("TAVILY_API_KEY", SearchProvider::Tavily),
            ("BRAVE_API_KEY", SearchProvider::Brave),
            ("SERPAPI_KEY", SearchProvider::SerpApi),
        ];

        for (var, provider) in candidates {
            if let Ok(api_key) = std::env::var(var) {
                if !api_key.trim().is_empty() {
                    debug!("SearchConfig: found {}", var);
                    return Some(Self { provider, api_key });
                }
            }
        }

        debug!("SearchConfig: no API key found");
        None
    }
}

/// HTTP-backed search client
pub struct WebSearch {
    client: Client,
    config: SearchConfig,
}

impl WebSearch {
    pub fn new(config: SearchConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DealflowError::Search(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn search_tavily(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let body = serde_json::json!({
            "api_key": self.config.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "basic"
        });

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .json(&body)
            .send()
            .await
            .map_err(|e| DealflowError::Search(format!("Search request failed: {}", e)))?;
        let result = read_json(response, "Tavily").await?;

        Ok(collect_hits(&result["results"], "url", "content"))
    }

    async fn search_brave(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get("https://api.search.brave.com/res/v1/web/search")
            .header("X-Subscription-Token", &self.config.api_key)
            .query(&[("q", query), ("count", &max_results.to_string())])
            .send()
            .await
            .map_err(|e| DealflowError::Search(format!("Search request failed: {}", e)))?;
        let result = read_json(response, "Brave").await?;

        Ok(collect_hits(&result["web"]["results"], "url", "description"))
    }

    async fn search_serpapi(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get("https://serpapi.com/search")
            .query(&[
                ("q", query),
                ("api_key", self.config.api_key.as_str()),
                ("num", &max_results.to_string()),
                ("engine", "google"),
            ])
            .send()
            .await
            .map_err(|e| DealflowError::Search(format!("Search request failed: {}", e)))?;
        let result = read_json(response, "SerpAPI").await?;

        Ok(collect_hits(&result["organic_results"], "link", "snippet"))
    }
}

#[async_trait]
impl SearchClient for WebSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        debug!("{} search: {}", self.config.provider.as_str(), query);
        let mut hits = match self.config.provider {
            SearchProvider::Tavily => self.search_tavily(query, max_results).await?,
            SearchProvider::Brave => self.search_brave(query, max_results).await?,
            SearchProvider::SerpApi => self.search_serpapi(query, max_results).await?,
        };
        hits.truncate(max_results);
        Ok(hits)
    }

    fn name(&self) -> &str {
        self.config.provider.as_str()
    }
}

async fn read_json(response: reqwest::Response, provider: &str) -> Result<Value> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(DealflowError::Search(format!("{} API error {}: {}", provider, status, error_text)));
    }
    response
        .json()
        .await
        .map_err(|e| DealflowError::Search(format!("Failed to parse response: {}", e)))
}

fn collect_hits(results: &Value, url_key: &str, content_key: &str) -> Vec<SearchHit> {
    let Some(results) = results.as_array() else {
        return Vec::new();
    };

    results
        .iter()
        .map(|r| SearchHit {
            title: r["title"].as_str().unwrap_or("(no title)").to_string(),
            url: r[url_key].as_str().unwrap_or("").to_string(),
            content: r[content_key].as_str().unwrap_or("").to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_tavily_shape() {
        let body = serde_json::json!({
            "results": [
                {"title": "Acme raises seed", "url": "https://techcrunch.com/acme", "content": "Acme tokenizes bonds"},
                {"url": "https://acme.io"}
            ]
        });
        let hits = collect_hits(&body["results"], "url", "content");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "Acme tokenizes bonds");
        assert_eq!(hits[1].title, "(no title)");
        assert!(hits[1].content.is_empty());
    }

    #[test]
    fn test_collect_serpapi_shape() {
        let body = serde_json::json!({
            "organic_results": [{"title": "t", "link": "https://x.io", "snippet": "s"}]
        });
        let hits = collect_hits(&body["organic_results"], "link", "snippet");
        assert_eq!(hits[0].url, "https://x.io");
    }

    #[test]
    fn test_collect_missing_array() {
        assert!(collect_hits(&serde_json::json!({}), "url", "content").is_empty());
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(SearchProvider::Tavily.as_str(), "tavily");
        assert_eq!(SearchProvider::SerpApi.as_str(), "serpapi");
    }
}
