//! Signal collection and normalization for the technical sub-workflow.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::SourceKind;
use crate::search::SearchHit;

/// Longest snippet kept from a search hit, in characters
pub const SNIPPET_LIMIT: usize = 600;

const REPO_DOMAINS: [&str; 2] = ["github.com", "gitlab.com"];
const REPORT_DOMAINS: [&str; 5] = ["deloitte.com", "mckinsey.com", "bcg.com", "pwc.com", "kpmg.com"];
const PRESS_DOMAINS: [&str; 5] = ["reuters.com", "bloomberg.com", "coindesk.com", "techcrunch.com", "forbes.com"];

/// A collected, not yet weighted signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    pub source: SourceKind,
    pub url: String,
    pub date: String,
    pub snippet: String,
}

/// A signal carrying its credibility weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub source: SourceKind,
    pub url: String,
    pub date: String,
    pub snippet: String,
    pub credibility: f64,
}

/// Last two labels of the host, e.g. `news.techcrunch.com` -> `techcrunch.com`
pub fn registrable_domain(host_or_url: &str) -> String {
    let rest = match host_or_url.split_once("://") {
        Some((_, rest)) => rest,
        None => host_or_url,
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority.rsplit('@').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("").trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return String::new();
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 2 {
        labels[labels.len() - 2..].join(".")
    } else {
        host
    }
}

/// Provenance category of a url relative to the company's own site
pub fn classify_source(url: &str, company_site: &str) -> SourceKind {
    let domain = registrable_domain(url);
    let company = registrable_domain(company_site);

    if !company.is_empty() && domain == company {
        SourceKind::Site
    } else if REPO_DOMAINS.contains(&domain.as_str()) {
        SourceKind::Repo
    } else if REPORT_DOMAINS.contains(&domain.as_str()) {
        SourceKind::Report
    } else if PRESS_DOMAINS.contains(&domain.as_str()) {
        SourceKind::Press
    } else {
        SourceKind::Other
    }
}

pub fn credibility_weight(source: SourceKind) -> f64 {
    match source {
        SourceKind::Site | SourceKind::Report => 0.85,
        SourceKind::Press => 0.70,
        SourceKind::Repo | SourceKind::Other => 0.60,
    }
}

/// The two queries issued per collection attempt
pub fn signal_queries(name: &str, segment: &str) -> [String; 2] {
    [
        format!("{} {}", name, segment).trim().to_string(),
        format!("{} tokenization KYC AML licensing", name),
    ]
}

/// Turn search hits into raw signals, dropping repeats of (source, url)
pub fn collect_from_hits(hits: &[SearchHit], company_site: &str, date: &str) -> Vec<RawSignal> {
    let mut seen: HashSet<(SourceKind, String)> = HashSet::new();
    let mut out = Vec::new();

    for hit in hits {
        let source = classify_source(&hit.url, company_site);
        if !seen.insert((source, hit.url.clone())) {
            continue;
        }
        out.push(RawSignal {
            source,
            url: hit.url.clone(),
            date: date.to_string(),
            snippet: hit.content.chars().take(SNIPPET_LIMIT).collect(),
        });
    }
    out
}

pub fn normalize(raw: &[RawSignal]) -> Vec<Signal> {
    raw.iter()
        .map(|s| Signal {
            source: s.source,
            url: s.url.clone(),
            date: s.date.clone(),
            snippet: s.snippet.clone(),
            credibility: credibility_weight(s.source),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("https://news.techcrunch.com/2024/acme"), "techcrunch.com");
        assert_eq!(registrable_domain("http://user@www.acme.io:8080/x?q=1"), "acme.io");
        assert_eq!(registrable_domain("acme.io"), "acme.io");
        assert_eq!(registrable_domain("localhost"), "localhost");
        assert_eq!(registrable_domain(""), "");
    }

    #[test]
    fn test_classify_source() {
        let site = "https://www.acme.io";
        assert_eq!(classify_source("https://docs.acme.io/kyc", site), SourceKind::Site);
        assert_eq!(classify_source("https://github.com/acme/core", site), SourceKind::Repo);
        assert_eq!(classify_source("https://www2.deloitte.com/rwa", site), SourceKind::Report);
        assert_eq!(classify_source("https://www.coindesk.com/acme", site), SourceKind::Press);
        assert_eq!(classify_source("https://medium.com/@acme", site), SourceKind::Other);
    }

    #[test]
    fn test_unknown_company_site_never_matches() {
        assert_eq!(classify_source("https://acme.io", ""), SourceKind::Other);
        assert_eq!(classify_source("https://acme.io", "Unknown"), SourceKind::Other);
    }

    #[test]
    fn test_credibility_weights() {
        assert_eq!(credibility_weight(SourceKind::Site), 0.85);
        assert_eq!(credibility_weight(SourceKind::Report), 0.85);
        assert_eq!(credibility_weight(SourceKind::Press), 0.70);
        assert_eq!(credibility_weight(SourceKind::Repo), 0.60);
    }

    #[test]
    fn test_collect_dedups_and_truncates() {
        let long = "x".repeat(SNIPPET_LIMIT + 50);
        let hits = vec![
            SearchHit::new("a", "https://reuters.com/a", long),
            SearchHit::new("a again", "https://reuters.com/a", "dup"),
            SearchHit::new("b", "https://reuters.com/b", "b"),
        ];
        let raw = collect_from_hits(&hits, "", "2026-01-01");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].snippet.chars().count(), SNIPPET_LIMIT);
        assert_eq!(raw[0].source, SourceKind::Press);
        assert_eq!(raw[1].url, "https://reuters.com/b");
    }

    #[test]
    fn test_signal_queries() {
        let [first, second] = signal_queries("Acme", "Tokenized bonds");
        assert_eq!(first, "Acme Tokenized bonds");
        assert_eq!(second, "Acme tokenization KYC AML licensing");
    }

    #[test]
    fn test_normalize_assigns_weights() {
        let raw = vec![RawSignal {
            source: SourceKind::Press,
            url: "https://forbes.com/x".into(),
            date: "2026-01-01".into(),
            snippet: "s".into(),
        }];
        let signals = normalize(&raw);
        assert_eq!(signals[0].credibility, 0.70);
    }
}
