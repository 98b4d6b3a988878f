//! Markdown rendering of the final report.
//!
//! Two templates: a full investment memo when a candidate was accepted, and a
//! run summary when the loop ended without one.

use crate::domain::{
    CandidateEvaluation, DecisionOutcome, EvaluationRecord, InvestmentDecision, StageOutput, Swot, TechPayload,
    Termination, UNKNOWN,
};
use crate::policy::EvaluationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRating {
    Low,
    Medium,
    High,
}

impl RiskRating {
    /// `(tech_final * 20 + checklist_total) / 2`: >= 15 low, >= 10 medium, else high
    pub fn from_scores(tech_final: f64, checklist_total: u32) -> Self {
        let combined = (tech_final * 20.0 + checklist_total as f64) / 2.0;
        if combined >= 15.0 {
            RiskRating::Low
        } else if combined >= 10.0 {
            RiskRating::Medium
        } else {
            RiskRating::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskRating::Low => "🟢 LOW RISK",
            RiskRating::Medium => "🟡 MEDIUM RISK",
            RiskRating::High => "🔴 HIGH RISK",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskRating::Low => "Strong fundamentals across all dimensions",
            RiskRating::Medium => "Solid fundamentals with manageable execution risks",
            RiskRating::High => "Significant challenges in multiple areas",
        }
    }
}

/// Pick the template from the record's termination
pub fn render_report(record: &EvaluationRecord, policy: &EvaluationPolicy, generated_at: &str) -> String {
    let accepted = matches!(record.termination(), Some(Termination::Accepted { .. }));
    match (accepted, record.current_candidate(), record.decision.as_ref()) {
        (true, Some(candidate), Some(decision)) => render_success(record, candidate, decision, policy, generated_at),
        _ => render_exhaustion(record, policy, generated_at),
    }
}

fn persona_label(record: &EvaluationRecord) -> String {
    record
        .persona()
        .map(|p| p.as_str().to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn unavailable_note<T>(output: &Option<StageOutput<T>>, what: &str) -> Option<String> {
    match output {
        Some(StageOutput::Ready(_)) => None,
        Some(StageOutput::Unavailable { reason }) => Some(format!("_{} unavailable: {}_", what, reason)),
        None => Some(format!("_{} not performed._", what)),
    }
}

fn bullet_list(items: &[String], fallback: &[&str]) -> String {
    if items.is_empty() {
        fallback.iter().map(|s| format!("- {}", s)).collect::<Vec<_>>().join("\n")
    } else {
        items.iter().map(|s| format!("- {}", s)).collect::<Vec<_>>().join("\n")
    }
}

//=== Success template ===

pub fn render_success(
    record: &EvaluationRecord,
    candidate: &CandidateEvaluation,
    decision: &InvestmentDecision,
    policy: &EvaluationPolicy,
    generated_at: &str,
) -> String {
    let checklist_len = decision.checklist_scores.len().max(1);
    let tech = record.tech_summary.as_ref().and_then(|t| t.ready());
    let tech_final = tech.map(|t| t.final_score).unwrap_or(0.0);
    let risk = RiskRating::from_scores(tech_final, decision.total_score);
    let pct = decision.total_score as f64 / checklist_len as f64 * 100.0;

    let mut out = String::new();
    out.push_str(&format!("# 🎯 Investment Evaluation Report: {}\n\n---\n\n", candidate.name));

    out.push_str("## 📊 Executive Summary\n\n| Item | Detail |\n|------|--------|\n");
    out.push_str(&format!("| **Startup** | {} |\n", candidate.name));
    out.push_str(&format!("| **Sector** | {} |\n", candidate.sector));
    out.push_str(&format!(
        "| **Recommendation** | {} **{}** |\n",
        decision.outcome.marker(),
        decision.outcome.as_str().to_uppercase()
    ));
    out.push_str(&format!(
        "| **Checklist Score** | **{}/{}** ({:.0}%) |\n",
        decision.total_score, checklist_len, pct
    ));
    out.push_str(&format!("| **Investor Persona** | {} |\n", persona_label(record)));
    out.push_str(&format!("| **Website** | {} |\n", candidate.website));
    out.push_str(&format!("| **Region** | {} |\n", candidate.region));
    out.push_str(&format!("| **Funding Stage** | {} |\n", candidate.funding_stage));
    out.push_str(&format!("| **Risk Rating** | {} |\n\n", risk.label()));

    out.push_str("### 🔑 Investment Thesis\n\n");
    out.push_str(&investment_thesis(record, candidate));
    out.push_str("\n\n### ⚡ Key Highlights\n\n");
    out.push_str(&key_highlights(record, candidate, decision));
    out.push_str(&format!("\n\n### 📝 Summary\n\n{}\n\n---\n\n", decision.reasoning));

    out.push_str("## 1️⃣ 20-Point Checklist\n\n");
    out.push_str(&checklist_distribution(&decision.checklist_scores));
    out.push_str(&checklist_detail(&decision.checklist_scores, policy));
    out.push_str("\n---\n\n");

    out.push_str("## 2️⃣ Technical Maturity\n\n");
    out.push_str(&tech_section(record));
    out.push_str("\n---\n\n## 3️⃣ Market\n\n");
    out.push_str(&market_section(record));
    out.push_str("\n---\n\n## 4️⃣ Competitive Landscape\n\n");
    out.push_str(&competitor_section(record));

    let notes = tech.map(|t| &t.notes);
    out.push_str("\n---\n\n## 5️⃣ Strengths and Risks\n\n### Strengths\n\n");
    out.push_str(&bullet_list(
        notes.map(|n| n.strengths.as_slice()).unwrap_or_default(),
        &["No technical strengths recorded"],
    ));
    out.push_str("\n\n### Risks\n\n");
    out.push_str(&bullet_list(
        notes.map(|n| n.risks.as_slice()).unwrap_or_default(),
        &["No technical risks recorded"],
    ));
    out.push_str(&format!(
        "\n\n### Overall Risk Assessment\n\n**{}**: {}\n\n---\n\n",
        risk.label(),
        risk.description()
    ));

    out.push_str("## 6️⃣ Financial Outlook\n\n");
    out.push_str(&financial_section(record, candidate));
    out.push_str("\n---\n\n## 7️⃣ Team\n\n");
    out.push_str(&team_section(record));
    out.push_str("\n---\n\n## 8️⃣ Proposed Investment Terms\n\n");
    out.push_str(&investment_terms(candidate, decision));
    out.push_str("\n---\n\n## 9️⃣ Risk Mitigation\n\n");
    out.push_str(&risk_mitigation(record));

    out.push_str("\n---\n\n## 🔟 Final Recommendation\n\n");
    out.push_str(&format!(
        "### Investment Decision: **PROCEED** ✅\n\n**Rationale**: {}\n\n**Risk Assessment**: {}\n\n",
        decision.reasoning,
        risk.description()
    ));
    out.push_str(NEXT_STEPS);
    out.push_str("\n### Deal Risks to Monitor\n\n");
    out.push_str(&bullet_list(
        notes.map(|n| n.risks.as_slice()).unwrap_or_default(),
        &["No deal risks recorded; revisit after technical due diligence"],
    ));
    out.push_str("\n\n### Success Metrics (12-month targets)\n\n");
    out.push_str(&success_metrics(candidate));
    out.push_str("\n---\n\n## ✅ Investment Committee Checklist\n\n");
    out.push_str(&ic_checklist(record, decision));
    out.push_str("\n---\n\n");

    out.push_str("## 📎 Appendix: Evaluation Data\n\n");
    out.push_str(&appendix_block("Candidate", &serde_json::to_string_pretty(candidate)));
    out.push_str(&appendix_block("Technical Analysis", &serde_json::to_string_pretty(&record.tech_summary)));
    out.push_str(&appendix_block("Market Assessment", &serde_json::to_string_pretty(&record.market_assessment)));
    out.push_str(&appendix_block(
        "Competitor Analysis",
        &serde_json::to_string_pretty(&record.competitor_analysis),
    ));
    out.push_str(&appendix_block("Decision", &serde_json::to_string_pretty(decision)));

    out.push_str(&footer(record, generated_at));
    out
}

fn investment_thesis(record: &EvaluationRecord, candidate: &CandidateEvaluation) -> String {
    let market = record
        .market_assessment
        .as_ref()
        .and_then(|m| m.ready())
        .map(|m| m.tam_sam_som.as_str())
        .unwrap_or("significant");
    let persona = record.persona().map(|p| p.as_str()).unwrap_or("current");
    format!(
        "**{}** is positioned to capture value in the {} market. With {}, the company addresses \
         critical pain points in its sector. The {} market opportunity aligns with our {} investment strategy.",
        candidate.name, candidate.sector, candidate.strength, market, persona
    )
}

fn key_highlights(record: &EvaluationRecord, candidate: &CandidateEvaluation, decision: &InvestmentDecision) -> String {
    let checklist_len = decision.checklist_scores.len().max(1);
    let passed = decision.passed_count();
    let market = record
        .market_assessment
        .as_ref()
        .and_then(|m| m.ready())
        .map(|m| m.tam_sam_som.clone())
        .unwrap_or_else(|| "Market size not assessed".to_string());
    let competitors = record
        .competitor_analysis
        .as_ref()
        .and_then(|c| c.ready())
        .map(|c| c.competitors.len())
        .unwrap_or(0);

    [
        format!(
            "- ✅ **Checklist**: {}/{} criteria passed ({:.0}%)",
            passed,
            checklist_len,
            passed as f64 / checklist_len as f64 * 100.0
        ),
        format!("- ✅ **Core Strength**: {}", candidate.strength),
        format!("- ✅ **Market Opportunity**: {}", market),
        format!("- ✅ **Competition**: {} main competitor(s) identified", competitors),
    ]
    .join("\n")
}

fn checklist_distribution(scores: &[u8]) -> String {
    let total = scores.len();
    let passed = scores.iter().filter(|s| **s == 1).count();
    let failed = total - passed;
    format!(
        "### Score Distribution\n\n- **Passed**: {}/{} ({:.1}%)\n- **Failed**: {}/{}\n\n{}{}\n",
        passed,
        total,
        passed as f64 / total.max(1) as f64 * 100.0,
        failed,
        total,
        "🟩".repeat(passed),
        "🟥".repeat(failed)
    )
}

fn checklist_detail(scores: &[u8], policy: &EvaluationPolicy) -> String {
    let mut out = String::from("\n### Itemised Evaluation\n");
    for (question, score) in policy.checklist.iter().zip(scores) {
        let status = if *score == 1 { "✅ PASS" } else { "❌ FAIL" };
        out.push_str(&format!("\n**{}** | {}", status, question));
    }
    out.push('\n');
    out
}

fn tech_section(record: &EvaluationRecord) -> String {
    if let Some(note) = unavailable_note(&record.tech_summary, "Technical analysis") {
        return format!("{}\n", note);
    }
    let Some(tech) = record.tech_summary.as_ref().and_then(|t| t.ready()) else {
        return String::new();
    };
    format_tech(tech)
}

fn format_tech(tech: &TechPayload) -> String {
    let s = &tech.scores;
    let mut out = format!(
        "### Score Summary\n\n- **Domain Fit**: {:.2}\n- **Tech Maturity**: {:.2}\n- **Credibility**: {:.2}\n\
         - **Compliance Risk**: {:.2}\n- **Ecosystem**: {:.2}\n- **Final Score**: {:.3}\n\n",
        s.domain_fit, s.tech_maturity, s.credibility, s.compliance_risk, s.ecosystem, tech.final_score
    );
    if !tech.evidence.is_empty() {
        out.push_str("### Evidence\n\n");
        for ev in &tech.evidence {
            let dimension = ev.relates_to.map(|d| d.as_str()).unwrap_or("general");
            out.push_str(&format!("- `{}` [{}] {} ({})\n", ev.id, dimension, ev.snippet, ev.url));
        }
        out.push('\n');
    }
    if !tech.issues.is_empty() {
        out.push_str(&format!("_Quality issues: {}_\n\n", tech.issues.join("; ")));
    }
    out.push_str(&format!("### Detailed Analysis\n\n{}\n", tech.narrative));
    out
}

fn market_section(record: &EvaluationRecord) -> String {
    if let Some(note) = unavailable_note(&record.market_assessment, "Market assessment") {
        return format!("{}\n", note);
    }
    match record.market_assessment.as_ref().and_then(|m| m.ready()) {
        Some(m) => format!(
            "### Market Size\n\n- **TAM/SAM/SOM**: {}\n- **CAGR**: {}\n- **Target Audience**: {}\n",
            m.tam_sam_som, m.cagr, m.target_audience
        ),
        None => String::new(),
    }
}

fn competitor_section(record: &EvaluationRecord) -> String {
    if let Some(note) = unavailable_note(&record.competitor_analysis, "Competitor analysis") {
        return format!("{}\n", note);
    }
    let Some(analysis) = record.competitor_analysis.as_ref().and_then(|c| c.ready()) else {
        return String::new();
    };
    let mut out = String::from("### Main Competitors\n");
    for (idx, comp) in analysis.competitors.iter().enumerate() {
        out.push_str(&format!("\n#### {}. {}\n\n", idx + 1, comp.name));
        match &comp.swot {
            Swot::Split { strength, weakness } => {
                out.push_str(&format!("**Strength**: {}\n\n**Weakness**: {}\n", strength, weakness));
            }
            Swot::Text(text) => out.push_str(&format!("{}\n", text)),
        }
    }
    out
}

/// Placeholder for a memo field no stage collected
const UNAVAILABLE: &str = "data unavailable";

fn known(value: &str) -> &str {
    if value.trim().is_empty() || value == UNKNOWN {
        UNAVAILABLE
    } else {
        value
    }
}

fn financial_section(record: &EvaluationRecord, candidate: &CandidateEvaluation) -> String {
    let market = record.market_assessment.as_ref().and_then(|m| m.ready());
    let mut out = format!(
        "### Funding Status\n\n- **Current Stage**: {}\n- **Total Raised**: {}\n- **Estimated Valuation**: {}\n\n",
        known(&candidate.funding_stage),
        UNAVAILABLE,
        UNAVAILABLE
    );
    out.push_str(&format!(
        "### Revenue Model\n\n- **Monetization Signal**: {:.0}/100 (regulation and monetization fit)\n\
         - **Revenue Status**: {}\n\n",
        candidate.sub_scores.regulation_monetization, UNAVAILABLE
    ));
    out.push_str(&format!(
        "### Market Headroom\n\n- **TAM/SAM/SOM**: {}\n- **CAGR**: {}\n\n",
        market.map(|m| m.tam_sam_som.as_str()).unwrap_or(UNAVAILABLE),
        market.map(|m| m.cagr.as_str()).unwrap_or(UNAVAILABLE)
    ));
    out.push_str("### Comparable Companies\n\n");
    let comparables: Vec<String> = record
        .competitor_analysis
        .as_ref()
        .and_then(|c| c.ready())
        .map(|c| c.competitors.iter().take(3).map(|comp| format!("{}: valuation {}", comp.name, UNAVAILABLE)).collect())
        .unwrap_or_default();
    out.push_str(&bullet_list(&comparables, &["Comparable data unavailable"]));
    out.push('\n');
    out
}

fn team_section(record: &EvaluationRecord) -> String {
    let tech = record.tech_summary.as_ref().and_then(|t| t.ready());
    let credibility = tech
        .map(|t| format!("{:.2}", t.scores.credibility))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let positioning = tech
        .map(|t| t.notes.positioning.as_str())
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(UNAVAILABLE);
    format!(
        "### Leadership\n\n- **CEO**: {}\n- **CTO**: {}\n- **Team Size**: {}\n\n\
         ### Team Signals\n\n- **Source Credibility**: {}\n- **Positioning**: {}\n\n\
         ### Team Risks\n\n- Key person dependency on founders\n- Compliance staffing must track regulatory change\n",
        UNAVAILABLE, UNAVAILABLE, UNAVAILABLE, credibility, positioning
    )
}

/// Cheque size and ownership band by checklist total: >= 18, >= 15, else
fn term_band(checklist_total: u32) -> (&'static str, &'static str) {
    if checklist_total >= 18 {
        ("$10-15M", "15-20%")
    } else if checklist_total >= 15 {
        ("$5-10M", "15-20%")
    } else {
        ("$3-5M", "10-15%")
    }
}

/// Series letter for the preferred stock: the current series, else B
fn series_letter(funding_stage: &str) -> String {
    funding_stage
        .split_once("Series ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or("B")
        .to_string()
}

fn investment_terms(candidate: &CandidateEvaluation, decision: &InvestmentDecision) -> String {
    let (size, ownership) = term_band(decision.total_score);
    format!(
        "### Investment Size\n\n- **Proposed Investment**: {}\n- **Target Ownership**: {}\n\
         - **Pre-money Valuation**: {}\n\n\
         ### Key Terms\n\n- **Security Type**: Preferred Stock (Series {})\n\
         - **Liquidation Preference**: 1x non-participating\n- **Board Seat**: 1 observer seat minimum\n\
         - **Pro-rata Rights**: Full pro-rata for follow-on rounds\n\
         - **Anti-dilution**: Weighted average (broad-based)\n\n\
         ### Milestone Tranches\n\n- **Tranche 1** (60%): at closing\n\
         - **Tranche 2** (40%): on institutional client onboarding and key regulatory approval\n",
        size,
        ownership,
        UNAVAILABLE,
        series_letter(&candidate.funding_stage)
    )
}

fn risk_mitigation(record: &EvaluationRecord) -> String {
    let scores = record.tech_summary.as_ref().and_then(|t| t.ready()).map(|t| &t.scores);
    let regulatory = match scores {
        Some(s) if s.compliance_risk > 0.3 => "HIGH",
        Some(_) => "MEDIUM",
        None => UNAVAILABLE,
    };
    let technology = match scores {
        Some(s) if s.tech_maturity > 0.5 => "MEDIUM",
        Some(_) => "HIGH",
        None => UNAVAILABLE,
    };
    let adoption = match record.market_assessment.as_ref().and_then(|m| m.ready()) {
        Some(_) => "MEDIUM",
        None => UNAVAILABLE,
    };
    let competition = match record.competitor_analysis.as_ref().and_then(|c| c.ready()) {
        Some(c) if c.competitors.len() >= 3 => "MEDIUM",
        Some(_) => "MEDIUM-LOW",
        None => UNAVAILABLE,
    };

    let rows = [
        ("Regulatory", regulatory, "Dedicated compliance officer; quarterly review with external counsel"),
        ("Technology", technology, "Quarterly security audits; bug bounty program"),
        ("Market Adoption", adoption, "Pilot programs with tier-1 institutions"),
        ("Competition", competition, "Differentiated institutional network; exclusive partnerships"),
    ];
    let mut out = String::from("| Risk | Level | Mitigation |\n|------|-------|------------|\n");
    for (name, level, mitigation) in rows {
        out.push_str(&format!("| {} | {} | {} |\n", name, level, mitigation));
    }
    out
}

const NEXT_STEPS: &str = "### Recommended Next Steps (30-60 days)\n\n\
- [ ] **Phase 1: Deep Due Diligence (Week 1-2)**: legal, technical and financial audit; 3+ customer references\n\
- [ ] **Phase 2: Management Meetings (Week 3-4)**: CEO, CFO and CTO sessions; partner and advisor checks\n\
- [ ] **Phase 3: Term Sheet Negotiation (Week 5-6)**: valuation, board composition, protective provisions\n\
- [ ] **Phase 4: Closing (Week 7-8)**: committee vote, transaction close, reporting framework\n";

fn success_metrics(candidate: &CandidateEvaluation) -> String {
    let rows = [
        ("ARR", UNAVAILABLE, "$5M", "$8M"),
        ("Customers", UNAVAILABLE, "10+ institutions", "15+"),
        ("Team Size", UNAVAILABLE, "50+", "75+"),
        ("Funding Stage", known(&candidate.funding_stage), "Next round closed", "Next round led by tier-1 fund"),
        ("Burn Multiple", UNAVAILABLE, "< 2x", "< 1.5x"),
    ];
    let mut out = String::from(
        "| Metric | Current | 12-Month Target | Stretch Goal |\n|--------|---------|-----------------|--------------|\n",
    );
    for (metric, current, target, stretch) in rows {
        out.push_str(&format!("| **{}** | {} | {} | {} |\n", metric, current, target, stretch));
    }
    out
}

/// Committee items, ticked only when the evaluation data supports them
fn ic_checklist(record: &EvaluationRecord, decision: &InvestmentDecision) -> String {
    let scores = record.tech_summary.as_ref().and_then(|t| t.ready()).map(|t| &t.scores);
    let market = record.market_assessment.as_ref().and_then(|m| m.ready()).is_some();
    let competitors = record
        .competitor_analysis
        .as_ref()
        .and_then(|c| c.ready())
        .is_some_and(|c| !c.competitors.is_empty());
    let checklist_len = decision.checklist_scores.len().max(1);

    let items: [(&str, Option<bool>); 5] = [
        ("Market Opportunity: market sized", Some(market)),
        ("Product Differentiation: competitors mapped", Some(competitors)),
        ("Technology: maturity above 0.5", scores.map(|s| s.tech_maturity > 0.5)),
        ("Regulatory Compliance: risk at or below 0.3", scores.map(|s| s.compliance_risk <= 0.3)),
        (
            "Checklist: at least 75% of criteria passed",
            Some(decision.passed_count() * 4 >= checklist_len * 3),
        ),
    ];

    let mut out = String::new();
    let mut open = 0;
    for (item, status) in items {
        match status {
            Some(true) => out.push_str(&format!("- [x] **{}**\n", item)),
            Some(false) => {
                open += 1;
                out.push_str(&format!("- [ ] **{}**\n", item));
            }
            None => {
                open += 1;
                out.push_str(&format!("- [ ] **{}** ({})\n", item, UNAVAILABLE));
            }
        }
    }
    if open == 0 {
        out.push_str("\n**IC Recommendation**: **APPROVE** with standard terms\n");
    } else {
        out.push_str(&format!(
            "\n**IC Recommendation**: **APPROVE** subject to diligence on {} open item(s)\n",
            open
        ));
    }
    out
}

fn appendix_block(title: &str, json: &serde_json::Result<String>) -> String {
    let body = match json {
        Ok(body) => body.as_str(),
        Err(_) => "null",
    };
    format!("### {}\n\n```json\n{}\n```\n\n", title, body)
}

//=== Exhaustion template ===

pub fn render_exhaustion(record: &EvaluationRecord, policy: &EvaluationPolicy, generated_at: &str) -> String {
    let evaluated: Vec<(&CandidateEvaluation, DecisionOutcome)> = record.evaluated_candidates().collect();
    let persona = persona_label(record);
    let processed = record.candidates_processed();

    let mut out = String::from("# 📋 Investment Evaluation Report (Search Concluded)\n\n---\n\n");
    out.push_str("## 📊 Executive Summary\n\n| Item | Detail |\n|------|--------|\n");
    out.push_str("| **Recommendation** | ❌ **No investment (loop ended)** |\n");
    out.push_str(&format!("| **Investor Persona** | {} |\n", persona));
    out.push_str(&format!("| **Candidates Evaluated** | {} |\n", processed));
    out.push_str(&format!("| **Generated** | {} |\n\n", generated_at));
    out.push_str(&format!(
        "{} candidate(s) were reviewed, and none met the acceptance bar for the {} persona.\n\n---\n\n",
        processed,
        persona.to_lowercase()
    ));

    out.push_str("## 1️⃣ Evaluated Candidates\n\n");
    out.push_str(&evaluated_table(&evaluated));
    out.push_str("\n---\n\n## 2️⃣ Candidate Details\n");
    out.push_str(&evaluated_details(&evaluated));
    out.push_str("\n---\n\n## 3️⃣ Investor Persona\n\n");
    out.push_str(&format!("### {} Investor Profile\n\n", persona));
    out.push_str(
        record
            .persona_assessment()
            .map(|a| a.rationale.as_str())
            .unwrap_or("No persona assessment recorded."),
    );
    out.push_str("\n\n### Ranking Weights\n\n");
    out.push_str(&persona_weights(record, policy));

    out.push_str("\n---\n\n## 4️⃣ Analysis\n\n### Outcome Counts\n\n");
    out.push_str(&outcome_counts(record.decision_log()));
    out.push_str("\n### Key Findings\n\n");
    out.push_str(&key_findings(&evaluated));

    out.push_str("\n---\n\n## 📎 Appendix: Full Ranking\n\n");
    out.push_str(&full_ranking(record.ranked_candidates()));
    out.push_str(&footer(record, generated_at));
    out
}

fn evaluated_table(evaluated: &[(&CandidateEvaluation, DecisionOutcome)]) -> String {
    if evaluated.is_empty() {
        return "No candidates were evaluated.\n".to_string();
    }
    let mut out = String::from("| Rank | Startup | Sector | Score | Decision |\n|------|---------|--------|-------|----------|\n");
    for (idx, (c, outcome)) in evaluated.iter().enumerate() {
        let sector: String = if c.sector.chars().count() > 40 {
            format!("{}...", c.sector.chars().take(40).collect::<String>())
        } else {
            c.sector.clone()
        };
        out.push_str(&format!(
            "| {} | {} | {} | {:.1} | {} {} |\n",
            idx + 1,
            c.name,
            sector,
            c.total_score,
            outcome.marker(),
            outcome
        ));
    }
    out
}

fn evaluated_details(evaluated: &[(&CandidateEvaluation, DecisionOutcome)]) -> String {
    let mut out = String::new();
    for (idx, (c, outcome)) in evaluated.iter().enumerate() {
        out.push_str(&format!(
            "\n### {}. {}\n\n- Sector: {}\n- Website: {}\n- Region: {}\n- Funding Stage: {}\n\n\
             - Rank Score: {:.2}/100\n- Domain Fit: {:.2}\n- Credibility: {:.2}\n\n\
             **Decision**: {}\n\n**Strength**: {}\n",
            idx + 1,
            c.name,
            c.sector,
            c.website,
            c.region,
            c.funding_stage,
            c.total_score,
            c.domain_fit,
            c.credibility_score,
            outcome,
            c.strength
        ));
    }
    out
}

fn persona_weights(record: &EvaluationRecord, policy: &EvaluationPolicy) -> String {
    let Some(persona) = record.persona() else {
        return "No persona assigned.\n".to_string();
    };
    let mut out = String::from("| Criterion | Weight |\n|-----------|--------|\n");
    for (criterion, weight) in policy.weights(persona).entries() {
        out.push_str(&format!("| {} | {:.0}% |\n", criterion, weight * 100.0));
    }
    out
}

fn outcome_counts(log: &[DecisionOutcome]) -> String {
    let count = |o: DecisionOutcome| log.iter().filter(|d| **d == o).count();
    format!(
        "- **Reject**: {}\n- **Hold**: {}\n- **Accept**: {}\n",
        count(DecisionOutcome::Reject),
        count(DecisionOutcome::Hold),
        count(DecisionOutcome::Accept)
    )
}

fn key_findings(evaluated: &[(&CandidateEvaluation, DecisionOutcome)]) -> String {
    if evaluated.is_empty() {
        return "- Not enough evaluation data\n".to_string();
    }
    let scores: Vec<f64> = evaluated.iter().map(|(c, _)| c.total_score).collect();
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    let max = scores.iter().copied().fold(f64::MIN, f64::max);
    let min = scores.iter().copied().fold(f64::MAX, f64::min);
    format!(
        "- **Average Rank Score**: {:.2}/100\n- **Highest Rank Score**: {:.2}/100\n- **Lowest Rank Score**: {:.2}/100\n",
        avg, max, min
    )
}

fn full_ranking(ranked: &[CandidateEvaluation]) -> String {
    if ranked.is_empty() {
        return "No ranking data.\n".to_string();
    }
    let mut out = String::from("| Rank | Startup | Score | Domain Fit | Credibility |\n|------|---------|-------|------------|-------------|\n");
    for (idx, c) in ranked.iter().enumerate() {
        out.push_str(&format!(
            "| {} | {} | {:.1} | {:.2} | {:.2} |\n",
            idx + 1,
            c.name,
            c.total_score,
            c.domain_fit,
            c.credibility_score
        ));
    }
    out
}

fn footer(record: &EvaluationRecord, generated_at: &str) -> String {
    let reason = record
        .termination()
        .map(|t| t.reason())
        .unwrap_or_else(|| "Run ended without a termination record".to_string());
    format!(
        "\n---\n\n**Generated**: {}  \n**Termination**: {}\n",
        generated_at, reason
    )
}
