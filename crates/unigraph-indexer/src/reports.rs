//! Community report generation
//!
//! Every community is summarized by the oracle into a JSON report. Replies
//! may be fenced in markdown; a reply that still does not parse leaves the
//! community with a placeholder report instead of failing the run.

use crate::error::IndexerError;
use futures::future::try_join_all;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use unigraph_domain::{Community, Entity, Finding, Relationship};
use unigraph_llm::{extract_json, Oracle};

/// Header of the community report prompt
pub const COMMUNITY_REPORTER: &str = "[DEFINE AGENT: Community Reporter]";

const MAX_RATING: f32 = 10.0;

const COMMUNITY_REPORT: &str = r#"
[DEFINE AGENT: Community Reporter]
    [DEFINE PERSONA:]
        You are an analyst who writes reports about a community of entities in a knowledge graph.
    [END PERSONA]

    [DEFINE INPUT]
        entities: ${ {{entities}} }$
        relationships: ${ {{relationships}} }$
    [END INPUT]

    [DEFINE CONSTRAINTS]
        evidence: Only state what the <REF> entities </REF> and <REF> relationships </REF> support.
        rating: The rating is a number between 0 and 10 expressing how important the community is.
        output format: Output a single JSON object {"title": "...", "summary": "...", "rating": 0.0, "rating_explanation": "...", "findings": [{"summary": "...", "explanation": "..."}]}.
    [END CONSTRAINTS]

    [DEFINE INSTRUCTION]
        [COMMAND-1 Name the community after its most representative entities in a short title.]
        [COMMAND-2 <apply-constraints> evidence </apply-constraints> Summarize the structure of the community and list its key findings.]
        [COMMAND-3 <apply-constraints> rating, output format </apply-constraints> Rate the community and output the report in the specified format.]
    [END INSTRUCTION]
[END AGENT]
"#;

/// A community before its report is written
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityDraft {
    /// Stable id, `"<level>-<ordinal>"`
    pub id: String,
    /// 0-based hierarchy level
    pub level: u32,
    /// Id of the enclosing community
    pub parent: Option<String>,
    /// Member entity ids
    pub member_entity_ids: Vec<String>,
    /// Rendered prompt
    pub prompt: String,
}

/// Build the report prompt for a community
///
/// Shows at most `rows` entities and `rows` relationships.
pub fn report_prompt(entities: &[&Entity], relationships: &[&Relationship], rows: usize) -> String {
    let mut entity_rows = vec!["id|entity|type|attributes".to_string()];
    entity_rows.extend(entities.iter().take(rows).map(|e| {
        let attributes: Vec<String> = e
            .attributes
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        format!("{}|{}|{}|{}", e.id, e.name, e.entity_type, attributes.join("; "))
    }));

    let name_of = |id: &str| {
        entities
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let mut relationship_rows = vec!["id|source|target|relation|provenance".to_string()];
    relationship_rows.extend(relationships.iter().take(rows).map(|r| {
        format!(
            "{}|{}|{}|{}|{}",
            r.id,
            name_of(&r.source),
            name_of(&r.target),
            r.name,
            r.provenance
        )
    }));

    COMMUNITY_REPORT
        .replace("{{entities}}", &entity_rows.join("\n"))
        .replace("{{relationships}}", &relationship_rows.join("\n"))
        .trim()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    rating: serde_json::Value,
    #[serde(default)]
    rating_explanation: String,
    #[serde(default)]
    findings: Vec<RawFinding>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFinding {
    Full {
        summary: String,
        #[serde(default)]
        explanation: String,
    },
    Text(String),
}

/// The fields of a parsed report
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    /// Report title
    pub title: String,
    /// Report summary
    pub summary: String,
    /// Importance rating in `[0, 10]`
    pub rating: f32,
    /// Why the rating was given
    pub rating_explanation: String,
    /// Key findings
    pub findings: Vec<Finding>,
}

/// Parse a report reply
///
/// The rating may be a number or a numeric string and is clamped to
/// `[0, 10]`; a missing or unreadable rating becomes 0.
pub fn parse_report(reply: &str) -> Result<ParsedReport, String> {
    let json = extract_json(reply).map_err(|e| e.to_string())?;
    let raw: RawReport =
        serde_json::from_str(&json).map_err(|e| format!("Invalid report JSON: {}", e))?;
    if raw.title.trim().is_empty() {
        return Err("Report has no title".to_string());
    }

    let rating = match &raw.rating {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0) as f32,
        serde_json::Value::String(s) => s.trim().parse::<f32>().unwrap_or(0.0),
        _ => 0.0,
    };
    let rating = if rating.is_finite() { rating.clamp(0.0, MAX_RATING) } else { 0.0 };

    let findings = raw
        .findings
        .into_iter()
        .map(|f| match f {
            RawFinding::Full { summary, explanation } => Finding { summary, explanation },
            RawFinding::Text(summary) => Finding {
                summary,
                explanation: String::new(),
            },
        })
        .collect();

    Ok(ParsedReport {
        title: raw.title.trim().to_string(),
        summary: raw.summary.trim().to_string(),
        rating,
        rating_explanation: raw.rating_explanation,
        findings,
    })
}

/// Render title, summary and findings as one markdown document
pub fn render_full_content(report: &ParsedReport) -> String {
    let mut out = format!("# {}\n\n{}\n", report.title, report.summary);
    for finding in &report.findings {
        out.push_str(&format!("\n## {}\n\n{}\n", finding.summary, finding.explanation));
    }
    out.trim_end().to_string()
}

fn placeholder(draft: &CommunityDraft) -> ParsedReport {
    ParsedReport {
        title: format!("Community {}", draft.id),
        summary: String::new(),
        rating: 0.0,
        rating_explanation: String::new(),
        findings: Vec::new(),
    }
}

/// Writes community reports under a concurrency bound
pub struct ReportWriter {
    oracle: Arc<dyn Oracle>,
    permits: Arc<Semaphore>,
}

impl ReportWriter {
    /// Create a writer issuing at most `concurrency` calls at once
    pub fn new(oracle: Arc<dyn Oracle>, concurrency: usize) -> Self {
        Self {
            oracle,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Write a report for every draft, in draft order
    ///
    /// Each result carries whether the reply parsed. A provider error aborts
    /// the whole batch.
    pub async fn write_all(
        &self,
        drafts: Vec<CommunityDraft>,
    ) -> Result<Vec<(Community, bool)>, IndexerError> {
        try_join_all(drafts.into_iter().map(|draft| self.write(draft))).await
    }

    async fn write(&self, draft: CommunityDraft) -> Result<(Community, bool), IndexerError> {
        let reply = {
            // The semaphore is never closed
            let _permit = self.permits.acquire().await.ok();
            self.oracle.get_response(&draft.prompt).await?
        };

        let (report, parsed) = match parse_report(&reply) {
            Ok(report) => {
                debug!("Report for community {}: {}", draft.id, report.title);
                (report, true)
            }
            Err(e) => {
                warn!("Unparseable report for community {}: {}", draft.id, e);
                (placeholder(&draft), false)
            }
        };

        let community = Community {
            full_content: render_full_content(&report),
            id: draft.id,
            level: draft.level,
            parent: draft.parent,
            member_entity_ids: draft.member_entity_ids,
            title: report.title,
            summary: report.summary,
            rating: report.rating,
            rating_explanation: report.rating_explanation,
            findings: report.findings,
            attributes: Default::default(),
        };
        Ok((community, parsed))
    }
}
