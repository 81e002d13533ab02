//! Action Generator — turns missing requirements into "do now" / "do long" steps.
//!
//! Preferred: a structured suggestion list from the generation service.
//! Fallback: deterministic, artifact-producing templates keyed on the role
//! domain. The fallback is never empty and is the terminal answer of the pipeline.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm_client::prompts::{render, JSON_ONLY_SYSTEM};
use crate::llm_client::{complete_within, strip_json_fences, CompletionRequest, Generator, Turn};
use crate::matching::normalize::NormalizedText;
use crate::matching::prompts::{ACTIONS_PROMPT_TEMPLATE, ACTIONS_SYSTEM};

pub const DO_NOW_COUNT: usize = 3;
pub const DO_LONG_COUNT: usize = 2;

/// Number of missing items named in the templates.
const TOP_MISSING: usize = 3;

const MIN_TITLE_CHARS: usize = 8;
const MAX_TITLE_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Now,
    Long,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub title: String,
    pub timeframe: Timeframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    Generated,
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    pub do_now: Vec<ActionItem>,
    pub do_long: Vec<ActionItem>,
    pub source: ActionSource,
}

impl ActionPlan {
    pub fn do_now_titles(&self) -> Vec<String> {
        self.do_now.iter().map(|a| a.title.clone()).collect()
    }

    pub fn do_long_titles(&self) -> Vec<String> {
        self.do_long.iter().map(|a| a.title.clone()).collect()
    }
}

/// Role domain sniffed from the job text, used to pick template phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDomain {
    Admissions,
    MediaProduction,
    General,
}

static MEDIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:film|filmmaking|television|tv|broadcast|post-production|footage|casting|screenplay|script|video editing|video editor|producer|production assistant)\b",
    )
    .expect("valid media regex")
});

pub fn detect_domain(job: &NormalizedText) -> RoleDomain {
    let text = job.as_str().to_lowercase();
    let admissions = text.contains("admission")
        && ["application", "evaluate", "reader"]
            .iter()
            .any(|w| text.contains(w));
    if admissions {
        RoleDomain::Admissions
    } else if MEDIA_RE.is_match(&text) {
        RoleDomain::MediaProduction
    } else {
        RoleDomain::General
    }
}

/// Deterministic fallback. Names up to three top missing items; never empty.
pub fn template_actions(missing: &[String], job: &NormalizedText) -> ActionPlan {
    let top: Vec<&str> = missing
        .iter()
        .map(String::as_str)
        .filter(|m| !m.trim().is_empty())
        .take(TOP_MISSING)
        .collect();
    let focus = if top.is_empty() {
        "the key criteria in this posting".to_string()
    } else {
        top.join(", ")
    };

    let (do_now, do_long): (Vec<String>, Vec<String>) = match detect_domain(job) {
        RoleDomain::Admissions => (
            vec![
                "Complete a quick FERPA refresher and write a 5-bullet checklist for confidential handling. (time ~1h)".to_string(),
                "Practice 3 narrative summaries (120–180 words each) using a structured template: context → academics → activities → contribution potential. (time ~2–3h)".to_string(),
                format!("Draft a one-page rubric to rate applications and note where your experience maps to {focus}; test it on one sample file. (time ~2h)"),
            ],
            vec![
                "Run a timed reading sprint of 10 sample files (20–25 minutes each), track pace and quality, then iterate your rubric once. (time ~1–2 wks)".to_string(),
                "Create a 3–4 page reader handbook with exemplar narratives, common patterns, and edge cases. (time ~2–3 wks)".to_string(),
            ],
        ),
        RoleDomain::MediaProduction => (
            vec![
                format!("Assemble a one-page credits sheet mapping productions you already worked on to {focus}. (time ~1–2h)"),
                "Build a shot list or call sheet template from a project you already worked on. (time ~2–3h)".to_string(),
                "Write a short production recap (scope, crew size, schedule, your role) for one past project. (time ~1–2h)".to_string(),
            ],
            vec![
                "Cut a 60–90 second reel from footage you have rights to, with a short breakdown of your role. (time ~1–2 wks)".to_string(),
                "Document one production workflow you already use (ingest, logging, or scheduling) as a reusable checklist. (time ~1–2 wks)".to_string(),
            ],
        ),
        RoleDomain::General => (
            vec![
                format!("Draft a one-page alignment sheet mapping your experience to {focus}. (time ~1–2h)"),
                "Create a small, truthful sample artifact (checklist, outline, or process doc) based on your current experience. (time ~3–4h)".to_string(),
                "Write a short impact recap (before/after, scope, timing) from a past project. (time ~2–3h)".to_string(),
            ],
            vec![
                "Turn one artifact into a portfolio piece with a clear README and trade-offs. (time ~1–2 wks)".to_string(),
                "Iterate a workflow you already use and document the improvement. (time ~1–2 wks)".to_string(),
            ],
        ),
    };

    ActionPlan {
        do_now: into_items(do_now, Timeframe::Now),
        do_long: into_items(do_long, Timeframe::Long),
        source: ActionSource::Template,
    }
}

fn into_items(titles: Vec<String>, timeframe: Timeframe) -> Vec<ActionItem> {
    titles
        .into_iter()
        .map(|title| ActionItem { title, timeframe })
        .collect()
}

#[derive(Debug, Deserialize)]
struct SuggestedActions {
    do_now: Vec<String>,
    do_long: Vec<String>,
}

/// Parses and validates a suggestion payload. `None` means "use the templates".
pub fn parse_suggestions(raw: &str) -> Option<ActionPlan> {
    let suggested: SuggestedActions = serde_json::from_str(strip_json_fences(raw)).ok()?;

    let do_now = validated(suggested.do_now, DO_NOW_COUNT)?;
    let do_long = validated(suggested.do_long, DO_LONG_COUNT)?;

    Some(ActionPlan {
        do_now: into_items(do_now, Timeframe::Now),
        do_long: into_items(do_long, Timeframe::Long),
        source: ActionSource::Generated,
    })
}

/// Every title must be well-formed; at least `count` are required and the rest are dropped.
fn validated(titles: Vec<String>, count: usize) -> Option<Vec<String>> {
    let titles: Vec<String> = titles.into_iter().map(|t| t.trim().to_string()).collect();
    let well_formed = titles.iter().all(|t| {
        let chars = t.chars().count();
        (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&chars) && !t.contains('\n')
    });
    if !well_formed || titles.len() < count {
        return None;
    }
    Some(titles.into_iter().take(count).collect())
}

fn build_prompt(missing: &[String], job: &NormalizedText) -> String {
    let missing_json = serde_json::to_string(missing).unwrap_or_else(|_| "[]".to_string());
    render(
        ACTIONS_PROMPT_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_SYSTEM),
            ("missing_json", &missing_json),
            ("job_text", job.as_str()),
        ],
    )
}

/// Tries the generation service, falling back to templates on any failure.
pub async fn generate_actions(
    generator: &dyn Generator,
    missing: &[String],
    job: &NormalizedText,
    limit: Duration,
) -> ActionPlan {
    let prompt = build_prompt(missing, job);
    let turns = [Turn::user(&prompt)];
    let request = CompletionRequest {
        system: ACTIONS_SYSTEM,
        turns: &turns,
        max_tokens: 600,
        temperature: 0.3,
    };

    match complete_within(generator, request, limit).await {
        Ok(raw) => match parse_suggestions(&raw) {
            Some(plan) => {
                info!("Using generated action suggestions");
                plan
            }
            None => {
                warn!("Action suggestions were malformed — using templates");
                template_actions(missing, job)
            }
        },
        Err(e) => {
            warn!("Action suggestion call failed ({e}) — using templates");
            template_actions(missing, job)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{DisabledGenerator, LlmError};
    use async_trait::async_trait;

    fn norm(text: &str) -> NormalizedText {
        NormalizedText::from_raw(text)
    }

    struct CannedGenerator(&'static str);

    #[async_trait]
    impl Generator for CannedGenerator {
        async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    const GOOD_SUGGESTIONS: &str = r#"```json
    {
      "do_now": [
        "Draft a SQL practice log from three queries you already ran at work (time ~2h)",
        "Write a one-page reporting checklist from your current process (time ~1h)",
        "Outline a dashboard mock-up using data you already handle (time ~3h)"
      ],
      "do_long": [
        "Publish a small portfolio case study with a README (time ~2 wks)",
        "Document a reporting workflow improvement end to end (time ~1-2 wks)"
      ]
    }
    ```"#;

    #[test]
    fn test_domain_detection() {
        assert_eq!(
            detect_domain(&norm("Seasonal admissions reader to evaluate applications")),
            RoleDomain::Admissions
        );
        assert_eq!(
            detect_domain(&norm("Production assistant for a television series")),
            RoleDomain::MediaProduction
        );
        assert_eq!(
            detect_domain(&norm("JavaScript developer; see job description")),
            RoleDomain::General
        );
        // "admission" alone, without reading/evaluation vocabulary, is not an admissions-reader role.
        assert_eq!(
            detect_domain(&norm("Museum admission desk attendant")),
            RoleDomain::General
        );
    }

    #[test]
    fn test_templates_name_top_three_missing_items() {
        let missing: Vec<String> = ["sql", "tableau", "forecasting", "python"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let plan = template_actions(&missing, &norm("Analyst role"));
        assert_eq!(plan.source, ActionSource::Template);
        assert!(plan.do_now[0].title.contains("sql, tableau, forecasting"));
        assert!(!plan.do_now[0].title.contains("python"));
    }

    #[test]
    fn test_templates_never_empty_without_missing_items() {
        for job in ["", "Admissions reader, evaluate applications", "Film producer"] {
            let plan = template_actions(&[], &norm(job));
            assert_eq!(plan.do_now.len(), DO_NOW_COUNT);
            assert_eq!(plan.do_long.len(), DO_LONG_COUNT);
            assert!(plan.do_now.iter().all(|a| a.timeframe == Timeframe::Now));
            assert!(plan.do_long.iter().all(|a| a.timeframe == Timeframe::Long));
        }
    }

    #[test]
    fn test_parse_suggestions_accepts_fenced_json() {
        let plan = parse_suggestions(GOOD_SUGGESTIONS).unwrap();
        assert_eq!(plan.source, ActionSource::Generated);
        assert_eq!(plan.do_now.len(), 3);
        assert_eq!(plan.do_long.len(), 2);
    }

    #[test]
    fn test_parse_suggestions_truncates_extra_items() {
        let raw = r#"{
            "do_now": ["Write a checklist (2h)", "Draft a summary (1h)", "Outline a plan (1h)", "Extra step here (1h)"],
            "do_long": ["Build a portfolio piece (2 wks)", "Document a workflow (1 wk)", "Another one (1 wk)"]
        }"#;
        let plan = parse_suggestions(raw).unwrap();
        assert_eq!(plan.do_now.len(), 3);
        assert_eq!(plan.do_long.len(), 2);
    }

    #[test]
    fn test_parse_suggestions_rejects_blank_or_short_lists() {
        assert!(parse_suggestions("not json").is_none());
        assert!(parse_suggestions(r#"{"do_now": ["Write a checklist (2h)"], "do_long": []}"#).is_none());
        let blank = r#"{
            "do_now": ["Write a checklist (2h)", "   ", "Outline a plan (1h)"],
            "do_long": ["Build a portfolio piece (2 wks)", "Document a workflow (1 wk)"]
        }"#;
        assert!(parse_suggestions(blank).is_none());
    }

    #[test]
    fn test_prompt_leaves_job_placeholders_alone() {
        let prompt = build_prompt(&["sql".to_string()], &norm("Send {missing_json} to {json_only}"));
        assert!(prompt.contains("Send {missing_json} to {json_only}"));
        assert_eq!(prompt.matches(r#"["sql"]"#).count(), 1);
        assert_eq!(prompt.matches(JSON_ONLY_SYSTEM).count(), 1);
    }

    #[tokio::test]
    async fn test_generate_actions_prefers_generated_list() {
        let plan = generate_actions(
            &CannedGenerator(GOOD_SUGGESTIONS),
            &["sql".to_string()],
            &norm("Data analyst"),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(plan.source, ActionSource::Generated);
        assert!(plan.do_now[0].title.starts_with("Draft a SQL practice log"));
    }

    #[tokio::test]
    async fn test_generate_actions_falls_back_on_garbage() {
        let plan = generate_actions(
            &CannedGenerator("Sure! Here are some ideas..."),
            &["sql".to_string()],
            &norm("Data analyst"),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(plan.source, ActionSource::Template);
        assert_eq!(plan.do_now.len(), DO_NOW_COUNT);
    }

    #[tokio::test]
    async fn test_generate_actions_falls_back_when_unavailable() {
        let plan = generate_actions(&DisabledGenerator, &[], &norm(""), Duration::from_secs(5)).await;
        assert_eq!(plan.source, ActionSource::Template);
        assert!(!plan.do_now.is_empty());
    }
}
