//! Tailoring pipeline — validate, normalize, score, then rewrite and plan actions concurrently.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::Generator;
use crate::matching::actions::{generate_actions, template_actions, ActionPlan, ActionSource};
use crate::matching::ats::ats_flags;
use crate::matching::coverage::{score_match, MatchResult, ScoringEngine};
use crate::matching::normalize::NormalizedText;
use crate::tailoring::orchestrator::{TailoredDocumentSet, TailoringOrchestrator};

pub const ENGINE_LLM: &str = "llm+heuristic";
pub const ENGINE_HEURISTIC: &str = "heuristic-only";

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub llm_timeout: Duration,
    pub llm_actions: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            llm_timeout: config.llm_timeout,
            llm_actions: config.enable_llm_actions,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailorRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_text: String,
}

struct PreparedInputs {
    resume: NormalizedText,
    job: NormalizedText,
}

impl TailorRequest {
    fn prepare(&self) -> Result<PreparedInputs, AppError> {
        let resume = NormalizedText::from_raw(&self.resume_text);
        if resume.is_empty() {
            return Err(AppError::Validation("resume_text cannot be empty".to_string()));
        }
        let job = NormalizedText::from_markup(&self.job_text);
        if job.is_empty() {
            return Err(AppError::Validation("job_text cannot be empty".to_string()));
        }
        Ok(PreparedInputs { resume, job })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub engine: &'static str,
    pub scoring_engine: ScoringEngine,
    pub match_score: u8,
    pub missing_keywords: Vec<String>,
    pub present_keywords: Vec<String>,
    pub ats_flags: Vec<String>,
    pub do_now: Vec<String>,
    pub do_long: Vec<String>,
    pub actions_source: ActionSource,
}

impl Insights {
    fn assemble(
        engine: &'static str,
        matched: &MatchResult,
        plan: &ActionPlan,
        resume: &NormalizedText,
    ) -> Self {
        Insights {
            engine,
            scoring_engine: matched.engine,
            match_score: matched.score,
            missing_keywords: matched.missing_keywords().to_vec(),
            present_keywords: matched.covered.clone(),
            ats_flags: ats_flags(resume),
            do_now: plan.do_now_titles(),
            do_long: plan.do_long_titles(),
            actions_source: plan.source,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TailorResponse {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub documents: TailoredDocumentSet,
    pub error: Option<&'static str>,
    pub insights: Insights,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightsResponse {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub insights: Insights,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

async fn plan_actions(
    generator: &dyn Generator,
    settings: &PipelineSettings,
    matched: &MatchResult,
    job: &NormalizedText,
) -> ActionPlan {
    if settings.llm_actions {
        generate_actions(generator, matched.missing_keywords(), job, settings.llm_timeout).await
    } else {
        template_actions(matched.missing_keywords(), job)
    }
}

/// Full tailoring run. Only input validation fails the call; a failed rewrite
/// comes back as `ok=false` with insights intact.
pub async fn run_tailoring(
    generator: &dyn Generator,
    settings: &PipelineSettings,
    request: &TailorRequest,
) -> Result<TailorResponse, AppError> {
    let inputs = request.prepare()?;
    let request_id = Uuid::new_v4();

    let matched = score_match(&inputs.resume, &inputs.job);
    info!(
        %request_id,
        "Match score {} via {} ({} missing)",
        matched.score,
        matched.engine.as_str(),
        matched.missing.len()
    );

    let orchestrator = TailoringOrchestrator::new(generator, settings.llm_timeout);
    let (outcome, plan) = tokio::join!(
        orchestrator.run(&inputs.resume, &inputs.job),
        plan_actions(generator, settings, &matched, &inputs.job),
    );

    let documents = outcome.documents();
    let engine = if documents.ok { ENGINE_LLM } else { ENGINE_HEURISTIC };
    info!(
        %request_id,
        "Tailoring finished: state={}, actions={:?}",
        outcome.state.name(),
        plan.source
    );

    Ok(TailorResponse {
        request_id,
        generated_at: Utc::now(),
        error: outcome.failure().map(|f| f.code()),
        insights: Insights::assemble(engine, &matched, &plan, &inputs.resume),
        documents,
    })
}

/// Heuristic insights only: no rewrite call is made.
pub async fn run_insights(
    generator: &dyn Generator,
    settings: &PipelineSettings,
    request: &TailorRequest,
) -> Result<InsightsResponse, AppError> {
    let inputs = request.prepare()?;
    let request_id = Uuid::new_v4();

    let matched = score_match(&inputs.resume, &inputs.job);
    let plan = plan_actions(generator, settings, &matched, &inputs.job).await;
    info!(
        %request_id,
        "Insights: score {} via {}",
        matched.score,
        matched.engine.as_str()
    );

    Ok(InsightsResponse {
        request_id,
        generated_at: Utc::now(),
        insights: Insights::assemble(ENGINE_HEURISTIC, &matched, &plan, &inputs.resume),
    })
}
