//! Tailoring Orchestrator — one constrained rewrite call, parsed and verified.
//!
//! State machine: `Idle → AwaitingRewrite → {Parsed, Failed}`. A failed rewrite
//! yields an empty document set; résumé text is never synthesized locally.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::{render, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{complete_within, CompletionRequest, Generator, LlmError, Turn};
use crate::matching::normalize::NormalizedText;
use crate::tailoring::changelog::{synthesize_changes, to_markup};
use crate::tailoring::prompts::{
    CHANGES_MARKER, COVER_MARKER, TAILORED_MARKER, TAILOR_MAX_TOKENS, TAILOR_PROMPT_TEMPLATE,
    TAILOR_SYSTEM, TAILOR_TEMPERATURE,
};
use crate::tailoring::sanitize::{sanitize, RemovedSentence, SourceEvidence};

/// A conventional "Cover Letter" header line, optionally Markdown-decorated.
static COVER_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:#{1,6}[ \t]*|\*\*)?cover letter\b").expect("valid cover header regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteFailure {
    #[error("rewrite service unavailable: {0}")]
    Unavailable(String),

    #[error("rewrite service timed out")]
    TimedOut,

    #[error("rewrite response had no recognizable sections")]
    MalformedResponse,

    #[error("rewrite response had an empty {0} section")]
    EmptySection(&'static str),

    #[error("no {0} content survived sanitization")]
    EmptyAfterSanitize(&'static str),
}

impl RewriteFailure {
    pub fn code(&self) -> &'static str {
        match self {
            RewriteFailure::Unavailable(_) => "llm_unavailable",
            RewriteFailure::TimedOut => "llm_timeout",
            RewriteFailure::MalformedResponse => "malformed_response",
            RewriteFailure::EmptySection(_) => "empty_section",
            RewriteFailure::EmptyAfterSanitize(_) => "empty_after_sanitize",
        }
    }
}

impl From<LlmError> for RewriteFailure {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(_) => RewriteFailure::TimedOut,
            other => RewriteFailure::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteSections {
    pub tailored_resume: String,
    pub cover_letter: String,
    pub change_log: String,
    /// The leading marker was absent and a fallback split was used.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteState {
    Idle,
    AwaitingRewrite,
    Parsed(RewriteSections),
    Failed(RewriteFailure),
}

impl RewriteState {
    pub fn name(&self) -> &'static str {
        match self {
            RewriteState::Idle => "idle",
            RewriteState::AwaitingRewrite => "awaiting_rewrite",
            RewriteState::Parsed(_) => "parsed",
            RewriteState::Failed(_) => "failed",
        }
    }

    /// `Idle → AwaitingRewrite`. Any other state is returned unchanged.
    pub fn begin(self) -> Self {
        match self {
            RewriteState::Idle => RewriteState::AwaitingRewrite,
            other => other,
        }
    }

    /// Consumes the service response. Only meaningful while awaiting.
    pub fn on_response(self, raw: &str) -> Self {
        match self {
            RewriteState::AwaitingRewrite => match parse_sections(raw) {
                Ok(sections) => RewriteState::Parsed(sections),
                Err(failure) => RewriteState::Failed(failure),
            },
            other => other,
        }
    }

    pub fn on_error(self, err: LlmError) -> Self {
        match self {
            RewriteState::AwaitingRewrite => RewriteState::Failed(err.into()),
            other => other,
        }
    }

    /// Sanitizes all three parsed sections against the source résumé. The
    /// change log is synthesized when nothing of the service's own survives.
    pub fn verify(self, source: &NormalizedText) -> (Self, Vec<RemovedSentence>) {
        let sections = match self {
            RewriteState::Parsed(sections) => sections,
            other => return (other, Vec::new()),
        };

        let evidence = SourceEvidence::from_resume(source);
        let resume = sanitize(&sections.tailored_resume, &evidence);
        let letter = sanitize(&sections.cover_letter, &evidence);

        let mut removed = resume.removed;
        removed.extend(letter.removed);

        if resume.text.is_empty() {
            return (
                RewriteState::Failed(RewriteFailure::EmptyAfterSanitize("tailored_resume")),
                removed,
            );
        }
        if letter.text.is_empty() {
            return (
                RewriteState::Failed(RewriteFailure::EmptyAfterSanitize("cover_letter")),
                removed,
            );
        }

        let changes = sanitize(&sections.change_log, &evidence);
        removed.extend(changes.removed);
        let change_log = if changes.text.is_empty() {
            to_markup(&synthesize_changes(source.as_str(), &resume.text))
        } else {
            changes.text
        };

        let verified = RewriteSections {
            tailored_resume: resume.text,
            cover_letter: letter.text,
            change_log,
            degraded: sections.degraded,
        };
        (RewriteState::Parsed(verified), removed)
    }
}

/// Splits a rewrite response on the sentinel markers. Without the leading
/// marker, the remaining markers are tried first and then a "Cover Letter"
/// header. The first two sections must be non-empty.
pub fn parse_sections(raw: &str) -> Result<RewriteSections, RewriteFailure> {
    let (tailored, cover, changes, degraded) = match raw.split_once(TAILORED_MARKER) {
        Some((_, rest)) => {
            let (tailored, rest) = rest.split_once(COVER_MARKER).unwrap_or((rest, ""));
            let (cover, changes) = split_change_log(rest);
            (tailored, cover, changes, false)
        }
        None => match raw.split_once(COVER_MARKER) {
            Some((tailored, rest)) => {
                let (cover, changes) = split_change_log(rest);
                (tailored, cover, changes, true)
            }
            None => {
                let header = COVER_HEADER_RE
                    .find(raw)
                    .ok_or(RewriteFailure::MalformedResponse)?;
                let (cover, changes) = split_change_log(&raw[header.start()..]);
                (&raw[..header.start()], cover, changes, true)
            }
        },
    };

    let tailored = tailored.trim();
    let cover = cover.trim();
    if tailored.is_empty() {
        return Err(RewriteFailure::EmptySection("tailored_resume"));
    }
    if cover.is_empty() {
        return Err(RewriteFailure::EmptySection("cover_letter"));
    }

    Ok(RewriteSections {
        tailored_resume: tailored.to_string(),
        cover_letter: cover.to_string(),
        change_log: changes.trim().to_string(),
        degraded,
    })
}

fn split_change_log(text: &str) -> (&str, &str) {
    text.split_once(CHANGES_MARKER).unwrap_or((text, ""))
}

/// The orchestrator's output documents. `ok=false` carries no content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TailoredDocumentSet {
    pub tailored_resume_markup: String,
    pub cover_letter_markup: String,
    pub change_log_markup: String,
    pub ok: bool,
}

impl TailoredDocumentSet {
    pub fn from_state(state: &RewriteState) -> Self {
        match state {
            RewriteState::Parsed(sections) => TailoredDocumentSet {
                tailored_resume_markup: sections.tailored_resume.clone(),
                cover_letter_markup: sections.cover_letter.clone(),
                change_log_markup: sections.change_log.clone(),
                ok: true,
            },
            _ => TailoredDocumentSet::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub state: RewriteState,
    pub removed: Vec<RemovedSentence>,
}

impl RewriteOutcome {
    pub fn documents(&self) -> TailoredDocumentSet {
        TailoredDocumentSet::from_state(&self.state)
    }

    pub fn failure(&self) -> Option<&RewriteFailure> {
        match &self.state {
            RewriteState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Renders the rewrite prompt. Placeholders inside the résumé or job text are
/// left untouched.
fn build_prompt(resume: &NormalizedText, job: &NormalizedText) -> String {
    render(
        TAILOR_PROMPT_TEMPLATE,
        &[
            ("no_fabrication", NO_FABRICATION_INSTRUCTION),
            ("tailored_marker", TAILORED_MARKER),
            ("cover_marker", COVER_MARKER),
            ("changes_marker", CHANGES_MARKER),
            ("job_text", job.as_str()),
            ("resume_text", resume.as_str()),
        ],
    )
}

pub struct TailoringOrchestrator<'a> {
    generator: &'a dyn Generator,
    limit: Duration,
}

impl<'a> TailoringOrchestrator<'a> {
    pub fn new(generator: &'a dyn Generator, limit: Duration) -> Self {
        Self { generator, limit }
    }

    pub async fn run(&self, resume: &NormalizedText, job: &NormalizedText) -> RewriteOutcome {
        let prompt = build_prompt(resume, job);
        let turns = [Turn::user(&prompt)];
        let request = CompletionRequest {
            system: TAILOR_SYSTEM,
            turns: &turns,
            max_tokens: TAILOR_MAX_TOKENS,
            temperature: TAILOR_TEMPERATURE,
        };

        let state = RewriteState::Idle.begin();
        let state = match complete_within(self.generator, request, self.limit).await {
            Ok(raw) => state.on_response(&raw),
            Err(e) => state.on_error(e),
        };
        let (state, removed) = state.verify(resume);

        match &state {
            RewriteState::Parsed(sections) => info!(
                "Rewrite parsed (degraded={}, sentences_removed={})",
                sections.degraded,
                removed.len()
            ),
            RewriteState::Failed(failure) => warn!("Rewrite failed: {failure}"),
            _ => {}
        }

        RewriteOutcome { state, removed }
    }
}
