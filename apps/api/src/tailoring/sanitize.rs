//! Sanitization — drops rewrite sentences that claim more than the source résumé supports.
//!
//! A sentence is removed when it states a percentage that appears nowhere in
//! the source, or when it invokes a technical-skill cluster (machine learning,
//! experimentation) that the source never mentions.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::matching::normalize::NormalizedText;

static PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:%|percent\b|per cent\b)").expect("valid percent regex")
});

static LIST_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d{1,2}[.)]|#{1,6})\s+").expect("valid list marker regex")
});

struct SkillCluster {
    name: &'static str,
    pattern: Regex,
}

static SKILL_CLUSTERS: Lazy<Vec<SkillCluster>> = Lazy::new(|| {
    vec![
        SkillCluster {
            name: "machine_learning",
            pattern: Regex::new(
                r"(?i)\b(?:machine learning|ml|deep learning|neural networks?|tensorflow|pytorch|scikit-learn|sklearn|llms?|nlp|natural language processing|computer vision|model training)\b",
            )
            .expect("valid ml cluster regex"),
        },
        SkillCluster {
            name: "experimentation",
            pattern: Regex::new(
                r"(?i)\b(?:a/b test(?:s|ing)?|experimentation|experiment design|hypothesis testing|causal inference|statistical significance|multivariate test(?:s|ing)?)\b",
            )
            .expect("valid experimentation cluster regex"),
        },
    ]
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
    UnsupportedPercentage(String),
    UnsupportedSkillCluster(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedSentence {
    pub sentence: String,
    pub reason: Rejection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    pub removed: Vec<RemovedSentence>,
}

/// What the source résumé can vouch for.
#[derive(Debug, Clone, Default)]
pub struct SourceEvidence {
    percentages: HashSet<String>,
    clusters: HashSet<&'static str>,
}

impl SourceEvidence {
    pub fn from_resume(resume: &NormalizedText) -> Self {
        let text = resume.as_str();
        SourceEvidence {
            percentages: percentages_in(text).into_iter().collect(),
            clusters: SKILL_CLUSTERS
                .iter()
                .filter(|c| c.pattern.is_match(text))
                .map(|c| c.name)
                .collect(),
        }
    }

    fn rejection(&self, sentence: &str) -> Option<Rejection> {
        if let Some(pct) = percentages_in(sentence)
            .into_iter()
            .find(|p| !self.percentages.contains(p))
        {
            return Some(Rejection::UnsupportedPercentage(pct));
        }
        SKILL_CLUSTERS
            .iter()
            .find(|c| !self.clusters.contains(c.name) && c.pattern.is_match(sentence))
            .map(|c| Rejection::UnsupportedSkillCluster(c.name))
    }
}

/// Canonical `"<number>%"` keys for every percentage claim in `text`.
fn percentages_in(text: &str) -> Vec<String> {
    PERCENT_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| format!("{}%", m.as_str()))
        .collect()
}

/// Removes unsupported sentences, keeping list markers and line structure.
pub fn sanitize(markup: &str, evidence: &SourceEvidence) -> Sanitized {
    let mut lines = Vec::new();
    let mut removed = Vec::new();

    for line in markup.lines() {
        if line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let marker_len = LIST_MARKER_RE.find(line).map_or(0, |m| m.end());
        let (marker, body) = line.split_at(marker_len);

        let sentences = split_sentences(body);
        let total = sentences.len();
        let kept: Vec<&str> = sentences
            .into_iter()
            .filter(|sentence| match evidence.rejection(sentence) {
                Some(reason) => {
                    removed.push(RemovedSentence {
                        sentence: sentence.to_string(),
                        reason,
                    });
                    false
                }
                None => true,
            })
            .collect();

        if kept.len() == total {
            lines.push(line.to_string());
        } else if !kept.is_empty() {
            lines.push(format!("{marker}{}", kept.join(" ")));
        }
    }

    Sanitized {
        text: collapse_blank_runs(&lines).trim().to_string(),
        removed,
    }
}

/// Splits on `.` `!` `?` followed by whitespace, keeping the terminator.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                let end = idx + c.len_utf8();
                sentences.push(&text[start..end]);
                start = end;
            }
        }
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn collapse_blank_runs(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_empty() && out.last().map_or(false, |prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    out.join("\n")
}
