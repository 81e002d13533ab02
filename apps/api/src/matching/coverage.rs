//! Coverage Scorer — measures how much of a job posting a résumé already covers.
//!
//! Primary path: phrase coverage against extracted requirement phrases.
//! Fallback path: token-set overlap, used only when no phrases can be extracted.
//! The two are never blended.

use serde::{Deserialize, Serialize};

use crate::matching::lexicon::{singularize, TokenSet, Vocabulary};
use crate::matching::normalize::NormalizedText;
use crate::matching::requirements::extract_requirements;

/// Maximum number of missing items surfaced to the caller.
pub const MISSING_CAP: usize = 12;

/// Which scoring path produced a `MatchResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringEngine {
    PhraseCoverage,
    TokenOverlap,
}

impl ScoringEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringEngine::PhraseCoverage => "phrase_coverage",
            ScoringEngine::TokenOverlap => "token_overlap",
        }
    }
}

/// Score plus the missing/covered split. `missing` and `covered` are disjoint;
/// on the phrase path their union is the full phrase list in extraction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub score: u8,
    pub missing: Vec<String>,
    pub covered: Vec<String>,
    pub engine: ScoringEngine,
}

impl MatchResult {
    fn empty(engine: ScoringEngine) -> Self {
        MatchResult {
            score: 0,
            missing: vec![],
            covered: vec![],
            engine,
        }
    }

    /// Missing items, capped for display.
    pub fn missing_keywords(&self) -> &[String] {
        &self.missing[..self.missing.len().min(MISSING_CAP)]
    }
}

/// Scores a résumé against a job posting, extracting requirement phrases first.
pub fn score_match(resume: &NormalizedText, job: &NormalizedText) -> MatchResult {
    let phrases = extract_requirements(job);
    if phrases.is_empty() {
        return score_token_overlap(resume, job);
    }
    score_phrases(resume, &phrases)
}

/// Phrase coverage against pre-extracted requirement phrases.
pub fn score_phrases(resume: &NormalizedText, phrases: &[String]) -> MatchResult {
    if phrases.is_empty() {
        return MatchResult::empty(ScoringEngine::PhraseCoverage);
    }

    let vocabulary = Vocabulary::from_text(resume);
    let (covered, missing): (Vec<String>, Vec<String>) = phrases
        .iter()
        .cloned()
        .partition(|phrase| is_covered(phrase, &vocabulary));

    MatchResult {
        score: percentage(covered.len(), phrases.len()),
        missing,
        covered,
        engine: ScoringEngine::PhraseCoverage,
    }
}

/// Raw token overlap between résumé and job vocabularies. Lists are sorted.
pub fn score_token_overlap(resume: &NormalizedText, job: &NormalizedText) -> MatchResult {
    let job_tokens = TokenSet::from_text(job);
    if job_tokens.is_empty() {
        return MatchResult::empty(ScoringEngine::TokenOverlap);
    }
    let resume_tokens = TokenSet::from_text(resume);

    let covered = job_tokens.intersection(&resume_tokens);
    let missing = job_tokens.difference(&resume_tokens);

    MatchResult {
        score: percentage(covered.len(), job_tokens.len()),
        missing,
        covered,
        engine: ScoringEngine::TokenOverlap,
    }
}

/// A phrase is covered when it appears as a résumé bigram, or when every one
/// of its singularized words is a résumé unigram.
fn is_covered(phrase: &str, vocabulary: &Vocabulary) -> bool {
    let words: Vec<String> = phrase.split_whitespace().map(singularize).collect();
    if words.is_empty() {
        return false;
    }
    if words.len() == 2 && vocabulary.has_bigram(&words.join(" ")) {
        return true;
    }
    words.iter().all(|w| vocabulary.has_unigram(w))
}

fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    // Halves round to even: 1 of 8 scores 12, 3 of 8 scores 38.
    let pct = (100.0 * part as f64 / whole as f64).round_ties_even();
    pct.clamp(0.0, 100.0) as u8
}
