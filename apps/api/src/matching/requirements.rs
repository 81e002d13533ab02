//! Requirement Extractor — pulls short requirement phrases out of a job posting.
//!
//! A two-state line scanner: `OutsideSection` until a requirement header
//! ("Qualifications", "Responsibilities", ...) is seen, then `InSection` until a
//! blank line or another heading closes it. Inside a section, bullet lines (or
//! plain lines when the section has no bullets) are split on `,` `;` `&` `and`
//! `or` and cleaned into 1–6 word phrases.
//!
//! When no headed section yields anything, every bullet line in the posting is
//! used instead. Malformed input produces an empty list, never an error.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::lexicon::{is_stopword, words};
use crate::matching::normalize::NormalizedText;

/// Header phrases, matched as substrings of a lowercased non-bullet line.
const SECTION_HEADERS: &[&str] = &[
    "qualifications",
    "preferred qualifications",
    "preferred qualifications include",
    "it is expected",
    "responsibilities",
    "requirements",
    "what you'll do",
    "what you will do",
    "what you'll bring",
    "what we're looking for",
    "what we are looking for",
    "must have",
    "nice to have",
];

/// Header lines longer than this are treated as prose that happens to mention a header word.
const MAX_HEADER_WORDS: usize = 8;

pub const MIN_PHRASE_WORDS: usize = 1;
pub const MAX_PHRASE_WORDS: usize = 6;

static BULLET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•·▪‣◦]|\d{1,2}[.)])\s+(.*)$").expect("valid bullet regex")
});

/// Capitalized, letters-and-spaces only: "About Us", "Benefits".
static HEADING_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z ]{2,}:?$").expect("valid heading regex"));

static SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[,;&]|\band\b|\bor\b").expect("valid split regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    OutsideSection,
    InSection {
        /// A candidate line has been consumed since the header.
        collected: bool,
        bullets_seen: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    RequirementHeader,
    /// Colon-terminated line that is not a requirement header.
    Heading,
    Bullet(&'a str),
    Plain { text: &'a str, heading_like: bool },
}

fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if let Some(caps) = BULLET_RE.captures(line) {
        let content = caps.get(1).map_or("", |m| m.as_str());
        return LineKind::Bullet(content);
    }
    if is_requirement_header(trimmed) {
        return LineKind::RequirementHeader;
    }
    if trimmed.ends_with(':') && trimmed.split_whitespace().count() <= MAX_HEADER_WORDS {
        return LineKind::Heading;
    }
    LineKind::Plain {
        text: trimmed,
        heading_like: HEADING_LINE_RE.is_match(trimmed),
    }
}

fn is_requirement_header(trimmed: &str) -> bool {
    if trimmed.split_whitespace().count() > MAX_HEADER_WORDS {
        return false;
    }
    let key = trimmed.to_lowercase().replace('\u{2019}', "'");
    SECTION_HEADERS.iter().any(|h| key.contains(h))
}

impl ScanState {
    /// Advances the scanner by one line, returning the text to harvest if any.
    fn step<'a>(self, kind: LineKind<'a>) -> (ScanState, Option<&'a str>) {
        use ScanState::*;

        match (self, kind) {
            (_, LineKind::RequirementHeader) => (
                InSection {
                    collected: false,
                    bullets_seen: false,
                },
                None,
            ),
            (OutsideSection, _) => (OutsideSection, None),
            (InSection { collected, .. }, LineKind::Blank) => {
                if collected {
                    (OutsideSection, None)
                } else {
                    (self, None)
                }
            }
            (InSection { .. }, LineKind::Heading) => (OutsideSection, None),
            (InSection { .. }, LineKind::Bullet(text)) => (
                InSection {
                    collected: true,
                    bullets_seen: true,
                },
                Some(text),
            ),
            (InSection { bullets_seen: true, .. }, LineKind::Plain { heading_like, .. }) => {
                // Non-bullet text after a bullet list is either a new heading or a wrapped line.
                if heading_like {
                    (OutsideSection, None)
                } else {
                    (self, None)
                }
            }
            (InSection { bullets_seen: false, .. }, LineKind::Plain { text, .. }) => (
                InSection {
                    collected: true,
                    bullets_seen: false,
                },
                Some(text),
            ),
        }
    }
}

/// Extracts ordered, deduplicated requirement phrases from a job posting.
pub fn extract_requirements(job: &NormalizedText) -> Vec<String> {
    let lines: Vec<&str> = job.as_str().lines().collect();
    let mut phrases = Vec::new();

    let mut state = ScanState::OutsideSection;
    for line in &lines {
        let (next, harvested) = state.step(classify(line));
        state = next;
        if let Some(text) = harvested {
            phrases.extend(split_candidates(text));
        }
    }

    if phrases.is_empty() {
        for line in &lines {
            if let LineKind::Bullet(text) = classify(line) {
                phrases.extend(split_candidates(text));
            }
        }
    }

    dedupe_in_order(phrases)
}

/// Splits a requirement line into cleaned candidate phrases.
fn split_candidates(line: &str) -> Vec<String> {
    SPLIT_RE
        .split(line)
        .filter_map(clean_phrase)
        .collect()
}

/// Lowercases, drops punctuation and stopwords, and keeps 1–6 word phrases.
pub fn clean_phrase(raw: &str) -> Option<String> {
    let kept: Vec<String> = words(raw)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .collect();

    if !(MIN_PHRASE_WORDS..=MAX_PHRASE_WORDS).contains(&kept.len()) {
        return None;
    }
    Some(kept.join(" "))
}

fn dedupe_in_order(phrases: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    phrases
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}
