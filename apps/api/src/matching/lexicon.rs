//! Lexical Filter — turns normalized text into comparable terms.
//!
//! Tokens are lowercase, trimmed of edge punctuation, at least three letters,
//! free of digits and stopwords, and lightly singularized so that
//! "admissions" and "admission" compare equal.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::normalize::NormalizedText;

/// Function words, job-posting boilerplate, and calendar/timezone tokens.
const STOPWORDS: &[&str] = &[
    // function words
    "the", "and", "or", "but", "if", "then", "than", "so", "because", "while", "where", "when",
    "for", "with", "from", "into", "over", "under", "between", "within", "without", "about",
    "above", "below", "after", "before", "during", "across", "along", "alongside", "around",
    "another", "to", "in", "on", "at", "by", "of", "as", "per", "via", "a", "an", "is", "are",
    "be", "been", "being", "was", "were", "do", "does", "did", "done", "doing", "have", "has",
    "had", "having", "can", "could", "may", "might", "must", "should", "would", "will", "this",
    "that", "these", "those", "such", "same", "other", "each", "every", "any", "all", "some",
    "most", "more", "many", "few", "it", "its", "itself", "they", "them", "their", "theirs",
    "we", "our", "ours", "you", "your", "yours", "i", "me", "my", "mine",
    // job-posting boilerplate
    "position", "role", "team", "department", "responsibilities", "requirements", "preferred",
    "qualifications", "preference", "materials", "process", "summary", "including", "include",
    "includes", "work", "working", "hours", "availability", "schedule", "scheduling", "remote",
    "onsite", "entirely", "training", "onboarding", "week", "weeks", "day", "days", "month",
    "months", "year", "years", "applicant", "applicants", "candidates", "candidate", "staff",
    "office", "mission", "values",
    // generic institutional filler
    "college", "university", "liberal", "arts", "education",
    // time words and timezones
    "am", "pm", "cst", "est", "pst", "mst", "utc", "monday", "tuesday", "wednesday", "thursday",
    "friday", "saturday", "sunday", "january", "february", "march", "april", "june", "july",
    "august", "september", "october", "november", "december",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORDS.iter().copied().collect());

/// Candidate terms: a letter followed by letters or `. + # -`.
static TERM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z][a-z.+#-]*").expect("valid term regex"));

static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}(:?\d{2})?(am|pm)?$").expect("valid clock regex"));

static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d$.,%-]+$").expect("valid numeric regex"));

const EDGE_PUNCTUATION: &[char] = &['.', '+', '#', '-'];

/// Minimum token length for the lexical filter.
pub const MIN_TOKEN_LEN: usize = 3;

pub fn is_stopword(word: &str) -> bool {
    STOPWORD_SET.contains(word)
}

/// Strips plural endings using a small rule table. Terms carrying interior
/// symbols (`node.js`, `c#`) are left alone.
pub fn singularize(token: &str) -> String {
    let len = token.len();
    if len <= 3 || !token.is_ascii() || token.contains(['.', '+', '#']) {
        return token.to_string();
    }
    if token.ends_with("ies") && len > 4 {
        return format!("{}y", &token[..len - 3]);
    }
    const SIBILANT_PLURALS: &[&str] = &["sses", "shes", "ches", "xes", "zes"];
    if SIBILANT_PLURALS.iter().any(|suffix| token.ends_with(suffix)) {
        return token[..len - 2].to_string();
    }
    if token.ends_with('s') && !["ss", "us", "is"].iter().any(|suffix| token.ends_with(suffix)) {
        return token[..len - 1].to_string();
    }
    token.to_string()
}

/// Lowercased words with edge punctuation removed, in source order.
/// Trailing symbols that belong to a term (`c++`, `c#`) are kept.
pub fn words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM_RE
        .find_iter(&lowered)
        .map(|m| trim_word(m.as_str()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

fn trim_word(word: &str) -> &str {
    let word = word.trim_end_matches(['.', '-']);
    if word.ends_with(['+', '#']) && word.trim_end_matches(['+', '#']).len() <= 2 {
        word
    } else {
        word.trim_end_matches(EDGE_PUNCTUATION)
    }
}

/// Deduplicated set of filtered tokens. Deterministic and order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
    pub fn from_text(text: &NormalizedText) -> Self {
        let lowered = text.as_str().to_lowercase();
        let tokens = TERM_RE
            .find_iter(&lowered)
            .filter_map(|m| filter_token(m.as_str()))
            .collect();
        TokenSet(tokens)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tokens present in both sets, sorted.
    pub fn intersection(&self, other: &TokenSet) -> Vec<String> {
        self.0.intersection(&other.0).cloned().collect()
    }

    /// Tokens in `self` that `other` lacks, sorted.
    pub fn difference(&self, other: &TokenSet) -> Vec<String> {
        self.0.difference(&other.0).cloned().collect()
    }
}

fn filter_token(raw: &str) -> Option<String> {
    let token = raw.trim_matches(EDGE_PUNCTUATION);
    if token.len() < MIN_TOKEN_LEN {
        return None;
    }
    if CLOCK_TIME_RE.is_match(token) || NUMERIC_RE.is_match(token) {
        return None;
    }
    if token.chars().any(|c| c.is_ascii_digit()) || is_stopword(token) {
        return None;
    }
    let token = singularize(token);
    if is_stopword(&token) || token.len() < MIN_TOKEN_LEN {
        return None;
    }
    Some(token)
}

/// Unigram and bigram vocabulary of a résumé, used for phrase coverage.
///
/// Bigrams join adjacent surviving words after stopword removal, so
/// "data and analysis" contributes "data analysis".
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    unigrams: HashSet<String>,
    bigrams: HashSet<String>,
}

impl Vocabulary {
    pub fn from_text(text: &NormalizedText) -> Self {
        let kept: Vec<String> = words(text.as_str())
            .into_iter()
            .filter(|w| w.len() >= 2 && !is_stopword(w))
            .map(|w| singularize(&w))
            .collect();

        let bigrams = kept
            .windows(2)
            .filter(|pair| !is_stopword(&pair[0]) && !is_stopword(&pair[1]))
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .collect();

        Vocabulary {
            unigrams: kept.into_iter().collect(),
            bigrams,
        }
    }

    pub fn has_unigram(&self, word: &str) -> bool {
        self.unigrams.contains(word)
    }

    pub fn has_bigram(&self, pair: &str) -> bool {
        self.bigrams.contains(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        TokenSet::from_text(&NormalizedText::from_raw(text)).difference(&TokenSet::default())
    }

    #[test]
    fn test_singularize_rules() {
        assert_eq!(singularize("admissions"), "admission");
        assert_eq!(singularize("studies"), "study");
        assert_eq!(singularize("classes"), "class");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("skills"), "skill");
        assert_eq!(singularize("process"), "process");
        assert_eq!(singularize("pipelines"), "pipeline");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("analysis"), "analysis");
        assert_eq!(singularize("sql"), "sql");
    }

    #[test]
    fn test_stopwords_and_short_tokens_are_dropped() {
        assert_eq!(tokens("The team will work with an SQL database"), vec!["database", "sql"]);
    }

    #[test]
    fn test_digits_and_times_are_dropped() {
        assert!(tokens("9am 9:00pm $50,000 2024 q3 40%").is_empty());
    }

    #[test]
    fn test_calendar_words_are_dropped() {
        assert_eq!(tokens("Monday through Friday, PST"), vec!["through"]);
    }

    #[test]
    fn test_plural_variants_collapse() {
        assert_eq!(tokens("admissions admission Admissions"), vec!["admission"]);
    }

    #[test]
    fn test_compound_terms_keep_interior_symbols() {
        assert_eq!(tokens("node.js and react-native."), vec!["node.js", "react-native"]);
    }

    #[test]
    fn test_stopwords_are_rechecked_after_singularizing() {
        assert!(tokens("teams").is_empty());
        assert_eq!(tokens("teams analysts"), vec!["analyst"]);
    }

    #[test]
    fn test_token_set_is_order_independent() {
        let a = TokenSet::from_text(&NormalizedText::from_raw("python excel tableau"));
        let b = TokenSet::from_text(&NormalizedText::from_raw("tableau, Excel; Python"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_words_keeps_short_symbol_terms() {
        assert_eq!(words("C++, C#, and Node.js."), vec!["c++", "c#", "and", "node.js"]);
    }

    #[test]
    fn test_vocabulary_bigrams_skip_stopwords() {
        let vocab = Vocabulary::from_text(&NormalizedText::from_raw(
            "Built data pipelines and dashboards with Python",
        ));
        assert!(vocab.has_unigram("pipeline"));
        assert!(vocab.has_unigram("python"));
        assert!(vocab.has_bigram("data pipeline"));
        assert!(vocab.has_bigram("pipeline dashboard"));
        assert!(!vocab.has_unigram("with"));
    }
}
