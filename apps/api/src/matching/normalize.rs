//! Normalizer — canonicalizes pasted résumé and job text before any tokenization.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid script/style regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static INLINE_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+").expect("valid inline space regex"));

static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n+").expect("valid blank run regex"));

/// Text that has been through [`NormalizedText::from_raw`]. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedText(String);

impl NormalizedText {
    /// Strips invisible characters, applies NFKC, maps non-breaking spaces to
    /// plain spaces and trims. Never fails; empty input yields empty output.
    pub fn from_raw(raw: &str) -> Self {
        let visible: String = raw.chars().filter(|c| !is_invisible(*c)).collect();
        let canonical: String = visible
            .nfkc()
            .map(|c| if c == '\u{00A0}' { ' ' } else { c })
            .collect();
        NormalizedText(canonical.trim().to_string())
    }

    /// Like [`NormalizedText::from_raw`], but first removes pasted HTML:
    /// script and style blocks go entirely, other tags become spaces, and
    /// whitespace runs collapse.
    pub fn from_markup(raw: &str) -> Self {
        let text = SCRIPT_STYLE_RE.replace_all(raw, " ");
        let text = TAG_RE.replace_all(&text, " ");
        let text = INLINE_SPACE_RE.replace_all(&text, " ");
        let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
        Self::from_raw(&text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Zero-width characters, BOM, soft hyphen and C0/C1 controls other than line
/// structure (`\n`, `\r`, `\t`).
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    ) || (c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
}
