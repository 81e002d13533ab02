//! ATS formatting flags — layout elements that applicant-tracking parsers tend to drop.

use crate::matching::normalize::NormalizedText;

const ATS_UNFRIENDLY_TERMS: &[&str] = &["table", "image", "header", "footer", "text box"];

/// Returns one `Contains <term>` flag per layout term found in the résumé.
pub fn ats_flags(resume: &NormalizedText) -> Vec<String> {
    let text = resume.as_str().to_lowercase();
    ATS_UNFRIENDLY_TERMS
        .iter()
        .filter(|term| text.contains(*term))
        .map(|term| format!("Contains {term}"))
        .collect()
}
