// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// No-fabrication contract shared by every prompt that touches résumé content.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Rewrite ONLY what exists in the source resume. \
    Do NOT introduce tools, skills, metrics, percentages, or achievements that are absent from the source. \
    If the source does not support a claim, omit it entirely.";

/// Fills `{name}` placeholders in a single pass. Substituted values are never
/// rescanned, so user text containing `{...}` is copied through verbatim.
/// Braces that do not name a known placeholder are kept as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let extra: usize = vars.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = vars.iter().find(|(key, _)| {
            tail.strip_prefix(key)
                .map_or(false, |after| after.starts_with('}'))
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_known_placeholders() {
        let out = render("Hi {name}, see {place}.", &[("name", "Ana"), ("place", "docs")]);
        assert_eq!(out, "Hi Ana, see docs.");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let out = render(
            "JOB: {job_text}\nRESUME: {resume_text}",
            &[("job_text", "notes {resume_text}"), ("resume_text", "secret")],
        );
        assert_eq!(out, "JOB: notes {resume_text}\nRESUME: secret");
    }

    #[test]
    fn test_render_keeps_literal_braces() {
        let out = render("{\n  \"do_now\": []\n} {missing_json}", &[("missing_json", "[]")]);
        assert_eq!(out, "{\n  \"do_now\": []\n} []");
    }
}
