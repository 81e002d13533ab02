// Prompt constants for the Tailoring Orchestrator.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Sentinel markers delimiting the three sections of a rewrite response.
pub const TAILORED_MARKER: &str = "===TAILORED_RESUME===";
pub const COVER_MARKER: &str = "===COVER_LETTER===";
pub const CHANGES_MARKER: &str = "===WHAT_CHANGED===";

/// System prompt for the rewrite call.
pub const TAILOR_SYSTEM: &str = "You are an expert resume editor.\n\
    - REWRITE ONLY WHAT EXISTS in the source resume; do not invent tools, metrics, or achievements.\n\
    - Keep it factual, concise, and ATS-friendly.\n\
    - Use Markdown. No code fences.\n\
    - When listing 'What changed', refer to specific bullets or sections that were modified, added, or removed.";

/// Rewrite prompt template.
/// Replace: {no_fabrication}, {job_text}, {resume_text}, {tailored_marker},
///          {cover_marker}, {changes_marker}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"{no_fabrication}

JOB DESCRIPTION:
{job_text}

RESUME (verbatim source):
{resume_text}

TASKS:
1) Rewrite the resume aligned to the job WITHOUT adding tools, skills, or metrics not in the source.
2) Start the tailored resume with a '**Summary**' header followed by 1-3 lines derived ONLY from the source resume.
3) Draft a short cover letter (at most 180 words) that stays factual to the source resume.
4) Provide a short 'What changed' section (3-6 bullets) describing the edits you made to align the resume.

Return exactly three sections in this order:
{tailored_marker}
...
{cover_marker}
...
{changes_marker}
- bullet 1
- bullet 2
- ..."#;

pub const TAILOR_MAX_TOKENS: u32 = 1600;
pub const TAILOR_TEMPERATURE: f32 = 0.35;
