// Prompt constants for the Action Generator.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for action suggestions.
pub const ACTIONS_SYSTEM: &str = "You are a practical career coach. \
    You suggest concrete, time-boxed actions that produce an artifact the candidate can show. \
    You never suggest claiming skills the candidate does not have.";

/// Action suggestion prompt template.
/// Replace: {json_only}, {missing_json}, {job_text}
pub const ACTIONS_PROMPT_TEMPLATE: &str = r#"{json_only}

The candidate's resume does not yet show evidence for these job requirements:
{missing_json}

JOB DESCRIPTION:
{job_text}

Return a JSON object with this EXACT schema:
{
  "do_now": ["action 1", "action 2", "action 3"],
  "do_long": ["action 1", "action 2"]
}

HARD RULES:
1. "do_now" has exactly 3 actions that take a few hours each; "do_long" has exactly 2 that take 1-3 weeks
2. Every action produces a concrete artifact (document, sample, checklist, portfolio piece)
3. End each action with a time estimate in parentheses, e.g. "(time ~2h)"
4. Be specific to this job's domain; reference the missing requirements by name where relevant
5. Never tell the candidate to list or claim a skill, tool, or metric they do not already have
6. Each action is a single sentence under 200 characters"#;
