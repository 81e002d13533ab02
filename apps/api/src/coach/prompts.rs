// Prompts for the how-to coach.

pub const COACH_SYSTEM: &str =
    "You are a practical, concise how-to coach. Respond with focused, step-by-step instructions.";

pub const COACH_MAX_TOKENS: u32 = 700;
pub const COACH_TEMPERATURE: f32 = 0.2;

/// Sent when the generation service cannot answer.
pub const FALLBACK_REPLY: &str =
    "Here's a short, concrete plan:\n1) Define the goal\n2) Gather tools\n3) Execute\n4) Review";
