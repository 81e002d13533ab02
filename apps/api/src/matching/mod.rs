// Matching engine: normalization, lexical filtering, requirement extraction,
// coverage scoring, and improvement actions. Everything here except the
// generated-actions path is a pure function of its inputs.

pub mod actions;
pub mod ats;
pub mod coverage;
pub mod lexicon;
pub mod normalize;
pub mod prompts;
pub mod requirements;
