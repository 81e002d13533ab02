//! How-to coach: relays a short conversation to the generation service and
//! answers with a fixed step plan when the service cannot.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::coach::prompts::{COACH_MAX_TOKENS, COACH_SYSTEM, COACH_TEMPERATURE, FALLBACK_REPLY};
use crate::errors::AppError;
use crate::llm_client::{complete_within, CompletionRequest, Generator, Role, Turn};

/// Only the most recent turns are forwarded.
pub const MAX_HISTORY_TURNS: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct CoachMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoachRequest {
    #[serde(default)]
    pub messages: Vec<CoachMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoachResponse {
    pub reply: String,
    pub source: ReplySource,
}

/// Recent non-blank turns, oldest first.
fn recent_turns(messages: &[CoachMessage]) -> Vec<Turn<'_>> {
    let kept: Vec<Turn<'_>> = messages
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| Turn {
            role: m.role,
            content: m.content.trim(),
        })
        .collect();
    let skip = kept.len().saturating_sub(MAX_HISTORY_TURNS);
    kept.into_iter().skip(skip).collect()
}

pub async fn run_coach(
    generator: &dyn Generator,
    limit: Duration,
    request: &CoachRequest,
) -> Result<CoachResponse, AppError> {
    let turns = recent_turns(&request.messages);
    if turns.is_empty() {
        return Err(AppError::Validation(
            "messages must contain at least one non-empty message".to_string(),
        ));
    }

    let completion = CompletionRequest {
        system: COACH_SYSTEM,
        turns: &turns,
        max_tokens: COACH_MAX_TOKENS,
        temperature: COACH_TEMPERATURE,
    };

    let reason = match complete_within(generator, completion, limit).await {
        Ok(raw) if !raw.trim().is_empty() => {
            info!("Coach reply generated ({} turns)", turns.len());
            return Ok(CoachResponse {
                reply: raw.trim().to_string(),
                source: ReplySource::Generated,
            });
        }
        Ok(_) => "empty reply".to_string(),
        Err(e) => e.to_string(),
    };

    warn!("Coach falling back to the step plan: {reason}");
    Ok(CoachResponse {
        reply: FALLBACK_REPLY.to_string(),
        source: ReplySource::Fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm_client::{DisabledGenerator, LlmError};

    /// Records the turns it was sent and answers with a fixed reply.
    struct RecordingGenerator {
        reply: &'static str,
        seen: Mutex<Vec<(Role, String)>>,
    }

    impl RecordingGenerator {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
            assert_eq!(request.system, COACH_SYSTEM);
            *self.seen.lock().unwrap() = request
                .turns
                .iter()
                .map(|t| (t.role, t.content.to_string()))
                .collect();
            Ok(self.reply.to_string())
        }
    }

    fn message(role: Role, content: &str) -> CoachMessage {
        CoachMessage {
            role,
            content: content.to_string(),
        }
    }

    fn ask(content: &str) -> CoachRequest {
        CoachRequest {
            messages: vec![message(Role::User, content)],
        }
    }

    #[tokio::test]
    async fn test_generated_reply_is_trimmed() {
        let generator = RecordingGenerator::new("  1) Open Excel\n2) Insert a pivot table\n");
        let response = run_coach(&generator, Duration::from_secs(5), &ask("Pivot tables?"))
            .await
            .unwrap();

        assert_eq!(response.source, ReplySource::Generated);
        assert_eq!(response.reply, "1) Open Excel\n2) Insert a pivot table");
    }

    #[tokio::test]
    async fn test_unavailable_service_uses_step_plan() {
        let response = run_coach(&DisabledGenerator, Duration::from_secs(5), &ask("Help"))
            .await
            .unwrap();
        assert_eq!(response.source, ReplySource::Fallback);
        assert_eq!(response.reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_blank_reply_uses_step_plan() {
        let generator = RecordingGenerator::new("   ");
        let response = run_coach(&generator, Duration::from_secs(5), &ask("Help"))
            .await
            .unwrap();
        assert_eq!(response.source, ReplySource::Fallback);
    }

    #[tokio::test]
    async fn test_blank_conversation_is_rejected() {
        let request = CoachRequest {
            messages: vec![message(Role::User, "  "), message(Role::Assistant, "\n")],
        };
        let err = run_coach(&DisabledGenerator, Duration::from_secs(5), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_history_keeps_most_recent_turns() {
        let messages: Vec<CoachMessage> = (0..25)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                message(role, &format!("turn {i}"))
            })
            .collect();
        let generator = RecordingGenerator::new("ok");
        run_coach(&generator, Duration::from_secs(5), &CoachRequest { messages })
            .await
            .unwrap();

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), MAX_HISTORY_TURNS);
        assert_eq!(seen[0], (Role::Assistant, "turn 5".to_string()));
        assert_eq!(seen[MAX_HISTORY_TURNS - 1], (Role::User, "turn 24".to_string()));
    }
}
