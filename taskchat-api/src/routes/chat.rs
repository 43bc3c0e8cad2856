/// Chat endpoint
///
/// ```text
/// POST {prefix}/chat
/// Content-Type: application/json
///
/// { "message": "What's on my list?", "thread_id": "uuid (optional)" }
/// ```
///
/// ```json
/// {
///   "thread_id": "uuid",
///   "user_message": { ... },
///   "assistant_message": { ... }
/// }
/// ```
///
/// Without a `thread_id` a new thread is created, titled with the start of
/// the message. The user message is stored before the model is called, so it
/// survives a provider failure or a blank reply (502). With no API key
/// configured the endpoint answers 503 and stores nothing.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
    routes::threads::load_owned_thread,
};
use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use taskchat_shared::{
    auth::middleware::AuthContext,
    constants::{CHAT_HISTORY_LIMIT, THREAD_TITLE_MAX_CHARS},
    llm::{ChatMessage, ChatRequest, LlmError},
    models::{
        message::{CreateMessage, Message, MessageRead, MessageRole},
        thread::{CreateThread, Thread},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ChatRequestBody {
    #[validate(length(min = 1, message = "Message must not be empty"))]
    pub message: String,

    /// Existing thread to continue; a new one is created when absent
    pub thread_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub thread_id: Uuid,
    pub user_message: MessageRead,
    pub assistant_message: MessageRead,
}

/// First `THREAD_TITLE_MAX_CHARS` characters of the message, trimmed
pub fn thread_title(message: &str) -> String {
    message
        .trim()
        .chars()
        .take(THREAD_TITLE_MAX_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChatRequestBody>,
) -> ApiResult<Json<ChatResponse>> {
    req.validate()?;

    if !state.chat_model.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "Chat model is not configured".to_string(),
        ));
    }

    let thread = match req.thread_id {
        Some(id) => load_owned_thread(&state, id, &auth).await?,
        None => {
            Thread::create(
                &state.db,
                auth.user_id,
                CreateThread {
                    title: Some(thread_title(&req.message)),
                },
            )
            .await?
        }
    };

    let user_message = Message::create(
        &state.db,
        thread.id,
        CreateMessage {
            role: MessageRole::User,
            content: req.message,
        },
    )
    .await?;

    let history = Message::recent_for_thread(&state.db, thread.id, CHAT_HISTORY_LIMIT).await?;
    let request = ChatRequest {
        messages: history
            .into_iter()
            .map(|m| ChatMessage::new(m.role.as_str(), m.content))
            .collect(),
    };

    let reply = state
        .chat_model
        .complete(request)
        .await
        .and_then(|reply| {
            if reply.content.trim().is_empty() {
                Err(LlmError::EmptyResponse)
            } else {
                Ok(reply)
            }
        })
        .map_err(|e| {
            tracing::warn!(thread_id = %thread.id, error = %e, "Chat completion failed");
            ApiError::from(e)
        })?;

    let assistant_message = Message::create(
        &state.db,
        thread.id,
        CreateMessage {
            role: MessageRole::Assistant,
            content: reply.content,
        },
    )
    .await?;

    tracing::info!(
        thread_id = %thread.id,
        user_id = %auth.user_id,
        model = %reply.model,
        "Chat reply stored"
    );

    Ok(Json(ChatResponse {
        thread_id: thread.id,
        user_message: user_message.into(),
        assistant_message: assistant_message.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_title_truncates_by_characters() {
        assert_eq!(thread_title("  Buy milk  "), "Buy milk");

        let long = "é".repeat(80);
        assert_eq!(thread_title(&long).chars().count(), THREAD_TITLE_MAX_CHARS);
    }
}
