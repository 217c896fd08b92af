//! Shopping assistant route handlers.
//!
//! The assistant widget is a `<details>` panel in the base layout; each
//! message POSTs over HTMX and appends a question/answer exchange to the
//! panel. Conversation context lives backend-side, keyed by a session id
//! minted here on first use.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
}

// =============================================================================
// Templates
// =============================================================================

/// One question/answer exchange, appended to the chat panel.
#[derive(Template, WebTemplate)]
#[template(path = "partials/chat_exchange.html")]
pub struct ChatExchangeTemplate {
    pub question: String,
    pub answer: String,
}

/// The chat session id, minted on first message and stable for the
/// session's lifetime so the assistant keeps its context.
async fn chat_session_id(session: &Session) -> String {
    if let Ok(Some(id)) = session.get::<String>(session_keys::CHAT_SESSION_ID).await {
        return id;
    }

    let id = Uuid::new_v4().to_string();
    if let Err(e) = session.insert(session_keys::CHAT_SESSION_ID, &id).await {
        tracing::warn!("Failed to store chat session id: {}", e);
    }
    id
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /chat/message - HTMX endpoint relaying a message to the assistant.
#[instrument(skip(state, session, form))]
pub async fn message(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ChatForm>,
) -> Response {
    let question = form.message.trim().to_owned();
    if question.is_empty() {
        return Html("<span class=\"form-error\">Type a message first</span>").into_response();
    }

    let session_id = chat_session_id(&session).await;
    match state.api().chat(&session_id, &question).await {
        Ok(reply) => ChatExchangeTemplate {
            question,
            answer: reply.message,
        }
        .into_response(),
        Err(e) => {
            tracing::error!("Chat request failed: {}", e);
            ChatExchangeTemplate {
                question,
                answer: "Sorry, the assistant is unavailable right now. Please try again in a \
                         moment."
                    .to_owned(),
            }
            .into_response()
        }
    }
}
