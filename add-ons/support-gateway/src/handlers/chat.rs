//! Chat handler: routes each message through the support agent with the
//! history the widget keeps client-side.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use support_core::ConversationTurn;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) history: Vec<ConversationTurn>,
}

/// POST /api/v1/chat – answers from the knowledge base or the LLM fallback.
pub(crate) async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        target: "support::chat",
        request_id = %request_id,
        chars = req.message.len(),
        history = req.history.len(),
        "Chat request received"
    );

    match state.agent.respond_detailed(&req.message, &req.history).await {
        Ok(reply) => {
            tracing::info!(
                target: "support::chat",
                request_id = %request_id,
                source = ?reply.source,
                score = ?reply.score,
                "Chat reply sent"
            );
            axum::Json(serde_json::json!({
                "status": "ok",
                "request_id": request_id,
                "response": reply.text,
                "source": reply.source,
                "score": reply.score,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::warn!(target: "support::chat", request_id = %request_id, error = %e, "Chat failed");
            (
                StatusCode::BAD_GATEWAY,
                axum::Json(serde_json::json!({
                    "status": "error",
                    "request_id": request_id,
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
