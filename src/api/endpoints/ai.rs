//! AI assistant endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::assistant::{self, ChatInput, ChatOutput};

/// `POST /ai/chat`. Upstream failures come back in the `error` field
/// with a 200 status.
pub async fn chat(
    State(ctx): State<ApiContext>,
    Json(input): Json<ChatInput>,
) -> Result<Json<ChatOutput>, ApiError> {
    let core = ctx.core.clone();
    let output = tokio::task::spawn_blocking(move || {
        let client = core.chat_client();
        assistant::chat(client.as_deref(), &core.config.ai.chat_model, &input)
    })
    .await?;

    if let Some(error) = &output.error {
        tracing::info!(error = %error, "Assistant turn returned an error");
    }
    Ok(Json(output))
}
