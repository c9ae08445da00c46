//! HTTP route handlers - thin plumbing over the story engine.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use story_core::{
    Credentials, SessionConfig, SessionError, SessionRegistry, StorySession, TurnInput, GREETING,
};
use tracing::{error, info};

use crate::config::Config;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub config: Config,
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/session/new", post(new_session))
        .route("/api/chat", post(chat))
        .route("/api/session/reset", post(reset_session))
        .route("/health", get(health))
        .with_state(state)
}

// ============================================================================
// Request / response shapes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    pub anthropic_api_key: Option<String>,
    #[serde(rename = "openAIApiKey")]
    pub openai_api_key: Option<String>,
    pub eleven_labs_api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: Option<String>,
    pub audio_base64: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub is_done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_comic: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub session_id: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn new_session(
    State(state): State<AppState>,
    body: Option<Json<NewSessionRequest>>,
) -> Result<Json<NewSessionResponse>, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let credentials = Credentials::resolve(
        request.anthropic_api_key,
        request.openai_api_key,
        request.eleven_labs_api_key,
    )
    .map_err(|e| match e {
        SessionError::NoApiKey(var) => {
            ApiError::BadRequest(format!("{var} must be provided or set in the environment"))
        }
        other => ApiError::Internal(other.to_string()),
    })?;

    let config = SessionConfig::new()
        .with_max_turns(state.config.max_turns)
        .with_output_dir(state.config.output_dir.clone());

    let session = StorySession::new(config, credentials);
    let session_id = state.registry.insert(session).await;
    info!(session = %session_id, "session created");

    Ok(Json(NewSessionResponse {
        session_id,
        message: GREETING.to_string(),
    }))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = request
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("sessionId is required".to_string()))?;

    let input = parse_turn_input(request.message, request.audio_base64)?;

    let handle = state.registry.get(&session_id).await.ok_or_else(|| {
        ApiError::NotFound("Session not found. Create a new session.".to_string())
    })?;

    // The per-session lock serializes concurrent submissions for one session.
    let mut session = handle.lock().await;
    let outcome = session.submit(input).await.map_err(|e| {
        error!(session = %session_id, error = %e, "turn failed");
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(ChatResponse {
        response: outcome.reply_text,
        audio_base64: outcome.reply_audio.map(|bytes| BASE64.encode(bytes)),
        image_url: outcome.image_ref,
        theme: outcome.theme,
        is_done: outcome.is_done,
        final_comic: outcome.final_artifact,
    }))
}

async fn reset_session(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session_id = request
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("sessionId is required".to_string()))?;

    let handle = state.registry.get(&session_id).await.ok_or_else(|| {
        ApiError::NotFound("Session not found. Create a new session.".to_string())
    })?;

    handle.lock().await.reset();
    info!(session = %session_id, "session reset");

    Ok(Json(json!({ "message": "Session reset successfully" })))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Validate the text/audio pair: exactly one must be present.
fn parse_turn_input(
    message: Option<String>,
    audio_base64: Option<String>,
) -> Result<TurnInput, ApiError> {
    match (message, audio_base64) {
        (Some(text), None) if !text.is_empty() => Ok(TurnInput::Text(text)),
        (None, Some(audio)) if !audio.is_empty() => {
            let bytes = BASE64.decode(audio).map_err(|_| {
                ApiError::BadRequest("audioBase64 is not valid base64".to_string())
            })?;
            Ok(TurnInput::Audio(bytes))
        }
        _ => Err(ApiError::BadRequest(
            "exactly one of message or audioBase64 is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use tracing::Level;

    fn test_state() -> AppState {
        AppState {
            registry: Arc::new(SessionRegistry::new()),
            config: Config {
                bind_address: "127.0.0.1:0".parse().unwrap(),
                max_turns: 5,
                output_dir: "output".into(),
                log_level: Level::INFO,
            },
        }
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_parse_turn_input_text() {
        let input = parse_turn_input(Some("a dragon".to_string()), None).unwrap();
        assert!(matches!(input, TurnInput::Text(t) if t == "a dragon"));
    }

    #[test]
    fn test_parse_turn_input_audio() {
        let encoded = BASE64.encode([1u8, 2, 3]);
        let input = parse_turn_input(None, Some(encoded)).unwrap();
        assert!(matches!(input, TurnInput::Audio(bytes) if bytes == vec![1, 2, 3]));
    }

    #[test]
    fn test_parse_turn_input_rejects_both_and_neither() {
        assert!(parse_turn_input(None, None).is_err());
        assert!(
            parse_turn_input(Some("text".to_string()), Some("YWJj".to_string())).is_err()
        );
    }

    #[test]
    fn test_parse_turn_input_rejects_bad_base64() {
        let result = parse_turn_input(None, Some("not base64!!!".to_string()));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_chat_unknown_session_is_not_found() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(
                "/api/chat",
                json!({ "sessionId": "missing", "message": "hello" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chat_missing_session_id_is_bad_request() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request("/api/chat", json!({ "message": "hello" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reset_unknown_session_is_not_found() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(
                "/api/session/reset",
                json!({ "sessionId": "missing" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_chat_response_omits_empty_fields() {
        let response = ChatResponse {
            response: "ready".to_string(),
            audio_base64: None,
            image_url: None,
            theme: None,
            is_done: true,
            final_comic: Some("output/comic-1.html".to_string()),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("audioBase64").is_none());
        assert!(json.get("imageUrl").is_none());
        assert_eq!(json["isDone"], true);
        assert_eq!(json["finalComic"], "output/comic-1.html");
    }
}
