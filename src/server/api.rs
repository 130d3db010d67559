//! HTTP API server implementation

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::client::ChatModel;
use crate::core::errors::ClientError;
use crate::core::models::Message;

/// Target language used when a request names none
pub const DEFAULT_TARGET_LANG: &str = "French";

/// Application state
#[derive(Clone)]
pub struct AppState {
    model: Arc<dyn ChatModel>,
}

impl AppState {
    /// Wrap a chat model for the handlers
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: String,
    /// Package name
    pub service: String,
    /// Package version
    pub version: String,
    /// Model requests are sent to
    pub model: String,
}

/// Single-text translation request
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    /// Sentence to translate
    pub text: String,
    /// Target language, French when absent
    pub target_lang: Option<String>,
}

/// Single-text translation response
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    /// Original sentence
    pub text: String,
    /// Generated translation
    pub translation: String,
    /// Model that answered
    pub model: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Body of an error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable diagnostic
    pub message: String,
    /// `invalid_request_error` or `request_failed`
    pub r#type: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, kind: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: ErrorDetail {
                message: message.into(),
                r#type: kind.to_string(),
            },
        }),
    )
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        if err.is_request_failure() {
            api_error(StatusCode::BAD_GATEWAY, "request_failed", err.to_string())
        } else {
            api_error(StatusCode::BAD_REQUEST, "invalid_request_error", err.to_string())
        }
    }
}

/// Health check handler
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.model.model_name().to_string(),
    })
}

/// Translation handler: one text, one upstream request
pub async fn translate(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        api_error(
            StatusCode::BAD_REQUEST,
            "invalid_request_error",
            rejection.body_text(),
        )
    })?;

    if payload.text.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "invalid_request_error",
            "text cannot be empty",
        ));
    }

    let target_lang = payload
        .target_lang
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(DEFAULT_TARGET_LANG);

    let messages = Message::translation_exchange(target_lang, payload.text.clone());

    match state.model.invoke(&messages).await {
        Ok(response) => Ok(Json(TranslateResponse {
            text: payload.text,
            translation: response.content,
            model: response.model,
        })),
        Err(e) => {
            warn!("Translation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/translate", post(translate))
        .with_state(Arc::new(state))
}

/// Run the HTTP server
pub async fn run_server(model: Arc<dyn ChatModel>, host: String, port: u16) -> anyhow::Result<()> {
    let app = router(AppState::new(model));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
