//! HTTP surface of the chat service.
//!
//! Endpoints:
//!
//! - `POST /chat-with-pdf`               — Ask a question about a PDF
//! - `POST /functions/v1/chat-with-pdf`  — Same handler, edge-function path
//! - `GET  /health`                      — Liveness

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use docchat_core::{Answerer, ChatReply, ChatRequest, Error, ProviderError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::service::ChatService;

pub type SharedService = Arc<ChatService>;

pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const PAYMENT_REQUIRED_MESSAGE: &str =
    "Payment required. Please add credits to your workspace.";

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed request, rendered as `{ "error": message }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidRequest(message) => Self::new(StatusCode::BAD_REQUEST, message),
            Error::Config { message } => {
                error!(%message, "Chat service is not configured");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            Error::Provider(e) => Self::from(e),
            other => {
                error!(error = %other, "Chat request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::RateLimited { .. } => {
                warn!("Upstream rate limit hit");
                Self::new(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE)
            }
            ProviderError::PaymentRequired(detail) => {
                warn!(%detail, "Upstream requires payment");
                Self::new(StatusCode::PAYMENT_REQUIRED, PAYMENT_REQUIRED_MESSAGE)
            }
            ProviderError::ApiError {
                status_code,
                message,
            } => {
                error!(status_code, %message, "AI gateway error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("AI Gateway error: {status_code}"),
                )
            }
            ProviderError::NotConfigured(message) => {
                error!(%message, "Chat service is not configured");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            other => {
                error!(error = %other, "Upstream call failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        warn!(status = status.as_u16(), reason = %rejection.body_text(), "Rejected request body");
        Self::new(status, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────────

/// Routes for the chat endpoint and health check, without middleware.
///
/// `OPTIONS` never reaches these routes; the CORS layer answers it.
pub fn routes(service: SharedService) -> Router {
    Router::new()
        .route("/chat-with-pdf", post(chat_handler))
        .route("/functions/v1/chat-with-pdf", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(service): State<SharedService>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload?;
    let reply = service.answer(request).await?;
    Ok(Json(reply))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
