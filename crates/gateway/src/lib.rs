//! HTTP gateway for docchat.
//!
//! Serves the chat-with-pdf endpoint the browser client calls, plus a
//! health check. Built on Axum.

pub mod api;
pub mod service;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub use api::{ApiError, ErrorResponse};
pub use service::{ChatService, ChatSettings};

/// Build the router with all middleware applied.
///
/// Layers, outermost first:
/// - HTTP trace logging
/// - CORS (applies to error responses too)
/// - Request body size limit
pub fn build_router(
    service: Arc<ChatService>,
    server: &docchat_config::ServerConfig,
) -> Router {
    api::routes(service)
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(cors_layer(server))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(server: &docchat_config::ServerConfig) -> CorsLayer {
    let origin = if server.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Start the gateway HTTP server.
///
/// A missing API key is not a startup failure; each chat request reports it.
pub async fn start(config: docchat_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let service = Arc::new(ChatService::from_config(&config));
    if !service.provider().is_configured() {
        warn!("No API key configured; chat requests will fail until DOCCHAT_API_KEY is set");
    }

    let app = build_router(service, &config.server);

    info!(
        addr = %addr,
        model = %config.model,
        gateway = %config.gateway_url,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::MockProvider;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use docchat_core::ProviderError;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(provider: Arc<MockProvider>) -> Router {
        app_with(provider, &docchat_config::ServerConfig::default())
    }

    fn app_with(provider: Arc<MockProvider>, server: &docchat_config::ServerConfig) -> Router {
        let service = Arc::new(ChatService::new(provider, ChatSettings::default()));
        build_router(service, server)
    }

    fn chat(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("origin", "http://localhost:5173")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn question(q: &str) -> serde_json::Value {
        serde_json::json!({
            "question": q,
            "pdfBase64": "data:application/pdf;base64,JVBERi0xLjQ=",
            "conversationHistory": []
        })
    }

    #[tokio::test]
    async fn answers_with_citations() {
        let provider = Arc::new(MockProvider::answering("The capital is Paris [Page 2]."));
        let response = app(provider.clone())
            .oneshot(chat("/chat-with-pdf", question("What is the capital?")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
        assert_eq!(
            json_body(response).await,
            serde_json::json!({
                "answer": "The capital is Paris [Page 2].",
                "citations": [2]
            })
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn edge_function_path_is_mounted() {
        let provider = Arc::new(MockProvider::answering("Nothing cited."));
        let response = app(provider)
            .oneshot(chat("/functions/v1/chat-with-pdf", question("Anything?")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["citations"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_429_without_retry() {
        let provider = Arc::new(MockProvider::failing(ProviderError::RateLimited {
            retry_after_secs: None,
        }));
        let response = app(provider.clone())
            .oneshot(chat("/chat-with-pdf", question("q")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("access-control-allow-origin"));
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"error": "Rate limit exceeded. Please try again later."})
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn payment_required_maps_to_402() {
        let provider = Arc::new(MockProvider::failing(ProviderError::PaymentRequired(
            "out of credits".into(),
        )));
        let response = app(provider)
            .oneshot(chat("/chat-with-pdf", question("q")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            json_body(response).await["error"],
            "Payment required. Please add credits to your workspace."
        );
    }

    #[tokio::test]
    async fn other_upstream_status_maps_to_500() {
        let provider = Arc::new(MockProvider::failing(ProviderError::ApiError {
            status_code: 503,
            message: "overloaded".into(),
        }));
        let response = app(provider)
            .oneshot(chat("/chat-with-pdf", question("q")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "AI Gateway error: 503");
    }

    #[tokio::test]
    async fn missing_credential_is_500_without_upstream_call() {
        let provider = Arc::new(MockProvider::answering("unused").unconfigured());
        let response = app(provider.clone())
            .oneshot(chat("/chat-with-pdf", question("q")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("API key"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn empty_question_is_400() {
        let provider = Arc::new(MockProvider::answering("unused"));
        let response = app(provider.clone())
            .oneshot(chat("/chat-with-pdf", question("   ")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_400_json() {
        let provider = Arc::new(MockProvider::answering("unused"));
        let req = Request::builder()
            .method("POST")
            .uri("/chat-with-pdf")
            .header("content-type", "application/json")
            .body(Body::from("{\"pdfBase64\": 42"))
            .unwrap();
        let response = app(provider.clone()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn page_count_filters_citations() {
        let provider = Arc::new(MockProvider::answering("[Page 2] and [Page 40]"));
        let body = serde_json::json!({
            "question": "q",
            "pdfBase64": "",
            "conversationHistory": [],
            "pageCount": 10
        });
        let response = app(provider)
            .oneshot(chat("/chat-with-pdf", body))
            .await
            .unwrap();

        assert_eq!(json_body(response).await["citations"], serde_json::json!([2]));
    }

    #[tokio::test]
    async fn history_reaches_the_provider() {
        let provider = Arc::new(MockProvider::answering("Yes [Page 1]."));
        let body = serde_json::json!({
            "question": "Really?",
            "pdfBase64": "",
            "conversationHistory": [
                {"role": "user", "content": "Is it short?"},
                {"role": "assistant", "content": "It is [Page 1].", "citations": [1]}
            ]
        });
        app(provider.clone())
            .oneshot(chat("/chat-with-pdf", body))
            .await
            .unwrap();

        let sent = provider.last_request().unwrap();
        let roles: Vec<&str> = sent.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(sent.messages[3].content, "Really?");
    }

    #[tokio::test]
    async fn preflight_returns_empty_body_with_cors_headers() {
        let provider = Arc::new(MockProvider::answering("unused"));
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/chat-with-pdf")
            .header("origin", "https://app.example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "authorization, content-type, apikey")
            .body(Body::empty())
            .unwrap();
        let response = app(provider.clone()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        let allowed = headers["access-control-allow-headers"].to_str().unwrap();
        for name in ["authorization", "x-client-info", "apikey", "content-type"] {
            assert!(allowed.contains(name), "missing {name} in {allowed}");
        }
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn bare_options_is_answered_empty() {
        let provider = Arc::new(MockProvider::answering("unused"));
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/chat-with-pdf")
            .body(Body::empty())
            .unwrap();
        let response = app(provider).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn configured_origins_are_enforced() {
        let server = docchat_config::ServerConfig {
            cors_origins: vec!["https://docs.example.com".into()],
            ..Default::default()
        };
        let provider = Arc::new(MockProvider::answering("ok"));

        let allowed = Request::builder()
            .uri("/health")
            .header("origin", "https://docs.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app_with(provider.clone(), &server)
            .oneshot(allowed)
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://docs.example.com"
        );

        let foreign = Request::builder()
            .uri("/health")
            .header("origin", "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app_with(provider, &server).oneshot(foreign).await.unwrap();
        assert!(!response.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = docchat_config::ServerConfig {
            max_body_bytes: 64,
            ..Default::default()
        };
        let provider = Arc::new(MockProvider::answering("unused"));
        let body = serde_json::json!({
            "question": "q",
            "pdfBase64": "A".repeat(1024),
        });
        let response = app_with(provider.clone(), &server)
            .oneshot(chat("/chat-with-pdf", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let provider = Arc::new(MockProvider::answering("unused"));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app(provider).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
