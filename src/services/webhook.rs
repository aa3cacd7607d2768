//! Webhook HTTP server receiving TradingView alerts.
//!
//! Alerts are routed one at a time in arrival order per connection; the
//! router itself keeps no state between them.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::domain::OrderIntent;
use crate::error::{Result, RouterError};
use crate::routing::OrderRouter;

/// Shared state for webhook handlers
pub struct WebhookState {
    pub router: OrderRouter,
    pub started_at: DateTime<Utc>,
}

impl WebhookState {
    pub fn new(router: OrderRouter) -> Self {
        Self {
            router,
            started_at: Utc::now(),
        }
    }
}

/// Body returned for every routed alert
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    exchange: String,
    uptime_seconds: i64,
}

/// Build the webhook router. Exposed for tests.
pub fn create_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/", post(webhook_handler))
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub struct WebhookServer {
    state: Arc<WebhookState>,
    host: String,
    port: u16,
}

impl WebhookServer {
    pub fn new(router: OrderRouter, host: impl Into<String>, port: u16) -> Self {
        Self {
            state: Arc::new(WebhookState::new(router)),
            host: host.into(),
            port,
        }
    }

    /// Serve until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        let app = create_router(Arc::clone(&self.state));

        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                RouterError::Config(config::ConfigError::Message(format!(
                    "invalid listen address {}:{}: {}",
                    self.host, self.port, e
                )))
            })?;
        info!(
            "Webhook server listening on http://{} ({})",
            addr,
            self.state.router.gateway().kind()
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Webhook server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }
}

async fn webhook_handler(State(state): State<Arc<WebhookState>>, body: Bytes) -> impl IntoResponse {
    let intent = match OrderIntent::from_slice(&body) {
        Ok(intent) => intent,
        Err(e) => {
            warn!("Rejected alert: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse {
                    success: false,
                    error: Some(e.to_string()),
                }),
            );
        }
    };

    info!("Received alert: {}", intent);
    let success = match state.router.route(intent).await {
        Ok(outcome) => {
            info!("Route outcome: {:?}", outcome);
            outcome.is_success()
        }
        Err(e) => {
            error!("Failed to route alert: {}", e);
            false
        }
    };

    (
        StatusCode::OK,
        Json(WebhookResponse {
            success,
            error: None,
        }),
    )
}

async fn health_handler(State(state): State<Arc<WebhookState>>) -> impl IntoResponse {
    Json(HealthBody {
        status: "ok",
        exchange: state.router.gateway().kind().to_string(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::PaperGateway;
    use crate::routing::RouterOptions;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with(paper: Arc<PaperGateway>) -> Router {
        let router = OrderRouter::new(paper, RouterOptions::default());
        create_router(Arc::new(WebhookState::new(router)))
    }

    async fn post_json(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn alert() -> Value {
        json!({
            "id": "Long",
            "action": "buy",
            "contracts": 22.222,
            "ticker": "NEARUSD",
            "position": "long",
            "previous_position": "flat",
            "position_size": 22.222,
            "price": 6.96
        })
    }

    #[tokio::test]
    async fn open_alert_places_order() {
        let paper = Arc::new(PaperGateway::new());
        let (status, body) = post_json(app_with(paper.clone()), "/", alert().to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        assert_eq!(paper.position_size("NEAR"), dec!(22.2));
    }

    #[tokio::test]
    async fn webhook_path_is_an_alias() {
        let paper = Arc::new(PaperGateway::new());
        let (status, body) = post_json(app_with(paper), "/webhook", alert().to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let mut payload = alert();
        payload.as_object_mut().unwrap().remove("action");

        let paper = Arc::new(PaperGateway::new());
        let (status, body) = post_json(app_with(paper), "/", payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("action"));
    }

    #[tokio::test]
    async fn garbage_body_is_bad_request() {
        let paper = Arc::new(PaperGateway::new());
        let (status, body) = post_json(app_with(paper), "/", "not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn rejected_order_reports_failure() {
        let mut payload = alert();
        payload["contracts"] = json!(0.01);

        let paper = Arc::new(PaperGateway::new());
        let (status, body) = post_json(app_with(paper), "/", payload.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": false }));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app_with(Arc::new(PaperGateway::new()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["exchange"], "paper");
    }
}
