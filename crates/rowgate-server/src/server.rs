use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use rowgate_sheets::{SheetStore, SheetsError};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    backend, config::AppConfig, gateway::RowGateway, handlers, middleware as app_middleware,
};

/// Shared handler state. Cloned per request; the store itself is shared.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: RowGateway,
}

pub struct RowGateServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig, store: Arc<dyn SheetStore>) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let state = AppState {
        gateway: RowGateway::new(store, cfg.sheets.default_sheet.clone()),
    };

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Row operations
        .route("/submit", post(handlers::submit))
        .route("/submit/{sheet_name}", post(handlers::submit_to_sheet))
        .route("/data", get(handlers::read_default))
        .route("/data/{sheet_name}", get(handlers::read_sheet))
        .route("/update", post(handlers::update_default))
        .route("/update/{sheet_name}", post(handlers::update_sheet))
        .with_state(state)
        // Middleware stack (outermost last: request id -> cors -> trace -> body limit)
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    store: Option<Arc<dyn SheetStore>>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            store: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses `store` instead of building one from the `sheets` config.
    pub fn with_store(mut self, store: Arc<dyn SheetStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<RowGateServer, SheetsError> {
        let store = match self.store {
            Some(store) => store,
            None => backend::init_store(&self.config.sheets)?,
        };
        let app = build_app(&self.config, store);

        Ok(RowGateServer {
            addr: self.addr,
            app,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RowGateServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use rowgate_sheets::InMemorySheetStore;
    use serde_json::Value;
    use tower::ServiceExt;

    fn small_body_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.server.body_limit_bytes = 64;
        cfg
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_error_envelope() {
        let app = build_app(&small_body_config(), Arc::new(InMemorySheetStore::new()));
        let name = "x".repeat(200);
        let req = Request::post("/submit")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"name":"{name}","email":"a@b.c"}}"#)))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_app(&AppConfig::default(), Arc::new(InMemorySheetStore::new()));
        let res = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let app = build_app(&AppConfig::default(), Arc::new(InMemorySheetStore::new()));
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/submit")
            .header("origin", "https://forms.example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert!(res.status().is_success());
        assert!(res.headers().contains_key("access-control-allow-origin"));
    }
}
