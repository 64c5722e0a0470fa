#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! HTTP boundary for Commander services
//!
//! Request failures are classified into [`ApiError`] and written as JSON
//! envelopes by a single exception handler middleware.

pub mod error;
pub mod extract;
pub mod handler;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Extension, Router};
use commander_config::Config;
use commander_core::{ErrorCodeRegistry, ResponseCodes};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, BindError, FieldError, Failure};
pub use extract::{BodyLimit, JsonBody, Params, PathParam, ValidJson};
pub use handler::ExceptionHandler;

/// Assembled server with feature routes and the failure boundary
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server around `routes`
    ///
    /// Handlers can extract the configured [`ResponseCodes`] and the shared
    /// [`ErrorCodeRegistry`] through [`Extension`].
    pub fn new(config: &Config, registry: ErrorCodeRegistry, routes: Router) -> anyhow::Result<Self> {
        config.validate()?;

        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));
        let codes = ResponseCodes::new(config.response.prefix_code.clone());
        let registry = Arc::new(registry);

        tracing::info!(codes = registry.len(), prefix = codes.prefix(), "error codes registered");

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.merge(routes).fallback(handler::not_found);

        // Apply middleware layers (innermost first)
        app = app
            .layer(Extension(codes.clone()))
            .layer(Extension(Arc::clone(&registry)))
            .layer(Extension(BodyLimit(config.server.body_limit)))
            .layer(CatchPanicLayer::custom(handler::panic_response))
            .layer(axum::middleware::map_response_with_state(
                ExceptionHandler::new(codes, registry),
                handler::handle_failures,
            ))
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::routing::{get, post};
    use commander_core::error_code::{FORBIDDEN, NOT_FOUND};
    use commander_core::{BusinessError, Response};
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn forbidden() -> Result<&'static str, ApiError> {
        Err(BusinessError::new(FORBIDDEN).into())
    }

    async fn echo(Extension(codes): Extension<ResponseCodes>, JsonBody(value): JsonBody<serde_json::Value>) -> axum::Json<Response<serde_json::Value>> {
        axum::Json(Response::succeeded(&codes, value))
    }

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    fn router() -> Router {
        let mut config = Config::default();
        config.response.prefix_code = "TST-".to_owned();

        let routes = Router::new()
            .route("/forbidden", get(forbidden))
            .route("/echo", post(echo))
            .route("/explode", get(explode));

        Server::new(&config, ErrorCodeRegistry::builtin().unwrap(), routes)
            .unwrap()
            .into_router()
    }

    async fn call(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = router().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn handler_failure_uses_configured_prefix() {
        let (status, body) = call(get_request("/forbidden")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["meta"]["code"], "TST-4002");
    }

    #[tokio::test]
    async fn success_envelope_uses_configured_prefix() {
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"a":1}"#))
            .unwrap();

        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "data": { "a": 1 }, "meta": { "code": "TST-200" } }));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, body) = call(get_request("/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["meta"]["code"], format!("TST-{}", NOT_FOUND.code()));
    }

    #[tokio::test]
    async fn panic_is_internal_error() {
        let (status, body) = call(get_request("/explode")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["meta"]["code"], "TST-5000");
    }

    #[tokio::test]
    async fn wrong_method_is_enveloped() {
        let request = Request::builder().method("POST").uri("/health").body(Body::empty()).unwrap();
        let response = router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "application/json");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["meta"]["code"], "TST-5000");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.response.prefix_code = String::new();

        assert!(Server::new(&config, ErrorCodeRegistry::builtin().unwrap(), Router::new()).is_err());
    }
}
