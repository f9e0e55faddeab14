// vispr-server: JSON API over a VISPR workspace

pub mod api;
pub mod config;
pub mod cors;
pub mod error;

use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;
use tracing::{debug, error};

use crate::{
    api::ApiState,
    config::ServerConfig,
    error::{attach_request_id_header, request_id_from_headers_or_generate, ApiError},
};

/// Assemble the full application: API routes, health check, optional static
/// website, CORS and request middleware.
pub fn build_app(state: ApiState, config: &ServerConfig) -> Router {
    let router = Router::new().route("/healthz", get(healthz)).merge(api::router(state));

    let router = match &config.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found_fallback),
    };

    apply_middleware(router.layer(cors::cors_layer(config.cors_origins.as_deref())))
}

fn apply_middleware(router: Router) -> Router {
    router
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(panic_handler))
}

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn not_found_fallback() -> ApiError {
    ApiError::not_found("The requested URL was not found on the server.")
}

async fn panic_handler(request: Request<Body>, next: Next) -> Response {
    match tokio::spawn(async move { next.run(request).await }).await {
        Ok(response) => response,
        Err(join_error) => {
            error!(?join_error, "request handling panicked");
            ApiError::internal().into_response()
        }
    }
}

async fn request_context_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = request_id_from_headers_or_generate(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();

    let mut response = next.run(request).await;
    attach_request_id_header(&mut response, &request_id);

    debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started_at.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use vispr_common::Workspace;

    use super::{apply_middleware, build_app};
    use crate::{api::ApiState, config::ServerConfig};

    fn test_app(config: &ServerConfig) -> Router {
        build_app(ApiState::new(Arc::new(Workspace::default()), false), config)
    }

    fn request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request should build")
    }

    #[tokio::test]
    async fn health_check_has_request_id_header() {
        let response = test_app(&ServerConfig::default())
            .oneshot(request("/healthz"))
            .await
            .expect("healthz request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn incoming_request_id_is_echoed() {
        let response = test_app(&ServerConfig::default())
            .oneshot(
                Request::builder()
                    .uri("/api/workspace")
                    .header("x-request-id", "req-abc")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-abc");
    }

    #[tokio::test]
    async fn unknown_path_without_static_dir_is_json_not_found() {
        let response = test_app(&ServerConfig::default())
            .oneshot(request("/nowhere"))
            .await
            .expect("request should return a response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let parsed: Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(parsed["errorMessage"], "The requested URL was not found on the server.");
    }

    #[tokio::test]
    async fn static_dir_serves_website_files() {
        let site = TempDir::new().expect("tempdir");
        std::fs::write(site.path().join("index.html"), "<h1>VISPR</h1>").expect("write index");
        let config =
            ServerConfig { static_dir: Some(site.path().to_path_buf()), ..ServerConfig::default() };
        let app = test_app(&config);

        let index = app.clone().oneshot(request("/")).await.expect("index request");
        assert_eq!(index.status(), StatusCode::OK);
        let body = to_bytes(index.into_body(), usize::MAX).await.expect("body should read");
        assert_eq!(&body[..], b"<h1>VISPR</h1>");

        let api = app.oneshot(request("/api/workspace")).await.expect("api request");
        assert_eq!(api.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn panic_handler_returns_internal_server_error() {
        async fn panic_route() -> &'static str {
            panic!("test panic");
        }

        let app = apply_middleware(Router::new().route("/panic", get(panic_route)));
        let response =
            app.oneshot(request("/panic")).await.expect("panic request should return a response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let parsed: Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(parsed["errorMessage"], "Internal server error.");
    }
}
