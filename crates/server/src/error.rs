// JSON error envelope and request id plumbing.
//
// Every expected failure is answered with `{ "errorMessage": "..." }` and the
// matching status code.

use std::{error::Error, fmt::Write as _};

use axum::{
    http::{header::HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 400 with a literal message; client input errors never carry diagnostics.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    /// 404 with a literal message or the output of [`describe_failure`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error.".to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error_message: self.message })).into_response()
    }
}

/// Render a caught failure for an error body.
///
/// Outside debug mode only the failure's message is returned. In debug mode the
/// message is followed by the chain of underlying causes and the failure's
/// structured debug representation.
pub fn describe_failure(error: &(dyn Error + 'static), debug: bool) -> String {
    let mut rendered = error.to_string();
    if !debug {
        return rendered;
    }

    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(rendered, "\n  caused by: {cause}");
        source = cause.source();
    }
    let _ = write!(rendered, "\n  trace: {error:?}");
    rendered
}

pub fn request_id_from_headers_or_generate(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn attach_request_id_header(response: &mut Response, request_id: &str) {
    if let Ok(header) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::to_bytes,
        http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
        response::IntoResponse,
    };
    use serde_json::Value;
    use vispr_common::LookupError;

    use super::{describe_failure, request_id_from_headers_or_generate, ApiError};

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    async fn read_body(error: ApiError) -> (StatusCode, Option<String>, Value) {
        let response = error.into_response();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("error response body should be readable");
        let parsed: Value =
            serde_json::from_slice(&body).expect("error response body should be valid json");
        (status, content_type, parsed)
    }

    #[tokio::test]
    async fn bad_request_uses_error_message_envelope() {
        let (status, content_type, body) =
            read_body(ApiError::bad_request("No category was specified.")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, serde_json::json!({ "errorMessage": "No category was specified." }));
    }

    #[tokio::test]
    async fn not_found_uses_error_message_envelope() {
        let (status, _, body) = read_body(ApiError::not_found("gone")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errorMessage"], "gone");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let (status, _, body) = read_body(ApiError::internal()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errorMessage"], "Internal server error.");
    }

    #[test]
    fn describe_failure_without_debug_is_message_only() {
        let error = LookupError::UnknownMethod { method: "m".into() };
        assert_eq!(describe_failure(&error, false), "The analysis method \"m\" does not exist.");
    }

    #[test]
    fn describe_failure_in_debug_appends_trace() {
        let error = LookupError::UnknownCategory { method: "m".into(), category: "c".into() };
        let rendered = describe_failure(&error, true);

        assert!(rendered.starts_with(&error.to_string()));
        assert!(rendered.contains("\n  trace: UnknownCategory"));
    }

    #[test]
    fn describe_failure_in_debug_walks_source_chain() {
        let error = Outer { inner: std::io::Error::other("disk unplugged") };

        let terse = describe_failure(&error, false);
        assert_eq!(terse, "outer failure");
        assert!(!terse.contains("disk unplugged"));

        let verbose = describe_failure(&error, true);
        assert!(verbose.contains("\n  caused by: disk unplugged"));
    }

    #[test]
    fn request_id_is_echoed_or_generated() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "req-123".parse().expect("valid header"));
        assert_eq!(request_id_from_headers_or_generate(&headers), "req-123");

        let generated = request_id_from_headers_or_generate(&HeaderMap::new());
        assert_eq!(generated.len(), 36);
    }
}
