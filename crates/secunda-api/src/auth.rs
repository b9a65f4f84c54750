//! # API Key Middleware
//!
//! Every `/api/v1` route requires the shared secret configured as
//! `API_KEY`. The key travels in the `Authorization` header, either bare
//! or with a `Bearer ` prefix:
//!
//! ```text
//! Authorization: {key}
//! Authorization: Bearer {key}
//! ```
//!
//! When no key is configured, authentication is disabled.

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;

use crate::error::{ErrorBody, ErrorDetail};

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the key.
#[derive(Clone)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of API keys.
///
/// When lengths differ, performs a dummy comparison so the timing does not
/// depend on how much of the key matched.
fn constant_time_key_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Strip an optional `Bearer ` scheme prefix from a header value.
fn presented_key(header_value: &str) -> &str {
    header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value)
        .trim()
}

/// Reject requests whose `Authorization` header does not carry the key.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.api_key.clone());

    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match header_value {
        Some(value) if constant_time_key_eq(presented_key(value), &expected) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "authentication failed: invalid API key");
            unauthorized_response("invalid API key")
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(api_key: Option<String>) -> Router {
        Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig { api_key }))
    }

    async fn status_for(app: Router, authorization: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        response.status()
    }

    #[tokio::test]
    async fn bare_and_bearer_keys_are_accepted() {
        let key = Some("my-secret".to_string());
        assert_eq!(status_for(test_app(key.clone()), Some("my-secret")).await, StatusCode::OK);
        assert_eq!(
            status_for(test_app(key), Some("Bearer my-secret")).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn missing_header_is_rejected_with_error_body() {
        let app = test_app(Some("my-secret".to_string()));
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["error"]["code"], "UNAUTHORIZED");
        assert!(err["error"]["message"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn wrong_key_is_rejected() {
        let key = Some("my-secret".to_string());
        assert_eq!(
            status_for(test_app(key.clone()), Some("Bearer wrong")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(test_app(key), Some("Basic bXk6c2VjcmV0")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn auth_disabled_allows_all_requests() {
        assert_eq!(status_for(test_app(None), None).await, StatusCode::OK);
        assert_eq!(
            status_for(test_app(None), Some("Bearer anything")).await,
            StatusCode::OK
        );
    }

    #[test]
    fn constant_time_eq_rejects_prefix_and_empty() {
        assert!(constant_time_key_eq("secret-key", "secret-key"));
        assert!(!constant_time_key_eq("secret", "secret-key"));
        assert!(!constant_time_key_eq("", "secret-key"));
    }

    #[test]
    fn debug_redacts_key() {
        let config = AuthConfig {
            api_key: Some("hunter2".into()),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
    }
}
