//! # CORS
//!
//! Builds the `tower_http` CORS layer from the configured origin list.
//! Any method and any request header are allowed.

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Build the CORS layer. An empty origin list allows any origin.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(origins: &[String]) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(layer(origins))
    }

    async fn allow_origin_for(origins: &[String], origin: &str) -> Option<String> {
        let request = Request::builder()
            .uri("/ping")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        let response = app(origins).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn empty_list_allows_any_origin() {
        let allowed = allow_origin_for(&[], "https://anywhere.example").await;
        assert_eq!(allowed.as_deref(), Some("*"));
    }

    #[tokio::test]
    async fn listed_origins_are_echoed_and_others_are_not() {
        let origins = vec!["https://app.example".to_string()];
        let allowed = allow_origin_for(&origins, "https://app.example").await;
        assert_eq!(allowed.as_deref(), Some("https://app.example"));
        assert_eq!(allow_origin_for(&origins, "https://evil.example").await, None);
    }
}
