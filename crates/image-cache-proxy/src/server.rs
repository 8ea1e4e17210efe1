//! HTTP server for the image cache
//!
//! Provides /health and /image?url=...&priority=... endpoints.

use crate::types::{HealthResponse, ImageQuery};
use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use image_cache::{ImageCache, ImageCacheError, LoadPriority, ResourceLocator};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: ImageCache,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: ImageCache) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/image", get(get_image))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: uptime_secs(state.started_at, Utc::now()),
        cache: state.cache.stats(),
    })
}

/// Whole seconds between `started_at` and `now`, zero if the clock stepped back
fn uptime_secs(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - started_at).num_seconds().max(0) as u64
}

/// Get an image by its origin URL
async fn get_image(State(state): State<SharedState>, Query(query): Query<ImageQuery>) -> Response {
    let locator = match ResourceLocator::parse(&query.url) {
        Ok(locator) => locator,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let priority = match query.priority.as_deref().map(str::parse::<LoadPriority>) {
        None => LoadPriority::default(),
        Some(Ok(priority)) => priority,
        Some(Err(e)) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.cache.resolve(&locator, priority).await {
        Ok(data) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/octet-stream"),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            Body::from(Bytes::from_owner(data)),
        )
            .into_response(),
        Err(e @ ImageCacheError::Network(_)) => {
            warn!(url = %locator, error = %e, "Failed to resolve image");
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch image from origin")
        }
        Err(e) => {
            warn!(url = %locator, error = %e, "Failed to resolve image");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to resolve image")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::Request;
    use image_cache::{FsDiskStore, ImageData, MemoryStore, RemoteFetcher, Sha256KeyHasher};
    use std::io;
    use std::path::Path;
    use tempfile::tempdir;
    use tower::ServiceExt;

    /// Serves fixed bytes for every URL except those containing "missing"
    struct StaticFetcher;

    #[async_trait]
    impl RemoteFetcher for StaticFetcher {
        async fn fetch(
            &self,
            locator: &ResourceLocator,
            _priority: LoadPriority,
        ) -> image_cache::Result<ImageData> {
            if locator.as_str().contains("missing") {
                return Err(ImageCacheError::Network(Box::new(io::Error::new(
                    io::ErrorKind::NotFound,
                    "404 Not Found",
                ))));
            }
            Ok(ImageData::from(&b"TestImageData"[..]))
        }
    }

    fn create_test_state(cache_dir: &Path) -> SharedState {
        let cache = ImageCache::new(
            Arc::new(Sha256KeyHasher),
            MemoryStore::new(1024 * 1024),
            Arc::new(FsDiskStore::new(cache_dir.to_path_buf())),
            Arc::new(StaticFetcher),
        );
        Arc::new(ServerState::new(cache))
    }

    async fn get(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = tempdir().unwrap();
        let router = create_router(create_test_state(dir.path()));

        let response = get(router, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].as_u64().is_some());
        assert!(json["cache"]["memory_entries"].as_u64().is_some());
    }

    #[tokio::test]
    async fn test_image_endpoint_returns_bytes() {
        let dir = tempdir().unwrap();
        let state = create_test_state(dir.path());
        let router = create_router(state.clone());

        let response = get(
            router,
            "/image?url=https%3A%2F%2Fexample.com%2Fa.png%3Fv%3D2&priority=high",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"TestImageData");
        assert_eq!(state.cache.stats().fetches, 1);
    }

    #[tokio::test]
    async fn test_image_endpoint_invalid_url() {
        let dir = tempdir().unwrap();
        let router = create_router(create_test_state(dir.path()));

        let response = get(router, "/image?url=ftp%3A%2F%2Fexample.com%2Fa.png").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_endpoint_invalid_priority() {
        let dir = tempdir().unwrap();
        let router = create_router(create_test_state(dir.path()));

        let response = get(
            router,
            "/image?url=https%3A%2F%2Fexample.com%2Fa.png&priority=urgent",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_endpoint_origin_failure() {
        let dir = tempdir().unwrap();
        let router = create_router(create_test_state(dir.path()));

        let response = get(router, "/image?url=https%3A%2F%2Fexample.com%2Fmissing.png").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_uptime_never_wraps_when_clock_steps_back() {
        let started_at = Utc::now();

        assert_eq!(
            uptime_secs(started_at, started_at - chrono::Duration::seconds(30)),
            0
        );
        assert_eq!(
            uptime_secs(started_at, started_at + chrono::Duration::seconds(90)),
            90
        );
    }

    #[test]
    fn test_server_state_new() {
        let dir = tempdir().unwrap();
        let state = create_test_state(dir.path());

        // started_at should be close to now
        let diff = (Utc::now() - state.started_at).num_seconds();
        assert!((0..5).contains(&diff));
    }
}
