use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use shared::config::Config;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build and configure the application router
pub fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // SSE Events endpoint
        .route("/events", get(handlers::stream_events))
        // Recognition
        .route("/recognize", post(handlers::recognize_vehicle))
        // Admin routes
        .route("/cache", delete(handlers::clear_cache))
        .route("/admin/preload", post(handlers::preload_model))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_image_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use serde_json::Value;
    use shared::RemoteError;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage_engine::{StoreConfig, TieredResultStore};
    use tower::util::ServiceExt;
    use vision::adapters::PlaceholderLocalRecognizer;
    use vision::ports::RemoteRecognizer;
    use vision::{RecognitionService, RecognitionSettings};

    const CAMRY: &str = r#"{"make":"Toyota","model":"Camry","year":"2018-2020","type":"sedan","damage":"moderate","confidence":87}"#;

    #[derive(Default)]
    struct FixedRemote {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteRecognizer for FixedRemote {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn recognize(&self, _jpeg: &[u8]) -> Result<String, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CAMRY.to_string())
        }
    }

    fn png() -> Vec<u8> {
        let image = RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8 * 40, y as u8 * 40, 90]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn test_config() -> Config {
        Config::from_lookup(|_| None)
    }

    async fn setup_app(
        dir: &std::path::Path,
        remote: Option<Arc<dyn RemoteRecognizer>>,
        config: &Config,
    ) -> Router {
        let store = Arc::new(TieredResultStore::open(StoreConfig::new(dir)).await);
        let service = RecognitionService::new(
            store,
            remote,
            Arc::new(PlaceholderLocalRecognizer),
            RecognitionSettings::default(),
        );
        build_router(AppState::new(service), config)
    }

    fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())
            .unwrap()
    }

    async fn extract_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_remote_mode() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = setup_app(temp_dir.path(), None, &test_config()).await;

        let response = app.oneshot(request("GET", "/health", Body::empty())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response).await;
        assert_eq!(body["message"], "OK");
        assert_eq!(body["remote_enabled"], false);
    }

    #[tokio::test]
    async fn test_recognize_without_remote_serves_local() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = setup_app(temp_dir.path(), None, &test_config()).await;

        let response = app.oneshot(request("POST", "/recognize", png())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response).await;
        assert_eq!(body["served_from"], "local");
        assert_eq!(body["result"]["make"], "Unknown");
        assert_eq!(body["result"]["source"], "local");
        assert_eq!(body["fingerprint"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_recognize_caches_remote_answer() {
        let temp_dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FixedRemote::default());
        let app = setup_app(
            temp_dir.path(),
            Some(remote.clone() as Arc<dyn RemoteRecognizer>),
            &test_config(),
        )
        .await;

        let first = app
            .clone()
            .oneshot(request("POST", "/recognize", png()))
            .await
            .unwrap();
        let first = extract_json(first).await;
        let second = app.oneshot(request("POST", "/recognize", png())).await.unwrap();
        let second = extract_json(second).await;

        assert_eq!(first["served_from"], "remote");
        assert_eq!(first["result"]["make"], "Toyota");
        assert_eq!(first["result"]["damage"], "moderate");
        assert_eq!(second["served_from"], "cache");
        assert_eq!(second["result"], first["result"]);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_image_body_is_unprocessable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = setup_app(temp_dir.path(), None, &test_config()).await;

        let response = app
            .oneshot(request("POST", "/recognize", "definitely not a jpeg"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = extract_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_empty_body_is_bad_request() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = setup_app(temp_dir.path(), None, &test_config()).await;

        let response = app
            .oneshot(request("POST", "/recognize", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.max_image_bytes = 16;
        let app = setup_app(temp_dir.path(), None, &config).await;

        let response = app.oneshot(request("POST", "/recognize", png())).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_remote_again() {
        let temp_dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FixedRemote::default());
        let app = setup_app(
            temp_dir.path(),
            Some(remote.clone() as Arc<dyn RemoteRecognizer>),
            &test_config(),
        )
        .await;

        app.clone()
            .oneshot(request("POST", "/recognize", png()))
            .await
            .unwrap();
        let cleared = app
            .clone()
            .oneshot(request("DELETE", "/cache", Body::empty()))
            .await
            .unwrap();
        let after = app.oneshot(request("POST", "/recognize", png())).await.unwrap();

        assert_eq!(cleared.status(), StatusCode::NO_CONTENT);
        assert_eq!(extract_json(after).await["served_from"], "remote");
        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_preload_is_accepted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = setup_app(temp_dir.path(), None, &test_config()).await;

        let response = app
            .oneshot(request("POST", "/admin/preload", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(extract_json(response).await["accepted"], false);
    }

    #[test]
    fn test_cors_layer_accepts_explicit_origins() {
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
        let _ = cors_layer(&["*".to_string()]);
    }
}
