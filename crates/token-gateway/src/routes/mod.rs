//! HTTP routes for the Token Gateway.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::{AdmissionController, LiveKitSigner, RoomRegistry, TokenIssuer, TokenSigner};
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Viewer issuance (and the signer shared with admission).
    pub issuer: TokenIssuer,

    /// Publisher issuance behind the upstream occupancy check.
    pub admission: AdmissionController,
}

impl AppState {
    /// Wire the issuer and admission controller from `config`, checking
    /// publisher admission against `registry`.
    pub fn new(config: Config, registry: Arc<dyn RoomRegistry>) -> Self {
        let signer = Arc::new(LiveKitSigner::from_config(&config));
        Self::with_signer(config, signer, registry)
    }

    /// Like [`AppState::new`], but signing every token with `signer`.
    pub fn with_signer(
        config: Config,
        signer: Arc<dyn TokenSigner>,
        registry: Arc<dyn RoomRegistry>,
    ) -> Self {
        let issuer = TokenIssuer::new(signer, config.server_url.clone(), config.token_ttl);
        let admission = AdmissionController::new(registry, issuer.clone(), config.upstream_timeout);

        Self {
            config,
            issuer,
            admission,
        }
    }
}

/// Build the application routes.
///
/// - `/api/token`, `/api/publisher-token`, `/api/devices` - JSON API
/// - `/`, `/test` - front-end pages
/// - `/favicon.ico`, `/apple-touch-icon*.png`, `/sw.js`, `/static/*` - assets
/// - `/health` - liveness check
/// - `/metrics` - Prometheus scrape endpoint
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let static_dir = Path::new(&state.config.static_dir);
    let apple_icon = static_dir.join("assets").join("apple-icon-180.png");

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        // JSON API
        .route("/api/token", get(handlers::get_viewer_token))
        .route("/api/publisher-token", get(handlers::get_publisher_token))
        .route("/api/devices", get(handlers::list_devices))
        // Pages
        .route("/", get(handlers::publisher_page))
        .route("/test", get(handlers::viewer_page))
        // Assets
        .route_service("/favicon.ico", ServeFile::new(static_dir.join("favicon.ico")))
        .route_service("/apple-touch-icon.png", ServeFile::new(&apple_icon))
        .route_service("/apple-touch-icon-precomposed.png", ServeFile::new(&apple_icon))
        .route_service("/sw.js", ServeFile::new(static_dir.join("sw.js")))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. CorsLayer
    // 4. http_metrics_middleware - records ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::models::RoomSnapshot;
    use crate::services::room_registry::mock::MockRoomRegistry;
    use crate::services::token_issuer::mock::MockTokenSigner;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn test_config() -> Config {
        let vars = HashMap::from([
            ("LIVEKIT_API_KEY".to_string(), "APIroutestest".to_string()),
            (
                "LIVEKIT_API_SECRET".to_string(),
                "routes-test-secret-0123456789".to_string(),
            ),
            ("DEVICES".to_string(), "Drone-1,Drone-2".to_string()),
            ("STATIC_DIR".to_string(), "/nonexistent/static".to_string()),
            ("TEMPLATES_DIR".to_string(), "/nonexistent/templates".to_string()),
        ]);
        Config::from_vars(&vars).expect("valid test config")
    }

    fn app_with_state(state: AppState) -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_routes(Arc::new(state), handle)
    }

    fn test_app() -> Router {
        app_with_state(AppState::new(test_config(), Arc::new(MockRoomRegistry::empty())))
    }

    async fn send(request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
        send_to(test_app(), request).await
    }

    async fn send_to(
        app: Router,
        request: Request<Body>,
    ) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_health_route() {
        let (status, _, body) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_devices_route_preserves_order() {
        let (status, _, body) = send(get("/api/devices")).await;
        assert_eq!(status, StatusCode::OK);

        let devices: Vec<String> = serde_json::from_str(&body).unwrap();
        assert_eq!(devices, vec!["Drone-1", "Drone-2"]);
    }

    #[tokio::test]
    async fn test_pages_fall_back_when_missing() {
        let (status, _, body) = send(get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Publisher page not found"));

        let (status, _, body) = send(get("/test")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Viewer page not found"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _, _) = send(get("/api/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_static_file_is_404() {
        let (status, _, _) = send(get("/static/app.js")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let request = Request::builder()
            .uri("/api/devices")
            .header(header::ORIGIN, "https://elsewhere.example")
            .body(Body::empty())
            .unwrap();

        let (_, headers, _) = send(request).await;
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_viewer_token_signing_failure_is_500() {
        let signer = Arc::new(MockTokenSigner::failing());
        let state = AppState::with_signer(
            test_config(),
            signer.clone(),
            Arc::new(MockRoomRegistry::empty()),
        );

        let (status, _, body) = send_to(app_with_state(state), get("/api/token?room=Drone-1")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["code"], "TOKEN_SIGNING_FAILED");
        assert_eq!(body["error"]["message"], "Failed to generate token");
        assert!(body.get("token").is_none());
        assert_eq!(signer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_publisher_token_signing_failure_is_500() {
        let registry = Arc::new(MockRoomRegistry::with_rooms(vec![RoomSnapshot::new("Drone-1", 0)]));
        let state = AppState::with_signer(
            test_config(),
            Arc::new(MockTokenSigner::failing()),
            registry.clone(),
        );

        let (status, _, body) =
            send_to(app_with_state(state), get("/api/publisher-token?room=Drone-1")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["code"], "TOKEN_SIGNING_FAILED");
        assert_eq!(registry.call_count(), 1);
    }
}
