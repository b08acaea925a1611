//! Test server harness for E2E testing
//!
//! Provides `TestGatewayServer` for spawning real gateway instances in tests.

use crate::token_helpers::{TEST_API_KEY, TEST_API_SECRET};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use token_gateway::config::Config;
use token_gateway::observability::metrics::init_metrics_recorder;
use token_gateway::routes::{self, AppState};
use token_gateway::services::RoomRegistry;
use tokio::task::JoinHandle;

/// Server URL the harness hands out in token responses.
pub const TEST_SERVER_URL: &str = "wss://livekit.test.invalid";

/// Device list the harness configures.
pub const TEST_DEVICES: &str = "Drone-RTC-01,Drone-RTC-02";

/// Test harness for spawning the Token Gateway in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let registry = Arc::new(MockRoomRegistry::with_rooms(vec![RoomSnapshot::new("Drone-RTC-01", 0)]));
/// let server = TestGatewayServer::spawn(registry).await?;
///
/// let response = reqwest::get(format!("{}/api/publisher-token", server.url())).await?;
/// assert_eq!(response.status(), 200);
/// ```
pub struct TestGatewayServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestGatewayServer {
    /// Spawn a server whose admission checks go to `registry`.
    ///
    /// The server binds to 127.0.0.1 on a random port and uses the harness
    /// key pair, server URL and device list.
    pub async fn spawn(registry: Arc<dyn RoomRegistry>) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(registry, &[]).await
    }

    /// Like [`spawn`](Self::spawn) with extra or overriding env-style variables.
    pub async fn spawn_with_vars(
        registry: Arc<dyn RoomRegistry>,
        overrides: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("LIVEKIT_API_KEY".to_string(), TEST_API_KEY.to_string()),
            ("LIVEKIT_API_SECRET".to_string(), TEST_API_SECRET.to_string()),
            ("LIVEKIT_SERVER_URL".to_string(), TEST_SERVER_URL.to_string()),
            ("DEVICES".to_string(), TEST_DEVICES.to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("STATIC_DIR".to_string(), "/nonexistent/tg-static".to_string()),
            ("TEMPLATES_DIR".to_string(), "/nonexistent/tg-templates".to_string()),
        ]);
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState::new(config.clone(), registry));

        // The global recorder can only be installed once per process; later
        // servers get a standalone recorder.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => PrometheusBuilder::new().build_recorder().handle(),
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestGatewayServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
