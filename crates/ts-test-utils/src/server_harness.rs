//! Test server harness for E2E testing
//!
//! Provides `TestTokenServer` for spawning real Token Service instances in tests.

use common::secret::SecretString;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use token_service::config::{Config, API_KEY_VAR, API_SECRET_VAR, SERVER_URL_VAR};
use token_service::routes::{self, AppState};

/// API key configured by [`TestTokenServer::spawn_configured`].
pub const TEST_API_KEY: &str = "APItestkey";

/// API secret configured by [`TestTokenServer::spawn_configured`].
pub const TEST_API_SECRET: &str = "test-secret-with-enough-entropy-0123456789";

/// Media-server URL configured by [`TestTokenServer::spawn_configured`].
pub const TEST_SERVER_URL: &str = "wss://media.test.local";

/// Test harness for spawning a Token Service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<(), anyhow::Error> {
///     let server = TestTokenServer::spawn_configured().await?;
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestTokenServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestTokenServer {
    /// Spawn a server with all three media-server secrets set.
    pub async fn spawn_configured() -> Result<Self, anyhow::Error> {
        Self::spawn(&[
            (API_KEY_VAR, TEST_API_KEY),
            (API_SECRET_VAR, TEST_API_SECRET),
            (SERVER_URL_VAR, TEST_SERVER_URL),
        ])
        .await
    }

    /// Spawn a server configured from exactly `vars`.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Serve `/metrics` from a private recorder handle
    /// - Start the HTTP server in the background
    pub async fn spawn(vars: &[(&str, &str)]) -> Result<Self, anyhow::Error> {
        let mut vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string());

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        // A non-installed recorder keeps parallel tests from fighting over
        // the global one.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let state = Arc::new(AppState::new(config.clone()));
        let app = routes::build_routes(state, Some(metrics_handle));

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

    /// The secret tokens from [`spawn_configured`](Self::spawn_configured) are signed with.
    pub fn test_secret() -> SecretString {
        SecretString::from(TEST_API_SECRET)
    }
}

impl Drop for TestTokenServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
