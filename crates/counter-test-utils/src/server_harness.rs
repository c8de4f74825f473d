//! Test server harness for E2E testing
//!
//! Provides `TestCounterServer` for spawning real counter service instances
//! backed by an in-memory room directory.

use counter_service::config::Config;
use counter_service::routes::{self, AppState};
use counter_service::services::room_directory::mock::InMemoryRoomDirectory;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the counter service in E2E tests.
///
/// The server is aborted when the harness is dropped.
pub struct TestCounterServer {
    addr: SocketAddr,
    config: Config,
    directory: Arc<InMemoryRoomDirectory>,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestCounterServer {
    /// Spawn a server with default test configuration.
    ///
    /// The server binds to a random available port on 127.0.0.1.
    pub async fn spawn(directory: Arc<InMemoryRoomDirectory>) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(directory, HashMap::new()).await
    }

    /// Spawn a server with extra configuration variables.
    pub async fn spawn_with_vars(
        directory: Arc<InMemoryRoomDirectory>,
        extra_vars: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("LIVEKIT_API_KEY".to_string(), "test-key".to_string()),
            ("LIVEKIT_API_SECRET".to_string(), "test-secret".to_string()),
        ]);
        vars.extend(extra_vars);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState::new(config.clone(), directory.clone()));

        // Local recorder handle; nothing is installed globally.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

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
            directory,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the server's base URL.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the server's socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the configuration the server was started with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the in-memory room directory backing the server.
    pub fn directory(&self) -> &Arc<InMemoryRoomDirectory> {
        &self.directory
    }

    /// `POST /create-room` and return the parsed JSON body.
    ///
    /// Fails if the response is not 200.
    pub async fn create_room_response(&self) -> Result<serde_json::Value, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/create-room", self.url()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("create-room returned {}: {}", status, response.text().await?);
        }

        Ok(response.json().await?)
    }

    /// `POST /create-room` and return the new room name.
    pub async fn create_room(&self) -> Result<String, anyhow::Error> {
        let body = self.create_room_response().await?;
        body["roomName"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("create-room response has no roomName: {}", body))
    }

    /// `POST /counter-increment` for `room_name` and return the raw response.
    pub async fn increment(&self, room_name: &str) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}/counter-increment", self.url()))
            .json(&serde_json::json!({ "roomName": room_name }))
            .send()
            .await?)
    }
}

impl Drop for TestCounterServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
