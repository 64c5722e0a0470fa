//! Test server wrapper that starts the accounts service on a random port

use std::net::SocketAddr;

use commander_client::RestClient;
use commander_config::Config;
use commander_core::ErrorCodeRegistry;
use commander_server::Server;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::accounts;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start the accounts service with the given configuration
    ///
    /// `upstream` is the base URL the service calls for order lookups.
    /// Binds to port 0 for automatic port assignment.
    pub async fn start(config: Config, upstream: Url) -> anyhow::Result<Self> {
        let registry = ErrorCodeRegistry::new(accounts::ERROR_CODES)?;
        let state = accounts::AccountsState::new(RestClient::from_config(&config.client)?, upstream);
        let server = Server::new(&config, registry, accounts::router(state))?;

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self { addr, shutdown, client })
    }

    /// Start with an upstream that is never called
    pub async fn start_local(config: Config) -> anyhow::Result<Self> {
        Self::start(config, Url::parse("http://127.0.0.1:9")?).await
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Read a JSON envelope, checking the declared length against the body
pub async fn envelope(response: reqwest::Response) -> (u16, serde_json::Value) {
    let status = response.status().as_u16();
    let declared = response.content_length();
    let bytes = response.bytes().await.unwrap();

    assert_eq!(declared, Some(bytes.len() as u64), "Content-Length must match the body");
    (status, serde_json::from_slice(&bytes).unwrap())
}
