use core::net::{Ipv4Addr, SocketAddr};
use std::io;

use axum::Router;
use reqwest::Client;
use thiserror::Error;
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{debug, error};

/// An application under test.
///
/// Created fresh for each test and passed by reference to the queries. Dropping it stops the
/// server it spawned, if any.
#[derive(Debug)]
pub struct TestApp {
    base_url: String,
    client: Client,
    server: Option<JoinHandle<()>>,
}

impl TestApp {
    /// Serve a router on a free local port.
    pub async fn spawn(router: Router) -> Result<Self, TestAppError> {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .map_err(TestAppError::Bind)?;
        let address = listener.local_addr().map_err(TestAppError::Bind)?;
        debug!("Test app listening on {address}");

        let server = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router).await {
                error!("Test app stopped: {error}");
            }
        });

        let mut app = Self::connect(format!("http://{address}"))?;
        app.server = Some(server);

        Ok(app)
    }

    /// Use an application that is already running.
    pub fn connect(base_url: impl Into<String>) -> Result<Self, TestAppError> {
        let client = Client::builder().build().map_err(TestAppError::Client)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            server: None,
        })
    }

    #[allow(missing_docs)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The full URL of a path on the app.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            server.abort();
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum TestAppError {
    #[error("Failed to bind test app listener: {0}")]
    Bind(#[source] io::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
