//! HTTP API layer (C7/C8): router construction, server startup, and the
//! shared application state both the control plane and the skill webhook
//! read from.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::config::Config;
use crate::queue::Queue;
use crate::skill::Dispatcher;
use crate::vendor::Vendor;

pub mod handlers;
pub mod health;
pub mod middleware;

pub use health::HealthCache;

/// Errors that can occur starting the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to port: {0}")]
    Bind(#[from] std::io::Error),

    #[error("listen address {0:?} did not resolve to a socket address")]
    InvalidAddress(String),
}

/// Shared application state for the API layer: the vendor client, the
/// process-wide queue, and the dispatcher built on top of it.
#[derive(Clone)]
pub struct AppState {
    pub vendor: Arc<dyn Vendor>,
    pub queue: Arc<RwLock<Queue>>,
    pub dispatcher: Arc<Dispatcher>,
    pub config: Arc<Config>,
    pub health_cache: Arc<HealthCache>,
}

/// Builder for constructing an `AppState`.
#[derive(Default)]
pub struct AppStateBuilder {
    vendor: Option<Arc<dyn Vendor>>,
    queue: Option<Arc<RwLock<Queue>>>,
    config: Option<Arc<Config>>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vendor(mut self, vendor: Arc<dyn Vendor>) -> Self {
        self.vendor = Some(vendor);
        self
    }

    pub fn queue(mut self, queue: Arc<RwLock<Queue>>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn config(mut self, config: Arc<Config>) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `AppState`, panicking if required fields are missing.
    pub fn build(self) -> AppState {
        let config = self.config.expect("config is required");
        let queue = self
            .queue
            .unwrap_or_else(|| Arc::new(RwLock::new(Queue::default())));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&queue),
            config.stream_domain.clone(),
        ));
        AppState {
            vendor: self.vendor.expect("vendor is required"),
            queue,
            dispatcher,
            config,
            health_cache: Arc::new(HealthCache::new()),
        }
    }
}

impl AppState {
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }
}

/// `":8080"`-style addresses bind all interfaces, matching the Go net/http
/// convention the configured default (`:8080`) was written against.
fn parse_listen_address(addr: &str) -> Result<SocketAddr, ServerError> {
    let normalized = match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    };
    normalized
        .to_socket_addrs()
        .map_err(|_| ServerError::InvalidAddress(addr.to_string()))?
        .next()
        .ok_or_else(|| ServerError::InvalidAddress(addr.to_string()))
}

/// Starts the HTTP server on the configured listen address.
pub async fn start_server(state: AppState) -> Result<(), ServerError> {
    let addr = parse_listen_address(&state.config.listen_address)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("bridge listening on http://{addr}");
    let app = handlers::create_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
