//! na-bridge-server - standalone bridge between a playback queue and
//! voice-assistant speaker devices via the vendor cloud API.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use na_bridge_core::{http::ReqwestTransport, AppState, VendorClient, VendorConfig};
use tokio::signal;

use crate::config::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("na-bridge-server v{}", env!("CARGO_PKG_VERSION"));

    let core_config = args.to_core_config();
    core_config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    let transport = Arc::new(ReqwestTransport::with_logging(
        core_config.log_outgoing_requests,
    ));
    let vendor_config = VendorConfig {
        base_domain: core_config.amazon_domain.clone(),
        user: core_config.amazon_user.clone(),
        password: core_config.amazon_password.clone(),
        cookie_path: core_config.amazon_cookie_path.clone(),
    };
    let vendor = VendorClient::new(vendor_config, transport);

    let app_state = AppState::builder()
        .vendor(vendor)
        .config(Arc::new(core_config))
        .build();

    log::info!("listening on {}", app_state.config.listen_address);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = na_bridge_core::start_server(app_state).await {
            log::error!("server error: {e}");
        }
    });

    shutdown_signal().await;
    log::info!("shutdown signal received");

    server_handle.abort();
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
