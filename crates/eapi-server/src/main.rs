mod config;
mod handlers;
mod router;

use std::sync::Arc;

use clap::Parser;
use eapi_client::{DeviceConfig, DeviceQuery, EapiNode};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::Cli,
    router::{ExporterState, exporter_router},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::from_default_env().add_directive("eapi=info".parse()?);
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let device_config = DeviceConfig::from_env().inspect_err(|err| {
        error!(error = %err, "invalid device configuration");
    })?;
    let node = EapiNode::connect(&device_config)?;
    info!(
        endpoint = node.endpoint(),
        protocol = %device_config.protocol,
        username = %device_config.username,
        tls_verify = device_config.tls_verify,
        "eapi session configured"
    );

    let device: Arc<dyn DeviceQuery> = Arc::new(node);
    let state = Arc::new(ExporterState::new(Arc::clone(&device))?);
    let app = exporter_router(state);

    let addr = cli.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    // A slow device must not hold up the listener.
    tokio::spawn(log_device_identity(device));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn log_device_identity(device: Arc<dyn DeviceQuery>) {
    match device.show_version().await {
        Ok(version) => info!(
            model = %version.model_name,
            version = %version.version,
            serial = %version.serial_number,
            "connected to device"
        ),
        Err(err) => warn!(
            error = %err,
            unreachable = err.is_unreachable(),
            "device not reachable at startup"
        ),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
