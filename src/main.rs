//! lan-drop server binary.
//!
//! Receives browser form uploads into a flat uploads directory and exposes a
//! share directory for browsing and download over plain HTTP. The main entry
//! point prepares both directories, builds the Axum router and serves it until
//! interrupted.

mod config;
mod error;
mod files;
mod frontend;
mod http;
mod listing;
mod logging;
mod router;
mod storage;
mod upload;

use axum_server::Handle;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use crate::config::{Args, BROWSE_PREFIX, SHUTDOWN_GRACE_SECS, UPLOAD_PATH};
use crate::storage::Storage;
use crate::upload::UploadConfig;

/// Starts the server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let upload_config = Arc::new(UploadConfig::open(args.upload_dir()?).await?);
    let storage = Arc::new(Storage::open(args.share_dir()?).await?);
    info!(path = ?upload_config.dir, "uploaded files are saved here");
    info!(path = ?storage.root_path(), "shared files are served from here");

    let host = args
        .bind
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);
    let app = router::build_router(storage, upload_config);
    let handle = Handle::new();

    let display_addr = SocketAddr::new(http::display_host(host), args.port);
    info!("Starting HTTP server at http://{}", display_addr);
    info!("Upload from your phone: http://{}{}", display_addr, UPLOAD_PATH);
    info!("Browse shared files: http://{}{}/", display_addr, BROWSE_PREFIX);

    // the serve future must outlive the signal so in-flight requests drain
    tokio::spawn(shutdown_signal(handle.clone()));
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal, shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
}
