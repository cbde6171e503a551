pub mod models;
pub mod modules;
pub mod proxy;

use tracing::{error, info};

use crate::proxy::server::AxumServer;

/// Load configuration, start the gateway and serve until Ctrl-C
pub async fn run() -> Result<(), String> {
    // A missing .env is normal in containers
    let dotenv = dotenvy::dotenv();

    let config = modules::config::load_app_config()?;
    let _log_guard = modules::logger::init_logger(
        config.logging.log_dir.as_deref().map(std::path::Path::new),
    );

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => error!("Failed to read .env: {}", e),
    }

    let (server, handle) = AxumServer::start(&config).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown requested");
    server.stop().await;
    if let Err(e) = handle.await {
        error!("Server task ended abnormally: {}", e);
    }
    Ok(())
}
