use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use tokio::net::TcpListener;

use flatwiki::logger::Logger;
use flatwiki::{build_app, router, Config, WikiError};

#[tokio::main]
async fn main() -> Result<(), WikiError> {
    if let Err(e) = Logger::init() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let config = Config::parse();
    let addr = config.socket_addr()?;
    info!("DEBUG  = {}", config.debug);
    info!("DATA   = {}", config.data_dir.display());
    info!("ADDR   = {}", addr);

    if !config.data_dir.exists() {
        warn!("Data directory {:?} does not exist, creating it", config.data_dir);
        std::fs::create_dir_all(&config.data_dir)?;
    }

    let app = Arc::new(build_app(&config));
    let listener = TcpListener::bind(addr).await?;
    info!("Wiki listening on http://{}", addr);
    axum::serve(listener, router(app)).await.map_err(WikiError::from)
}
