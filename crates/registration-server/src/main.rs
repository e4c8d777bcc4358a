//! Registration Server - Entry point.

use account_store::Stores;
use registration_server::{
    api::{create_router, AppState},
    config::{Config, LogFormat},
    Registrar,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    info!("Starting Registration Server");

    let settings = config.registration_settings();
    info!(
        storage_mode = %settings.storage_mode,
        registration_enabled = settings.registration_enabled,
        serialize = settings.serialize,
        "Registration settings loaded"
    );
    if settings.owner_username.is_none() {
        warn!("No owner username configured, nothing is reserved");
    }

    // Initialize storage
    let stores = if config.data.persist {
        match Stores::file(&config.data.dir).await {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to open account store in {:?}: {}", config.data.dir, e);
                std::process::exit(1);
            }
        }
    } else {
        info!("Persistence disabled, using in-memory storage");
        Stores::memory()
    };

    // Create application state
    let state = AppState::new(Registrar::new(settings, stores));
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
