//! # bandstandd — bandstand daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging from the configured filter
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories and the room
//!   registry via port traits
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use bandstand_adapter_http_axum::state::AppState;
use bandstand_adapter_storage_sqlite_sqlx::SqliteRepositories;
use bandstand_adapter_storage_sqlite_sqlx::pool::Config as DatabaseConfig;
use bandstand_app::rooms::RoomRegistry;
use bandstand_app::services::auth_service::AuthService;
use bandstand_app::services::band_service::BandService;
use bandstand_app::services::rehearsal_service::RehearsalService;
use bandstand_app::services::setlist_service::SetlistService;
use bandstand_app::services::song_service::SongService;
use bandstand_app::services::user_service::UserService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    tracing::info!(url = %config.database_url(), "database ready");

    // Real-time fan-out
    let rooms = Arc::new(RoomRegistry::new(config.realtime.connection_buffer));

    // Services
    let auth_service = AuthService::new(db.users(), db.sessions(), config.session_ttl());
    let user_service = UserService::new(db.users());
    let band_service = BandService::new(db.bands(), db.users(), Arc::clone(&rooms));
    let rehearsal_service = RehearsalService::new(db.rehearsals(), db.bands(), Arc::clone(&rooms));
    let song_service = SongService::new(db.songs(), db.bands(), Arc::clone(&rooms));
    let setlist_service = SetlistService::new(db.setlists(), db.bands(), Arc::clone(&rooms));

    // HTTP
    let state = AppState::<SqliteRepositories>::new(
        auth_service,
        user_service,
        band_service,
        rehearsal_service,
        song_service,
        setlist_service,
        rooms,
    );
    let app = bandstand_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "bandstandd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("bandstandd stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
