//! Smart Library server entry point.
//!
//! `smart-library-server` runs the HTTP server.
//! `smart-library-server create-head <username> <password> [full name]`
//! creates a head librarian account and exits.

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use smart_library_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::{sessions::SessionManager, Services},
    AppState,
};

/// Install the global subscriber. The returned guard flushes the file
/// writer and must live as long as the process.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "smart_library_server={},tower_http=debug",
            logging.level
        )
        .into()
    });

    let stdout = if logging.format == "json" {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let (file, guard) = match logging.directory.as_deref() {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "smart-library.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Smart Library server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let sessions = SessionManager::from_config(&config.session, &config.redis)
        .await
        .context("Failed to initialise session store")?;

    let repository = Repository::new(pool);
    let services = Services::new(repository, sessions);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(command) = args.first() {
        return match command.as_str() {
            "create-head" => create_head(&services, &args[1..]).await,
            other => bail!("Unknown command: {}", other),
        };
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `create-head <username> <password> [full name]`
async fn create_head(services: &Services, args: &[String]) -> anyhow::Result<()> {
    let (Some(username), Some(password)) = (args.first(), args.get(1)) else {
        bail!("Usage: smart-library-server create-head <username> <password> [full name]");
    };
    let full_name = args[2..].join(" ");

    let id = services
        .users
        .create_head(username, password, &full_name)
        .await
        .context("Failed to create head librarian account")?;

    tracing::info!(user_id = id, "Head librarian account created");
    Ok(())
}
