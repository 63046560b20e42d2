use std::net::SocketAddr;

use anyhow::Context;
use tracing::{Level, info};

use yamdb_server::config::AppConfig;
use yamdb_server::state::AppState;
use yamdb_server::{build_router, database, mailer, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    seed::ensure_indexes(&db).await?;
    seed::ensure_superuser(&db, &config.auth)
        .await
        .context("Failed to bootstrap superuser")?;

    if config.mail.smtp.is_none() {
        info!("No SMTP server configured, confirmation codes will be logged");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        mailer: mailer::from_config(&config.mail),
        config,
    };
    let app = build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
