use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chatrelay_server::config::Config;
use chatrelay_server::store::{InMemoryRoomStore, RoomStore, SqliteRoomStore};
use chatrelay_server::{build_sqlite_url, connect_pool, routes, run_migrations, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,chatrelay_server=debug")),
        )
        .init();

    let config = Config::parse();

    let store: Arc<dyn RoomStore> = if config.in_memory {
        tracing::info!("using in-memory room store");
        Arc::new(InMemoryRoomStore::new())
    } else {
        let db_url = build_sqlite_url(&config.database_url).context("build sqlite DATABASE_URL")?;
        tracing::info!(%db_url, "using sqlite room store");
        let pool = connect_pool(&db_url).await.context("connect to sqlite")?;
        run_migrations(&pool).await.context("run migrations")?;
        Arc::new(SqliteRoomStore::new(pool))
    };

    let state = Arc::new(AppState::new(store, &config));
    let cors = routes::cors_layer(config.normalized_origin())?;
    let app = routes::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .context("bind tcp listener")?;
    tracing::info!(addr = %config.bind, origin = config.normalized_origin(), "listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
