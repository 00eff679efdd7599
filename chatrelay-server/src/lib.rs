use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod broker;
pub mod config;
pub mod controllers;
pub mod error;
pub mod routes;
pub mod routing;
pub mod store;
pub mod ws;

use broker::Broker;
use config::Config;
use routing::DestinationRouter;
use store::{InMemoryRoomStore, RoomStore};

pub struct AppState {
    pub store: Arc<dyn RoomStore>,
    /// Topic -> subscribed WebSocket sessions.
    pub broker: Broker,
    pub router: DestinationRouter,
    pub strict_room_match: bool,
    /// Only browser origin allowed to open `/ws`, without trailing slash.
    pub allowed_origin: String,
}

impl AppState {
    pub fn new(store: Arc<dyn RoomStore>, config: &Config) -> Self {
        Self {
            store,
            broker: Broker::new(),
            router: routes::destinations(&config.app_prefix),
            strict_room_match: config.strict_room_match,
            allowed_origin: config.normalized_origin().to_string(),
        }
    }

    /// State over an in-memory store seeded with empty rooms.
    pub fn in_memory<I, S>(room_ids: I, config: &Config) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Arc::new(InMemoryRoomStore::with_rooms(room_ids)), config)
    }
}

// Given a file path, returns a SQLite URL for it. Creates parent directories and the file if missing.
pub fn sqlite_url_for_path(p: &Path) -> anyhow::Result<String> {
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if let Some(parent) = abs.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent dirs for {:?}", parent))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&abs)
        .with_context(|| format!("create/open sqlite file {:?}", abs))?;
    let s = abs.to_string_lossy().replace('\\', "/");
    Ok(format!("sqlite:///{}", s.trim_start_matches('/')))
}

/// Normalizes a configured DATABASE_URL (bare path or `sqlite://` URL) into an absolute SQLite URL.
/// `sqlite::memory:` is returned unchanged.
pub fn build_sqlite_url(raw: &str) -> anyhow::Result<String> {
    if raw == "sqlite::memory:" {
        return Ok(raw.to_string());
    }
    let path_part = raw
        .trim_start_matches("sqlite:///")
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    // `sqlite:///abs/path` loses its leading slash above
    let path = if raw.starts_with("sqlite:///") {
        PathBuf::from(format!("/{path_part}"))
    } else {
        PathBuf::from(path_part)
    };
    sqlite_url_for_path(&path)
}

// Connect to the database and return a connection pool.
// An in-memory database lives per connection, so it gets a pool of one.
pub async fn connect_pool(db_url: &str) -> anyhow::Result<SqlitePool> {
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await
        .with_context(|| format!("connect to sqlite via {}", db_url))?;
    Ok(pool)
}

// Creates the tables if they do not exist.
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .context("enable foreign_keys")?;

    let stmts = [
        r#"
        CREATE TABLE IF NOT EXISTS rooms (
            room_id    TEXT PRIMARY KEY,
            created_at TEXT NOT NULL
        );"#,
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            room_id   TEXT NOT NULL,
            position  INTEGER NOT NULL,
            content   TEXT NOT NULL,
            sender    TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            PRIMARY KEY(room_id, position),
            FOREIGN KEY(room_id) REFERENCES rooms(room_id)
        );"#,
    ];
    for s in &stmts {
        sqlx::query(s)
            .execute(pool)
            .await
            .with_context(|| format!("apply migration: {}", &s[..s.len().min(40)].replace('\n', " ")))?;
    }
    Ok(())
}
