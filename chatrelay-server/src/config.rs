use std::net::SocketAddr;

use clap::Parser;

use chatrelay_core::protocol::destinations::DEFAULT_APP_PREFIX;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATABASE_URL: &str = "chatrelay.db";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://chat-app-xi-seven-73.vercel.app";

/// Server settings; every flag can also come from the environment (or `.env`).
#[derive(Debug, Clone, Parser)]
#[command(name = "chatrelay-server", version, about = "Room chat relay over WebSocket")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,

    /// SQLite file path or URL; `sqlite::memory:` is passed through
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Keep rooms in process memory instead of SQLite
    #[arg(long, env = "CHATRELAY_IN_MEMORY")]
    pub in_memory: bool,

    /// The single origin allowed to call the HTTP API and open sockets
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = DEFAULT_ALLOWED_ORIGIN)]
    pub allowed_origin: String,

    /// Prefix stripped from inbound application destinations
    #[arg(long, env = "APP_DESTINATION_PREFIX", default_value = DEFAULT_APP_PREFIX)]
    pub app_prefix: String,

    /// Reject sends whose body roomId differs from the destination's roomId
    #[arg(long, env = "STRICT_ROOM_MATCH")]
    pub strict_room_match: bool,
}

impl Config {
    /// Browsers send `Origin` without a trailing slash.
    pub fn normalized_origin(&self) -> &str {
        self.allowed_origin.trim_end_matches('/')
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            in_memory: false,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            app_prefix: DEFAULT_APP_PREFIX.to_string(),
            strict_room_match: false,
        }
    }
}
