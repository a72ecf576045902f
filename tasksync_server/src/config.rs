//! Server configuration, from flags or environment.

use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "tasksync-server", version, about = "Multi-device task sync endpoint")]
pub struct Config {
    /// Address to bind the HTTP listener on.
    #[arg(long, env = "TASKSYNC_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Database URL.
    #[arg(
        long,
        env = "TASKSYNC_DATABASE_URL",
        default_value = "sqlite://tasksync.db?mode=rwc"
    )]
    pub database_url: String,

    /// Secret the bearer tokens are signed with.
    #[arg(long, env = "TASKSYNC_JWT_SECRET")]
    pub jwt_secret: String,

    /// Token lifetime in minutes.
    #[arg(long, env = "TASKSYNC_TOKEN_TTL_MINUTES", default_value_t = 24 * 60)]
    pub token_ttl_minutes: i64,
}
