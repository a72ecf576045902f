use chrono::Duration;
use clap::Parser;

use tasksync_server::{db, router, AppState, Config};

#[tokio::main]
async fn main() {
    env_logger::init();
    let config = Config::parse();
    if let Err(err) = run(config).await {
        log::error!("server failed: {err}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(&config.database_url).await?;
    let state = AppState {
        db,
        jwt_secret: config.jwt_secret,
        token_ttl: Duration::minutes(config.token_ttl_minutes),
    };

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    log::info!("listening on {}", config.bind);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
