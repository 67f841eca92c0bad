use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tracing::{debug, info, Level};

use timetable::config::AppConfig;
use timetable::db::TimetableDbManager;
use timetable::server::create_router;
use timetable::types::AppState;

const CONFIG_ENV: &str = "TIMETABLE_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from);

    let config = AppConfig::load_or_default(config_path.as_deref())
        .map_err(|e| anyhow!("failed to load config: {e}"))?;

    let level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Some(path) = &config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let timetable_db = TimetableDbManager::new(&config.database_path)
        .with_context(|| format!("failed to open database {}", config.database_path))?;
    info!("Using database {}", config.database_path);

    let address: SocketAddr = format!("{}:{}", config.address, config.port)
        .parse()
        .context("invalid listen address")?;

    let state = Arc::new(AppState::new(config, timetable_db));

    // Sweep expired sessions
    let sweeper_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweeper_state.sessions.cleanup_expired();
            debug!("{} active sessions", sweeper_state.sessions.len());
        }
    });

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
