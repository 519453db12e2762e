use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use config::{
    APP_VERSION,
    dashboard::{DashboardConfig, get_config},
};
use http::DashboardServer;
use log::info;
use nav::NavCache;
use session::SessionRegistry;
use simple_logger::SimpleLogger;
use telemetry::{ApiConfig, TelemetryClient};

mod charts;
mod http;
mod nav;
mod pages;
mod poller;
mod session;
mod snapshot;
mod view;

pub struct AppState {
    pub config: &'static DashboardConfig,
    pub client: TelemetryClient,
    pub sessions: SessionRegistry,
    pub nav: NavCache,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: &'static DashboardConfig) -> Result<Self> {
        let client = TelemetryClient::new(ApiConfig {
            base_url: config.api_base_url.clone(),
            location: config.tank_location.clone(),
            user_timezone: config.user_timezone.clone(),
            timeout: config.request_timeout,
        })
        .context("failed to create telemetry client")?;

        Ok(Self {
            config,
            client,
            sessions: SessionRegistry::new(),
            nav: NavCache::new(config.nav_cache),
        })
    }
}

async fn sweep_sessions(state: SharedState) {
    let idle = state.config.session_idle;
    let mut interval = tokio::time::interval(idle.clamp(Duration::from_secs(1), Duration::from_secs(60)));

    loop {
        interval.tick().await;

        let removed = state.sessions.sweep(idle);
        if removed > 0 {
            info!(
                "Removed {removed} idle session(s), {} active",
                state.sessions.len()
            );
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = get_config().context("failed to get config")?;

    SimpleLogger::new()
        .with_level(config.log_level)
        .init()
        .context("failed to initialize logger")?;

    info!("Starting Tank Telemetry Dashboard v{APP_VERSION}...");
    info!(
        "Using telemetry API at {} (location {})",
        config.api_base_url, config.tank_location
    );

    let config: &'static DashboardConfig = Box::leak(Box::new(config));

    let state = Arc::new(AppState::new(config)?);

    tokio::spawn(sweep_sessions(state.clone()));

    let server = DashboardServer::bind(state).await?;
    info!("Dashboard ready at port {}", server.local_addr().port());

    server.serve().await;

    Ok(())
}

#[cfg(test)]
pub mod testing {
    use std::time::Duration;

    use config::dashboard::DashboardConfig;

    use super::{AppState, SharedState};

    /// State whose telemetry API refuses every connection.
    pub fn offline_state() -> SharedState {
        let config = DashboardConfig {
            api_base_url: "http://127.0.0.1:1".into(),
            request_timeout: Duration::from_secs(1),
            ..Default::default()
        };

        let config: &'static DashboardConfig = Box::leak(Box::new(config));

        SharedState::new(AppState::new(config).unwrap())
    }
}
