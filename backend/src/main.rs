//! Gateway entry-point: loads configuration, wires providers and serves the
//! diagnosis API.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use ddx_gateway::inbound::http::health::HealthState;
use ddx_gateway::inbound::http::state::HttpState;
use ddx_gateway::settings::{GatewaySettings, ProviderSettings};
use server::{ServerConfig, build_service, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let env = DefaultEnv::new();
    let settings = GatewaySettings::load_from_iter(std::env::args_os())
        .map_err(|e| eyre!("failed to load configuration: {e}"))?
        .with_legacy_env(&env);
    let providers =
        ProviderSettings::from_env(&env).wrap_err("failed to read vendor settings")?;
    let service = build_service(&settings, &providers, Arc::new(DefaultClock))?;
    if settings.allow_phi {
        warn!("PHI gate disabled; cases are accepted without de-identification");
    }

    let config = ServerConfig::new(
        (settings.bind_host().to_owned(), settings.port()),
        HttpState::new(service, settings.allow_phi),
    );
    let (host, port) = config.bind_addr();
    info!(host, port, "starting diagnostic gateway");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await?;
    Ok(())
}
