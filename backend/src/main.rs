//! Backend entry-point: loads settings and serves the user account API.

mod server;

use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::config::AppSettings;
use server::{ServerConfig, create_server};

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

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| eyre!("failed to load settings: {e}"))?;
    let disclosure = settings.fault_disclosure();
    let config = ServerConfig::new(settings.bind_addr()?).with_disclosure(disclosure);

    info!(bind_addr = %config.bind_addr(), ?disclosure, "starting server");
    let server = create_server(config).wrap_err("failed to start HTTP server")?;
    server.await.wrap_err("HTTP server terminated with an error")
}
