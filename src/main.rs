//! flashdeck server entry point.
//!
//! Loads configuration from the environment, opens the Sled store, and
//! serves the REST API.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flashdeck::billing::Billing;
use flashdeck::config::Config;
use flashdeck::generate::Generator;
use flashdeck::rest::{create_router, AppState};
use flashdeck::storage::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::load();
    let store = Store::open(&config.data_path)?;

    let state = AppState {
        store,
        generator: Generator::new(&config.openai_api_url, &config.openai_api_key),
        billing: Billing::new(&config.stripe_secret_key, &config.base_url),
        jwt_secret: config.jwt_secret.clone().into_bytes(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, data_path = %config.data_path, "flashdeck API starting");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, create_router(state).into_make_service()).await?;

    Ok(())
}
