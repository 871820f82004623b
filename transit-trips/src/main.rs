use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_trips::config::{FixtureSource, ServerConfig};
use transit_trips::provider::{FixtureProvider, HttpClient, Provider};
use transit_trips::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    let provider = match (&config.fixtures, config.http_config()) {
        (FixtureSource::Url(url), Some(http)) => {
            info!(%url, "fetching fixtures");
            FixtureProvider::fetch(&HttpClient::new(http)?, "").await?
        }
        (FixtureSource::File(path), _) | (FixtureSource::Url(path), None) => {
            info!(%path, "loading fixtures");
            FixtureProvider::load(path)?
        }
    };

    if let Some(expected) = &config.network {
        if provider.network() != expected {
            return Err(format!(
                "fixtures are for network {}, expected {expected}",
                provider.network()
            )
            .into());
        }
    }

    let fixture = provider.fixture();
    info!(
        network = %provider.network(),
        locations = fixture.locations.len(),
        pages = fixture.pages.len(),
        "fixtures loaded"
    );

    let app = create_router(AppState::new(provider));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "transit trips listening");
    info!("endpoints: GET /health, GET /locations/suggest, GET /locations/nearby, GET /departures, POST /trips, POST /trips/more");

    axum::serve(listener, app).await?;
    Ok(())
}
