use anyhow::Result;
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use country_metrics::providers::{
    ComtradeClient, FactbookClient, OwidClient, RestCountriesClient, WorldBankClient,
};
use country_metrics::{Aggregator, CrimeStatistics, MetricProvider};

mod config;
mod error;
mod routes;

use config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    pub world_bank: Arc<WorldBankClient>,
    pub owid: Arc<OwidClient>,
    pub comtrade: Arc<ComtradeClient>,
    pub factbook: Arc<FactbookClient>,
    pub rest_countries: Arc<RestCountriesClient>,
    pub crime: Arc<CrimeStatistics>,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> country_metrics::Result<Self> {
        let world_bank = Arc::new(WorldBankClient::new(config.http(&config.world_bank_url))?);
        let owid = Arc::new(OwidClient::new(config.http(&config.owid_url))?);
        let comtrade = Arc::new(
            ComtradeClient::new(config.http(&config.comtrade_url), config.comtrade_api_key.clone())?
                .with_retry(config.comtrade_retry),
        );
        let factbook = Arc::new(FactbookClient::new(config.http(&config.factbook_url))?);
        let rest_countries = Arc::new(RestCountriesClient::new(config.http(&config.rest_countries_url))?);
        let crime = Arc::new(CrimeStatistics::new(config.crime_dataset_path.clone(), config.cache_ttl));

        let adapters: [Arc<dyn MetricProvider>; 6] = [
            world_bank.clone(),
            owid.clone(),
            comtrade.clone(),
            factbook.clone(),
            rest_countries.clone(),
            crime.clone(),
        ];
        let aggregator = adapters
            .into_iter()
            .fold(Aggregator::new(), |agg, adapter| agg.with_provider(adapter));

        Ok(Self {
            world_bank,
            owid,
            comtrade,
            factbook,
            rest_countries,
            crime,
            aggregator,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "country_gateway=debug,country_metrics=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();
    let state = AppState::from_config(&config)?;
    tracing::info!("   Crime dataset: {}", config.crime_dataset_path.display());
    tracing::info!("   Dataset cache TTL: {}s", config.cache_ttl.as_secs());
    if config.comtrade_api_key.is_none() {
        tracing::warn!("   COMTRADE_API_KEY not set - using the anonymous Comtrade quota");
    }

    let app = build_router(state);
    let addr = config.bind_addr();
    tracing::info!("Country gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "country-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
