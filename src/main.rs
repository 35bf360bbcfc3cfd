use anyhow::Result;
use tracing_subscriber::EnvFilter;

use riskwatch::config::RiskwatchConfig;
use riskwatch::providers;
use riskwatch::service::DomainDataService;
use riskwatch::web;

fn init_tracing(config: &RiskwatchConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RiskwatchConfig::load()?;
    init_tracing(&config);

    let client = reqwest::Client::new();
    let chains = providers::build_chains(&config, &client)?;

    let port = config.web.port;
    let refresh_enabled = config.refresh.enabled;
    let service = DomainDataService::new(config, chains)?;

    if let Some(location) = service.restore_persisted_location().await {
        tracing::info!(location = %location.summary(), "Resuming with persisted location");
    }

    if refresh_enabled {
        service.start_auto_refresh(None).await;
    }

    web::run(service, port).await
}
