//! Concrete provider implementations and chain assembly
//!
//! Chains are configuration, not code: `build_chains` turns the per-domain
//! provider specs from `RiskwatchConfig` into executable chains, resolving
//! registry names to provider instances.

pub mod backend;
pub mod open_meteo;
pub mod usgs;

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;

pub use backend::BackendProvider;
pub use open_meteo::{OpenMeteoAirQualityProvider, OpenMeteoWeatherProvider};
pub use usgs::UsgsProvider;

use crate::Result;
use crate::chain::{Provider, ProviderChain, ProviderSlot};
use crate::config::{ProviderSpec, RiskwatchConfig};
use crate::error::RiskwatchError;
use crate::models::Domain;

fn resolve_provider(
    spec: &ProviderSpec,
    domain: Domain,
    config: &RiskwatchConfig,
    client: &Client,
) -> Result<Arc<dyn Provider>> {
    match spec.name.as_str() {
        backend::PROVIDER_NAME => Ok(Arc::new(BackendProvider::new(
            client.clone(),
            config.backend.base_url.clone(),
            domain,
        ))),
        open_meteo::PROVIDER_NAME => match domain {
            Domain::Weather => Ok(Arc::new(OpenMeteoWeatherProvider::new(client.clone()))),
            Domain::AirQuality => Ok(Arc::new(OpenMeteoAirQualityProvider::new(client.clone()))),
            other => Err(RiskwatchError::config(format!(
                "Provider 'open-meteo' does not serve domain '{other}'"
            ))),
        },
        usgs::PROVIDER_NAME => match domain {
            Domain::Seismic => Ok(Arc::new(UsgsProvider::new(
                client.clone(),
                config.domains.seismic_search.clone(),
            ))),
            other => Err(RiskwatchError::config(format!(
                "Provider 'usgs' does not serve domain '{other}'"
            ))),
        },
        unknown => Err(RiskwatchError::config(format!(
            "Unknown provider '{unknown}' in domain '{domain}' chain"
        ))),
    }
}

/// Build every domain's provider chain from configuration
///
/// # Errors
/// Configuration errors for unknown provider names or providers registered
/// against a domain they cannot serve.
pub fn build_chains(
    config: &RiskwatchConfig,
    client: &Client,
) -> Result<HashMap<Domain, ProviderChain>> {
    let mut chains = HashMap::new();
    for domain in Domain::ALL {
        let domain_config = config.domains.for_domain(domain);
        let mut slots = Vec::with_capacity(domain_config.providers.len());
        for spec in &domain_config.providers {
            let provider = resolve_provider(spec, domain, config, client)?;
            slots.push(ProviderSlot {
                spec: spec.clone(),
                provider,
            });
        }
        chains.insert(domain, ProviderChain::new(domain, slots));
    }
    Ok(chains)
}
