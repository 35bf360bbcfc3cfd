//! HTTP API surface
//!
//! Thin JSON boundary over the domain data service. Widgets always get a
//! value for a domain; the provenance field tells them whether to show an
//! "estimated data" indicator. Only a missing location turns into an error
//! status.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RiskwatchError;
use crate::models::{
    Domain, DomainPayload, DomainResult, LocationLabel, LocationReading, ResolvedLocation,
};
use crate::scheduler::RefreshSnapshot;
use crate::service::DomainDataService;

#[derive(Serialize)]
pub struct ApiDomainResult {
    pub domain: Domain,
    pub provenance: String,
    pub provider: String,
    pub retries_used: u32,
    pub fetched_at: DateTime<Utc>,
    pub payload: DomainPayload,
}

impl From<DomainResult> for ApiDomainResult {
    fn from(result: DomainResult) -> Self {
        Self {
            domain: result.domain,
            provenance: if result.provenance.is_real() {
                "real".to_string()
            } else {
                "simulated".to_string()
            },
            provider: result.provider_name,
            retries_used: result.retries_used,
            fetched_at: result.fetched_at,
            payload: result.payload,
        }
    }
}

#[derive(Serialize)]
pub struct ApiResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub source: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl From<ResolvedLocation> for ApiResolvedLocation {
    fn from(location: ResolvedLocation) -> Self {
        Self {
            latitude: location.coordinate.latitude(),
            longitude: location.coordinate.longitude(),
            source: location.source.to_string(),
            city: location.label.city,
            state: location.label.state,
            country: location.label.country,
        }
    }
}

#[derive(Deserialize)]
pub struct ApiLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// True when the reading comes from a device sensor rather than manual
    /// entry
    #[serde(default)]
    pub from_device: bool,
}

impl ApiLocationRequest {
    fn reading(&self) -> LocationReading {
        LocationReading::new(
            self.latitude,
            self.longitude,
            LocationLabel::new(
                self.city.clone().unwrap_or_default(),
                self.state.clone().unwrap_or_default(),
                self.country.clone().unwrap_or_default(),
            ),
        )
    }
}

#[derive(Serialize)]
pub struct ApiRefreshOutcome {
    /// False when a cycle was already running and this trigger was absorbed
    pub started: bool,
}

#[derive(Serialize)]
pub struct ApiStatus {
    pub refresh: RefreshSnapshot,
    pub cache_entries: usize,
}

#[derive(Deserialize)]
pub struct DomainQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub force: bool,
}

fn error_status(err: &RiskwatchError) -> StatusCode {
    match err {
        RiskwatchError::NoLocationAvailable => StatusCode::UNPROCESSABLE_ENTITY,
        RiskwatchError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router(service: DomainDataService) -> Router {
    Router::new()
        .route("/data/{domain}", get(get_domain_data))
        .route("/location/resolve", post(resolve_location))
        .route("/refresh", post(trigger_refresh))
        .route("/cache", delete(clear_cache))
        .route("/status", get(get_status))
        .with_state(service)
}

async fn get_domain_data(
    State(service): State<DomainDataService>,
    Path(domain): Path<String>,
    Query(query): Query<DomainQuery>,
) -> Result<Json<ApiDomainResult>, StatusCode> {
    let domain: Domain = domain.parse().map_err(|_| StatusCode::NOT_FOUND)?;

    // An explicit coordinate on the request acts as a manual entry
    if let (Some(lat), Some(lon)) = (query.lat, query.lon) {
        let reading = LocationReading::new(lat, lon, LocationLabel::default());
        service
            .resolve_location(None, Some(reading))
            .await
            .map_err(|err| error_status(&err))?;
    }

    let result = service
        .get_domain_data(domain, query.force)
        .await
        .map_err(|err| error_status(&err))?;
    Ok(Json(result.into()))
}

async fn resolve_location(
    State(service): State<DomainDataService>,
    Json(request): Json<ApiLocationRequest>,
) -> Result<Json<ApiResolvedLocation>, StatusCode> {
    let reading = request.reading();
    let (device, manual) = if request.from_device {
        (Some(reading), None)
    } else {
        (None, Some(reading))
    };

    let resolved = service
        .resolve_location(device, manual)
        .await
        .map_err(|err| error_status(&err))?;
    Ok(Json(resolved.into()))
}

async fn trigger_refresh(
    State(service): State<DomainDataService>,
) -> Json<ApiRefreshOutcome> {
    let started = service.manual_refresh().await;
    Json(ApiRefreshOutcome { started })
}

async fn clear_cache(State(service): State<DomainDataService>) -> StatusCode {
    service.invalidate_cache().await;
    StatusCode::NO_CONTENT
}

async fn get_status(State(service): State<DomainDataService>) -> Json<ApiStatus> {
    let refresh = service.refresh_snapshot().await;
    let cache_entries = service.cache_entries().await;
    Json(ApiStatus {
        refresh,
        cache_entries,
    })
}
