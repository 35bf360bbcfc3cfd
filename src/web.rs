use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api;
use crate::service::DomainDataService;

pub async fn run(service: DomainDataService, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", api::router(service))
        .layer(cors);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server running at http://localhost:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
