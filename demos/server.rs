//! Demo server: reads settings from `DBAPI_CONFIG` (JSON file) or the environment, then mounts
//! the common routes and the database API.

use axum::Router;
use dbrest::{common_routes, db_api_routes, init_db_api, DbApiSettings};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dbrest=info".parse()?))
        .init();

    let settings = match std::env::var("DBAPI_CONFIG") {
        Ok(path) => DbApiSettings::from_file(path).await?,
        Err(_) => DbApiSettings::from_env()?,
    };

    let Some(state) = init_db_api(&settings).await? else {
        tracing::warn!("db api disabled; set enableDbApi to true to serve tables");
        return Ok(());
    };

    let app = Router::new()
        .merge(common_routes(state.clone()))
        .merge(db_api_routes(state));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
