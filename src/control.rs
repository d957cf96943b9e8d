// Control plane binary entry point

#[path = "control/error.rs"]
mod error;

#[path = "control/config.rs"]
mod config;

#[path = "control/cors.rs"]
pub mod cors;

#[path = "control/auth.rs"]
pub mod auth;

#[path = "control/crypto.rs"]
pub mod crypto;

#[path = "control/router.rs"]
mod router;

#[path = "control/handlers/mod.rs"]
mod handlers;

// Repo module (control plane specific)
#[path = "control/repo/mod.rs"]
mod repo;

use lambda_http::{run, service_fn, Error, Request};

async fn function_handler(
    event: Request,
) -> Result<lambda_http::Response<lambda_http::Body>, Error> {
    // Load configuration from environment
    let config = config::ControlConfig::from_env().await.map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        Error::from(format!("Configuration error: {}", e))
    })?;

    // Route the request using the router
    router::route_request(event, &config).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    run(service_fn(function_handler)).await
}
