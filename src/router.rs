use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::handlers::motor_status::handle_motor_status;
use crate::handlers::telemetry::handle_telemetry;
use irrigation_backend::Clock;

/// Route a health check request (no config needed)
pub fn route_request_health(request_id: &str) -> Result<Response<Body>, ApiError> {
    handle_health(request_id)
}

/// Route an incoming request to the appropriate handler
///
/// Path-based routing for the Data Plane API: normalizes paths (trailing
/// slashes), matches on (method, path) tuples, and returns 404 for unknown
/// routes.
pub async fn route_request(
    event: Request,
    request_id: &str,
    config: &Config,
    clock: &dyn Clock,
) -> Result<Response<Body>, ApiError> {
    let method = event.method();
    let path = normalize_path(event.uri().path());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Routing request"
    );

    match (method, path.as_str()) {
        // Health check endpoint (no authentication required)
        (&Method::GET, "/health") => {
            info!(request_id = %request_id, "Health check endpoint");
            handle_health(request_id)
        }

        // Telemetry ingestion endpoint
        (&Method::POST, "/telemetry") => {
            info!(request_id = %request_id, "Telemetry endpoint");
            handle_telemetry(event, request_id, config, clock).await
        }

        // Motor status poll endpoint
        (&Method::GET, "/motor-status") => {
            info!(request_id = %request_id, "Motor status endpoint");
            handle_motor_status(event, request_id, config).await
        }

        // Unknown route - return 404
        _ => {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Unknown route"
            );
            handle_not_found(request_id, method, &path)
        }
    }
}

/// Normalize a path by removing trailing slashes
///
/// This ensures that /telemetry and /telemetry/ are treated the same.
/// The root path "/" is preserved as-is.
fn normalize_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }

    path.trim_end_matches('/').to_string()
}

/// Handle health check requests
fn handle_health(request_id: &str) -> Result<Response<Body>, ApiError> {
    let body = serde_json::json!({
        "status": "healthy",
        "service": "data-plane-api",
        "request_id": request_id
    });

    Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// Handle 404 Not Found responses
fn handle_not_found(
    request_id: &str,
    method: &Method,
    path: &str,
) -> Result<Response<Body>, ApiError> {
    let body = serde_json::json!({
        "error": "NOT_FOUND",
        "message": format!("Route {} {} not found", method, path),
        "request_id": request_id
    });

    Response::builder()
        .status(404)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
