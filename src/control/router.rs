use lambda_http::{http::Method, Body, Request, RequestExt, Response};
use tracing::{info, warn};

use super::config::ControlConfig;
use super::cors;
use super::error::ApiError;
use super::handlers;

pub async fn route_request(
    event: Request,
    config: &ControlConfig,
) -> Result<Response<Body>, lambda_http::Error> {
    let path = normalize_path(event.uri().path());
    let method = event.method();

    let request_id = event.lambda_context().request_id.clone();

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Routing control plane request"
    );

    if method == Method::OPTIONS {
        info!(
            request_id = %request_id,
            "Handling CORS preflight request"
        );
        return Ok(cors::preflight_response());
    }

    let response = match (method, path.as_str()) {
        (&Method::GET, "/health") => {
            info!(request_id = %request_id, "Health check endpoint");
            handle_health(&request_id)
        }

        (&Method::POST, "/users") => {
            info!(request_id = %request_id, "Signup endpoint");
            match handlers::users::signup(event, config).await {
                Ok(response) => response,
                Err(e) => e.to_http_response(&request_id),
            }
        }
        (&Method::POST, "/sessions") => {
            info!(request_id = %request_id, "Login endpoint");
            match handlers::users::login(event, config).await {
                Ok(response) => response,
                Err(e) => e.to_http_response(&request_id),
            }
        }

        (&Method::POST, "/machines") => {
            info!(request_id = %request_id, "Register machine endpoint");
            match handlers::machines::register_machine(event, config).await {
                Ok(response) => response,
                Err(e) => e.to_http_response(&request_id),
            }
        }
        (_, path) if path.starts_with("/machines/") => {
            route_machine_path(event, config, path).await
        }

        _ => {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Unknown route"
            );
            not_found(&request_id)
        }
    };

    Ok(cors::add_cors_headers(response))
}

fn normalize_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }

    // Strip CloudFront path prefixes if present
    let path = path
        .strip_prefix("/api/control")
        .or_else(|| path.strip_prefix("/api/data"))
        .unwrap_or(path);

    path.trim_end_matches('/').to_string()
}

async fn route_machine_path(
    event: Request,
    config: &ControlConfig,
    path: &str,
) -> Response<Body> {
    let request_id = event.lambda_context().request_id.clone();
    let method = event.method();
    let parts: Vec<&str> = path.trim_start_matches("/machines/").split('/').collect();

    match parts.as_slice() {
        [machine_id] => {
            let machine_id = machine_id.to_string();
            match method {
                &Method::GET => {
                    info!(request_id = %request_id, machine_id = %machine_id, "Machine detail endpoint");
                    match handlers::machines::get_machine_detail(event, config, &machine_id).await
                    {
                        Ok(response) => response,
                        Err(e) => e.to_http_response(&request_id),
                    }
                }
                &Method::DELETE => {
                    info!(request_id = %request_id, machine_id = %machine_id, "Delete machine endpoint");
                    match handlers::machines::delete_machine(event, config, &machine_id).await {
                        Ok(response) => response,
                        Err(e) => e.to_http_response(&request_id),
                    }
                }
                _ => not_found(&request_id),
            }
        }
        [machine_id, "threshold"] if method == Method::PUT => {
            let machine_id = machine_id.to_string();
            info!(request_id = %request_id, machine_id = %machine_id, "Threshold endpoint");
            match handlers::machines::update_threshold(event, config, &machine_id).await {
                Ok(response) => response,
                Err(e) => e.to_http_response(&request_id),
            }
        }
        [machine_id, "motor"] if method == Method::PUT => {
            let machine_id = machine_id.to_string();
            info!(request_id = %request_id, machine_id = %machine_id, "Motor command endpoint");
            match handlers::machines::update_motor(event, config, &machine_id).await {
                Ok(response) => response,
                Err(e) => e.to_http_response(&request_id),
            }
        }
        [machine_id, "usage"] if method == Method::GET => {
            let machine_id = machine_id.to_string();
            info!(request_id = %request_id, machine_id = %machine_id, "Usage endpoint");
            match handlers::machines::get_usage(event, config, &machine_id).await {
                Ok(response) => response,
                Err(e) => e.to_http_response(&request_id),
            }
        }
        _ => {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Unknown machine route"
            );
            not_found(&request_id)
        }
    }
}

fn handle_health(request_id: &str) -> Response<Body> {
    let body = serde_json::json!({
        "status": "healthy",
        "service": "control-plane-api",
        "request_id": request_id
    });

    Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            ApiError::Internal("Failed to build response".to_string()).to_http_response(request_id)
        })
}

fn not_found(request_id: &str) -> Response<Body> {
    let body = serde_json::json!({
        "error": "NOT_FOUND",
        "message": "Route not found",
        "request_id": request_id
    });

    Response::builder()
        .status(404)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            ApiError::Internal("Failed to build response".to_string()).to_http_response(request_id)
        })
}
