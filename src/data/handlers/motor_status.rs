use lambda_http::{Body, Request, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::authenticate_machine;
use crate::error::{ApiError, NotFoundError};
use irrigation_backend::shared::store::dynamo::DynamoMachineStore;
use irrigation_backend::shared::store::MachineStore;

/// Response payload for GET /motor-status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorStatusResponse {
    /// Commanded motor state per probe, in probe order
    pub probes: Vec<bool>,
}

/// Handle GET /motor-status requests
///
/// Devices poll this between telemetry pushes to pick up operator commands
/// (manual overrides, threshold changes) issued through the control plane.
pub async fn handle_motor_status(
    event: Request,
    request_id: &str,
    config: &crate::config::Config,
) -> Result<Response<Body>, ApiError> {
    let credentials = authenticate_machine(
        &config.dynamodb_client,
        &config.product_keys_table,
        &event,
    )
    .await?;

    let store = DynamoMachineStore::new(&config.dynamodb_client, &config.machines_table);
    let machine = store
        .load_machine_by_product_key(&credentials.product_key)
        .await?
        .ok_or(NotFoundError::Machine)?;

    info!(
        request_id = %request_id,
        machine_id = %machine.machine_id,
        "Motor status polled"
    );

    let response = MotorStatusResponse {
        probes: machine.motor_states(),
    };

    let response_body = serde_json::to_string(&response)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;

    Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(Body::from(response_body))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
