use lambda_http::{Body, Request, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::authenticate_machine;
use crate::error::{ApiError, NotFoundError, ValidationError};
use irrigation_backend::shared::actuation::{ingest_telemetry, ActuationOutcome, TelemetryReading};
use irrigation_backend::shared::store::dynamo::DynamoMachineStore;
use irrigation_backend::shared::store::MachineStore;
use irrigation_backend::shared::validators::{validate_percent, validate_probe_count};
use irrigation_backend::Clock;

/// Response payload for POST /telemetry
///
/// Echoes the commanded motor states so the device can actuate immediately
/// instead of waiting for its next status poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryResponse {
    /// Commanded motor state per probe, in probe order
    pub probes: Vec<bool>,

    /// True when the low-water override forced the motors off
    pub low_water: bool,
}

/// Handle POST /telemetry requests from devices
///
/// This is the ingestion path: validate the reported readings, feed the
/// machine's history logs (throttled tank/moisture appends, edge-triggered
/// motor events), run the actuation pass (low-water override first, then
/// the mode-dependent decision), and persist the whole document.
pub async fn handle_telemetry(
    event: Request,
    request_id: &str,
    config: &crate::config::Config,
    clock: &dyn Clock,
) -> Result<Response<Body>, ApiError> {
    // Step 1: Device authentication
    let credentials = authenticate_machine(
        &config.dynamodb_client,
        &config.product_keys_table,
        &event,
    )
    .await?;

    // Step 2: Parse request body
    let body_bytes = match event.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
        Body::Empty => {
            return Err(ValidationError::InvalidBody("Request body is empty".to_string()).into());
        }
    };

    let reading: TelemetryReading = serde_json::from_slice(body_bytes).map_err(|e| {
        ValidationError::InvalidBody(format!("Failed to parse JSON: {}", e))
    })?;

    // Step 3: Validate every field before touching any state
    validate_probe_count(reading.probes.len())
        .map_err(|e| ValidationError::InvalidValue(e.to_string()))?;
    validate_percent("water_level", reading.water_level)
        .map_err(|e| ValidationError::InvalidValue(e.to_string()))?;
    for probe in &reading.probes {
        validate_percent("moisture", probe.moisture)
            .map_err(|e| ValidationError::InvalidValue(e.to_string()))?;
    }

    // Step 4: Load the machine backing this product key
    let store = DynamoMachineStore::new(&config.dynamodb_client, &config.machines_table);
    let mut machine = store
        .load_machine_by_product_key(&credentials.product_key)
        .await?
        .ok_or(NotFoundError::Machine)?;

    if reading.probes.len() != machine.probes.len() {
        return Err(ValidationError::InvalidValue(format!(
            "machine has {} probes, reading has {}",
            machine.probes.len(),
            reading.probes.len()
        ))
        .into());
    }

    // Step 5: Ingest and decide
    let outcome = ingest_telemetry(&mut machine, &reading, clock.now_utc());

    // Step 6: Whole-document save; a failure here means the caller must not
    // assume the update took effect
    store.save_machine(&machine).await?;

    info!(
        request_id = %request_id,
        machine_id = %machine.machine_id,
        water_level = reading.water_level,
        outcome = ?outcome,
        "Telemetry ingested"
    );

    let response = TelemetryResponse {
        probes: machine.motor_states(),
        low_water: outcome == ActuationOutcome::LowWaterForcedOff,
    };

    let response_body = serde_json::to_string(&response)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;

    Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(Body::from(response_body))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
