use lambda_http::{Body, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{authenticate_user, machine_belongs_to_user};
use crate::config::ControlConfig;
use crate::error::{ApiError, ConflictError, NotFoundError, ValidationError};
use crate::repo::product_keys::{claim_product_key, get_product_key, release_product_key};
use crate::repo::users::put_user;
use irrigation_backend::shared::actuation::{
    apply_manual_command, apply_threshold_update, average_moisture, ActuationOutcome,
    ManualCommandOutcome,
};
use irrigation_backend::shared::domain::{DailyUsageEntry, Machine};
use irrigation_backend::shared::id_generator::{IdGenerator, RandomIdGenerator};
use irrigation_backend::shared::store::dynamo::DynamoMachineStore;
use irrigation_backend::shared::store::{with_machine, MachineStore};
use irrigation_backend::shared::usage::{consolidate_machine, merged_daily_usage};
use irrigation_backend::shared::validators::{
    validate_address, validate_machine_name, validate_probe_count, validate_product_key,
    validate_threshold_moisture,
};

/// Request payload for POST /machines (machine registration)
#[derive(Debug, Deserialize)]
pub struct RegisterMachineRequest {
    pub name: String,
    pub address: String,
    pub product_key: String,
    /// Number of probes on the device; defaults to 1 (the single-probe machine)
    pub probe_count: Option<usize>,
}

/// Response payload for machine registration
#[derive(Debug, Serialize)]
pub struct RegisterMachineResponse {
    pub machine_id: String,
    pub name: String,
    pub product_key: String,
    pub address: String,
    pub threshold_moisture: i32,
}

/// One probe's live state in the machine detail projection
#[derive(Debug, Serialize, Deserialize)]
pub struct ProbeStatus {
    pub moisture: i32,
    pub is_motor_on: bool,
}

/// Response payload for GET /machines/{id}
#[derive(Debug, Serialize)]
pub struct MachineDetailResponse {
    pub name: String,
    pub address: String,
    pub water_tank_level: i32,
    pub threshold_moisture: i32,
    /// Representative moisture across all probes (arithmetic mean)
    pub soil_moisture: f64,
    pub probes: Vec<ProbeStatus>,
}

/// Request payload for PUT /machines/{id}/threshold (automatic mode)
#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub threshold_moisture: i32,
}

/// Response payload for a threshold update
#[derive(Debug, Serialize)]
pub struct ThresholdResponse {
    pub threshold_moisture: i32,
    /// Commanded motor state per probe after re-deciding
    pub probes: Vec<bool>,
    /// True when the low-water override kept the motors off
    pub low_water: bool,
}

/// Request payload for PUT /machines/{id}/motor (manual mode)
#[derive(Debug, Deserialize)]
pub struct MotorCommandRequest {
    /// Desired motor state per probe, in probe order
    pub probes: Vec<bool>,
}

/// Response payload for a manual motor command
#[derive(Debug, Serialize)]
pub struct MotorCommandResponse {
    pub probes: Vec<bool>,
}

/// Response payload for GET /machines/{id}/usage
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// Per-day motor-on minutes, merged across probes, in day order
    pub days: Vec<DailyUsageEntry>,
}

/// Response payload for machine deletion
#[derive(Debug, Serialize)]
pub struct DeleteMachineResponse {
    pub message: String,
    pub machine_id: String,
}

/// Handler for POST /machines: register a machine against a product key
///
/// The product key claim is the registration mutex: the conditional flip of
/// is_registered refuses a second registration with the same key.
pub async fn register_machine(
    event: Request,
    config: &ControlConfig,
) -> Result<Response<Body>, ApiError> {
    let request_id = event.lambda_context().request_id.clone();

    info!(request_id = %request_id, "Processing machine registration");

    let mut user = authenticate_user(&event, &config.dynamodb_client, &config.users_table).await?;

    let request: RegisterMachineRequest = parse_body(&event)?;

    validate_machine_name(&request.name)?;
    validate_address(&request.address)?;
    validate_product_key(&request.product_key)?;
    let probe_count = request.probe_count.unwrap_or(1);
    validate_probe_count(probe_count)?;

    // The key must be provisioned before it can be claimed
    get_product_key(
        &config.dynamodb_client,
        &config.product_keys_table,
        &request.product_key,
    )
    .await?
    .ok_or(NotFoundError::ProductKey)?;

    let claimed = claim_product_key(
        &config.dynamodb_client,
        &config.product_keys_table,
        &request.product_key,
    )
    .await?;
    if !claimed {
        warn!(
            request_id = %request_id,
            "Registration refused: product key already registered"
        );
        return Err(ConflictError::KeyAlreadyRegistered.into());
    }

    let id_generator = RandomIdGenerator::new();
    let machine = Machine::new(
        id_generator.uuid_v4(),
        request.product_key.clone(),
        request.name.trim(),
        request.address.trim(),
        probe_count,
    );

    let store = DynamoMachineStore::new(&config.dynamodb_client, &config.machines_table);
    store.save_machine(&machine).await?;

    user.machines.push(machine.machine_id.clone());
    put_user(&config.dynamodb_client, &config.users_table, &user).await?;

    info!(
        request_id = %request_id,
        machine_id = %machine.machine_id,
        user_id = %user.user_id,
        "Machine registered"
    );

    let response = RegisterMachineResponse {
        machine_id: machine.machine_id.clone(),
        name: machine.name.clone(),
        product_key: machine.product_key.clone(),
        address: machine.address.clone(),
        threshold_moisture: machine.mode.to_threshold(),
    };

    json_response(201, &response)
}

/// Handler for DELETE /machines/{id}: unlink, free the product key, delete
pub async fn delete_machine(
    event: Request,
    config: &ControlConfig,
    machine_id: &str,
) -> Result<Response<Body>, ApiError> {
    let request_id = event.lambda_context().request_id.clone();

    let mut user = authenticate_user(&event, &config.dynamodb_client, &config.users_table).await?;

    if !machine_belongs_to_user(&user, machine_id) {
        return Err(NotFoundError::Machine.into());
    }

    user.machines.retain(|id| id != machine_id);
    put_user(&config.dynamodb_client, &config.users_table, &user).await?;

    let store = DynamoMachineStore::new(&config.dynamodb_client, &config.machines_table);
    if let Some(machine) = store.load_machine(machine_id).await? {
        // Free the key so it can back a future registration
        release_product_key(
            &config.dynamodb_client,
            &config.product_keys_table,
            &machine.product_key,
        )
        .await?;
        store.delete_machine(machine_id).await?;
    }

    info!(
        request_id = %request_id,
        machine_id = %machine_id,
        user_id = %user.user_id,
        "Machine deleted"
    );

    let response = DeleteMachineResponse {
        message: "deleted successfully".to_string(),
        machine_id: machine_id.to_string(),
    };

    json_response(200, &response)
}

/// Handler for GET /machines/{id}: current readings and thresholds
pub async fn get_machine_detail(
    event: Request,
    config: &ControlConfig,
    machine_id: &str,
) -> Result<Response<Body>, ApiError> {
    let user = authenticate_user(&event, &config.dynamodb_client, &config.users_table).await?;

    if !machine_belongs_to_user(&user, machine_id) {
        return Err(NotFoundError::Machine.into());
    }

    let store = DynamoMachineStore::new(&config.dynamodb_client, &config.machines_table);
    let machine = store
        .load_machine(machine_id)
        .await?
        .ok_or(NotFoundError::Machine)?;

    let moisture_values: Vec<i32> = machine.probes.iter().map(|p| p.moisture).collect();

    let response = MachineDetailResponse {
        name: machine.name.clone(),
        address: machine.address.clone(),
        water_tank_level: machine.water_tank_level,
        threshold_moisture: machine.mode.to_threshold(),
        soil_moisture: average_moisture(&moisture_values),
        probes: machine
            .probes
            .iter()
            .map(|p| ProbeStatus {
                moisture: p.moisture,
                is_motor_on: p.is_motor_on,
            })
            .collect(),
    };

    json_response(200, &response)
}

/// Handler for PUT /machines/{id}/threshold: switch to automatic mode
///
/// Persists the new threshold and re-decides every probe's motor from its
/// current moisture. A low tank keeps the motors off regardless.
pub async fn update_threshold(
    event: Request,
    config: &ControlConfig,
    machine_id: &str,
) -> Result<Response<Body>, ApiError> {
    let request_id = event.lambda_context().request_id.clone();

    let user = authenticate_user(&event, &config.dynamodb_client, &config.users_table).await?;

    if !machine_belongs_to_user(&user, machine_id) {
        return Err(NotFoundError::Machine.into());
    }

    let request: ThresholdRequest = parse_body(&event)?;
    validate_threshold_moisture(request.threshold_moisture)?;

    let store = DynamoMachineStore::new(&config.dynamodb_client, &config.machines_table);
    let (outcome, states) = with_machine(&store, machine_id, |machine| {
        let outcome = apply_threshold_update(machine, request.threshold_moisture);
        (outcome, machine.motor_states())
    })
    .await?
    .ok_or(NotFoundError::Machine)?;

    info!(
        request_id = %request_id,
        machine_id = %machine_id,
        threshold = request.threshold_moisture,
        outcome = ?outcome,
        "Threshold updated"
    );

    let response = ThresholdResponse {
        threshold_moisture: request.threshold_moisture,
        probes: states,
        low_water: outcome == ActuationOutcome::LowWaterForcedOff,
    };

    json_response(200, &response)
}

/// Handler for PUT /machines/{id}/motor: switch to manual mode and apply
/// explicit motor commands
///
/// The mode switch is persisted even when the command itself is refused for
/// low water, so the machine stays in manual mode afterwards.
pub async fn update_motor(
    event: Request,
    config: &ControlConfig,
    machine_id: &str,
) -> Result<Response<Body>, ApiError> {
    let request_id = event.lambda_context().request_id.clone();

    let user = authenticate_user(&event, &config.dynamodb_client, &config.users_table).await?;

    if !machine_belongs_to_user(&user, machine_id) {
        return Err(NotFoundError::Machine.into());
    }

    let request: MotorCommandRequest = parse_body(&event)?;

    let store = DynamoMachineStore::new(&config.dynamodb_client, &config.machines_table);
    let mut machine = store
        .load_machine(machine_id)
        .await?
        .ok_or(NotFoundError::Machine)?;

    if request.probes.len() != machine.probes.len() {
        return Err(ValidationError::InvalidValue(format!(
            "machine has {} probes, command has {}",
            machine.probes.len(),
            request.probes.len()
        ))
        .into());
    }

    let outcome = apply_manual_command(&mut machine, &request.probes);
    store.save_machine(&machine).await?;

    if outcome == ManualCommandOutcome::RefusedLowWater {
        warn!(
            request_id = %request_id,
            machine_id = %machine_id,
            "Manual motor command refused: tank water low"
        );
        return Err(ApiError::LowWater);
    }

    info!(
        request_id = %request_id,
        machine_id = %machine_id,
        "Manual motor command applied"
    );

    let response = MotorCommandResponse {
        probes: machine.motor_states(),
    };

    json_response(200, &response)
}

/// Handler for GET /machines/{id}/usage: per-day motor usage
///
/// Consolidation runs lazily here, on read: the motor event logs are folded
/// into the day buckets and the trimmed document is saved back before the
/// merged view is returned.
pub async fn get_usage(
    event: Request,
    config: &ControlConfig,
    machine_id: &str,
) -> Result<Response<Body>, ApiError> {
    let request_id = event.lambda_context().request_id.clone();

    let user = authenticate_user(&event, &config.dynamodb_client, &config.users_table).await?;

    if !machine_belongs_to_user(&user, machine_id) {
        return Err(NotFoundError::Machine.into());
    }

    let store = DynamoMachineStore::new(&config.dynamodb_client, &config.machines_table);
    let days = with_machine(&store, machine_id, |machine| {
        consolidate_machine(machine, config.utc_offset);
        merged_daily_usage(machine)
    })
    .await?
    .ok_or(NotFoundError::Machine)?;

    info!(
        request_id = %request_id,
        machine_id = %machine_id,
        day_count = days.len(),
        "Usage consolidated and served"
    );

    let response = UsageResponse { days };

    json_response(200, &response)
}

fn parse_body<T: serde::de::DeserializeOwned>(event: &Request) -> Result<T, ApiError> {
    let body_bytes = match event.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
        Body::Empty => {
            return Err(ValidationError::InvalidBody("Request body is empty".to_string()).into());
        }
    };

    serde_json::from_slice(body_bytes)
        .map_err(|e| ValidationError::InvalidBody(format!("Failed to parse JSON: {}", e)).into())
}

fn json_response<T: Serialize>(status: u16, payload: &T) -> Result<Response<Body>, ApiError> {
    let body = serde_json::to_string(payload)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
