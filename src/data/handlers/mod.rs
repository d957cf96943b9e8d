pub mod motor_status;
pub mod telemetry;
