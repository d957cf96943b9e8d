use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Threshold encoding for manual mode in stored documents and API payloads
pub const MANUAL_MODE_SENTINEL: i32 = -1;

/// Maximum number of soil-moisture probes a machine can carry
pub const MAX_PROBES: usize = 4;

/// Default values applied when a machine is first registered
pub const DEFAULT_MOISTURE_PCT: i32 = 50;
pub const DEFAULT_THRESHOLD_PCT: i32 = 50;
pub const DEFAULT_TANK_LEVEL_PCT: i32 = 50;

/// Motor control mode for a machine
///
/// In memory this is a tagged variant; in stored documents and API payloads
/// it is encoded as the integer field `threshold_moisture` in [-1, 100],
/// where -1 means manual mode. Existing documents and consumers rely on
/// that encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Motor states derived from per-probe threshold comparison
    Automatic { threshold: i32 },
    /// Motor states set directly by operator commands
    Manual,
}

impl ControlMode {
    /// Decode from the stored `threshold_moisture` integer
    pub fn from_threshold(value: i32) -> Self {
        if value == MANUAL_MODE_SENTINEL {
            ControlMode::Manual
        } else {
            ControlMode::Automatic { threshold: value }
        }
    }

    /// Encode to the stored `threshold_moisture` integer
    pub fn to_threshold(self) -> i32 {
        match self {
            ControlMode::Automatic { threshold } => threshold,
            ControlMode::Manual => MANUAL_MODE_SENTINEL,
        }
    }

    pub fn is_manual(self) -> bool {
        matches!(self, ControlMode::Manual)
    }
}

impl Serialize for ControlMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.to_threshold())
    }
}

impl<'de> Deserialize<'de> for ControlMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        if !(MANUAL_MODE_SENTINEL..=100).contains(&value) {
            return Err(serde::de::Error::custom(format!(
                "threshold_moisture {} outside [-1, 100]",
                value
            )));
        }
        Ok(ControlMode::from_threshold(value))
    }
}

/// Water tank history entry (throttled append)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterTankEntry {
    pub water_level: i32,
    pub created_at: DateTime<Utc>,
}

/// Soil moisture history entry (throttled append)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilMoistureEntry {
    pub moisture_level: i32,
    pub created_at: DateTime<Utc>,
}

/// Motor on/off boundary event (edge-triggered append)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorEvent {
    pub is_motor_on: bool,
    pub created_at: DateTime<Utc>,
}

/// Cumulative motor-on minutes for one local calendar day
///
/// `created_at` marks the day, not an instant. Derived from the motor log by
/// the consolidation engine; only the last entry's duration is ever
/// incremented in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsageEntry {
    pub duration_minutes: i64,
    pub created_at: NaiveDate,
}

/// One independent soil-moisture sensor / motor-control unit on a machine
///
/// A single-probe machine is the N=1 degenerate case of the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    /// Latest reported moisture percentage [0, 100]
    pub moisture: i32,
    /// Commanded motor state for this probe
    pub is_motor_on: bool,
    pub soil_moisture_log: Vec<SoilMoistureEntry>,
    pub motor_log: Vec<MotorEvent>,
    pub motor_usage_per_day: Vec<DailyUsageEntry>,
}

impl Probe {
    pub fn new() -> Self {
        Self {
            moisture: DEFAULT_MOISTURE_PCT,
            is_motor_on: false,
            soil_moisture_log: Vec::new(),
            motor_log: Vec::new(),
            motor_usage_per_day: Vec::new(),
        }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::new()
    }
}

/// Machine document, one per registered physical device
///
/// Stored whole in DynamoDB and always read/written as a whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: String,
    pub product_key: String,
    pub name: String,
    pub address: String,
    pub probes: Vec<Probe>,
    #[serde(rename = "threshold_moisture")]
    pub mode: ControlMode,
    /// Latest reported tank level percentage [0, 100]
    pub water_tank_level: i32,
    pub water_tank_log: Vec<WaterTankEntry>,
}

impl Machine {
    /// Create a freshly registered machine with default readings and
    /// `probe_count` probes (1..=4, enforced by the registration handler)
    pub fn new(
        machine_id: impl Into<String>,
        product_key: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        probe_count: usize,
    ) -> Self {
        Self {
            machine_id: machine_id.into(),
            product_key: product_key.into(),
            name: name.into(),
            address: address.into(),
            probes: (0..probe_count).map(|_| Probe::new()).collect(),
            mode: ControlMode::Automatic {
                threshold: DEFAULT_THRESHOLD_PCT,
            },
            water_tank_level: DEFAULT_TANK_LEVEL_PCT,
            water_tank_log: Vec::new(),
        }
    }

    /// Commanded motor states, one per probe in probe order
    pub fn motor_states(&self) -> Vec<bool> {
        self.probes.iter().map(|p| p.is_motor_on).collect()
    }
}

/// Factory-provisioned product key record
///
/// `is_registered` is the mutex flag: a key backs at most one registered
/// machine at a time. The raw 10-character auth code is never stored, only
/// its peppered hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductKey {
    pub product_key: String,
    pub auth_code_hash: String,
    pub is_registered: bool,
}

impl ProductKey {
    /// Claim the key for a new machine registration.
    /// Returns false if it already backs a registered machine.
    pub fn claim(&mut self) -> bool {
        if self.is_registered {
            false
        } else {
            self.is_registered = true;
            true
        }
    }

    /// Release the key when its machine is deleted
    pub fn release(&mut self) {
        self.is_registered = false;
    }
}

/// User account owning zero or more machines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Hash of the current session token, set on login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token_hash: Option<String>,
    /// Ids of machines this user owns
    pub machines: Vec<String>,
}
