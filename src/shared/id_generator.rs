use uuid::Uuid;

/// IdGenerator trait for abstracting UUID generation
/// Provides method for generating UUID v4 identifiers (machine and user ids)
pub trait IdGenerator: Send + Sync {
    /// Generate a new UUID v4
    /// Returns a string representation of the UUID in hyphenated lowercase format
    fn uuid_v4(&self) -> String;
}

/// Production implementation of IdGenerator using random UUID generation
#[derive(Debug, Clone, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn uuid_v4(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Test implementation of IdGenerator returning a fixed sequence of ids
/// Useful for deterministic testing; wraps around when exhausted
#[derive(Debug, Clone)]
pub struct FixedIdGenerator {
    uuids: Vec<String>,
    index: std::sync::Arc<std::sync::Mutex<usize>>,
}

impl FixedIdGenerator {
    /// Create a new FixedIdGenerator with a list of UUIDs to return in sequence
    pub fn new(uuids: Vec<String>) -> Self {
        Self {
            uuids,
            index: std::sync::Arc::new(std::sync::Mutex::new(0)),
        }
    }

    /// Create a FixedIdGenerator that always returns the same UUID
    pub fn single(uuid: impl Into<String>) -> Self {
        Self::new(vec![uuid.into()])
    }
}

impl IdGenerator for FixedIdGenerator {
    fn uuid_v4(&self) -> String {
        let mut index = self.index.lock().unwrap();
        let uuid = self.uuids[*index % self.uuids.len()].clone();
        *index += 1;
        uuid
    }
}
