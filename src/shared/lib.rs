// Declare modules at the root level
pub mod actuation;
pub mod domain;
pub mod error;
pub mod history;
pub mod id_generator;
pub mod store;
pub mod time;
pub mod usage;
pub mod validators;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::actuation;
    pub use super::domain;
    pub use super::error;
    pub use super::history;
    pub use super::id_generator;
    pub use super::store;
    pub use super::time;
    pub use super::usage;
    pub use super::validators;
}

// Also re-export at root for convenience
pub use actuation::*;
pub use domain::*;
pub use error::*;
pub use history::*;
pub use id_generator::*;
pub use store::*;
pub use time::*;
pub use usage::*;
pub use validators::*;
