pub mod machines;
pub mod users;
