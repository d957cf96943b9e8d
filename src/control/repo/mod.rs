pub mod product_keys;
pub mod users;
