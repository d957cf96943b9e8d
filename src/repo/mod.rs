pub mod product_keys;
