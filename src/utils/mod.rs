// src/utils/mod.rs
pub mod env;
pub mod rate_limit;
