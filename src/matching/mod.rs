// src/matching/mod.rs
pub mod email;
pub mod manager;
pub mod phone;
pub mod url;
