// src/sources/mod.rs
pub mod nominatim;
pub mod overpass;
