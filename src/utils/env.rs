// src/utils/env.rs
use log::debug;

/// Loads a .env file if one is present. Absence is not an error; the
/// process environment is used as-is.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(_) => debug!("No .env file found, using process environment"),
    }
}
