// src/lib.rs
pub mod config;
pub mod matching;
pub mod models;
pub mod sources;
pub mod utils;

pub use config::ResolverConfig;
pub use matching::manager::Resolver;
pub use models::candidate::Candidate;
pub use models::matching::{MatchKind, ResolveRequest};
