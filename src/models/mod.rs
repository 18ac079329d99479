// src/models/mod.rs
pub mod candidate;
pub mod matching;

pub use candidate::{
    Address, Candidate, CandidateIdentity, Classification, ContactInfo, Coordinates,
    SourceEntityKind,
};
pub use matching::{MatchKind, ResolveRequest};
