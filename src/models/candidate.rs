// src/models/candidate.rs - the common candidate shape both sources map into
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::matching::MatchKind;

/// Tag keys that classify an entity as a kind of organization, in priority
/// order. The first key present in the tag map wins.
const CLASSIFICATION_KEYS: [&str; 11] = [
    "shop",
    "amenity",
    "office",
    "craft",
    "industrial",
    "tourism",
    "leisure",
    "healthcare",
    "religion",
    "farm",
    "landuse",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceEntityKind {
    Node,
    Way,
    Relation,
}

impl SourceEntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceEntityKind::Node => "node",
            SourceEntityKind::Way => "way",
            SourceEntityKind::Relation => "relation",
        }
    }

    /// Parses a source entity type. Both sources use the same vocabulary,
    /// though Nominatim capitalizes it in some deployments.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "node" => Some(SourceEntityKind::Node),
            "way" => Some(SourceEntityKind::Way),
            "relation" => Some(SourceEntityKind::Relation),
            _ => None,
        }
    }
}

/// Composite identity of a source entity, stable within one query.
/// Serializes to its display token, e.g. "node/123456".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateIdentity {
    pub kind: SourceEntityKind,
    pub id: i64,
}

impl CandidateIdentity {
    pub fn token(&self) -> String {
        format!("{}/{}", self.kind.as_str(), self.id)
    }
}

impl Serialize for CandidateIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.house_number.is_none()
            && self.postcode.is_none()
            && self.city.is_none()
            && self.region.is_none()
            && self.country.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A (category, value) pair such as ("shop", "bakery").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: String,
    pub value: String,
}

/// A prospective real-world place, created fresh per resolve invocation
/// and discarded after the ranked list is returned.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub identity: CandidateIdentity,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    pub address: Address,
    pub contact: ContactInfo,
    pub raw_tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub evidence: BTreeSet<MatchKind>,
}

impl Candidate {
    /// Lowest priority number among the evidence kinds; used as the
    /// tie-break key when two candidates carry the same amount of evidence.
    pub fn best_evidence_priority(&self) -> u8 {
        self.evidence
            .iter()
            .map(MatchKind::priority)
            .min()
            .unwrap_or(u8::MAX)
    }

    /// Folds a same-identity candidate from a second source into this one:
    /// evidence sets are unioned and any non-empty field from `other`
    /// overwrites the existing value (later write wins).
    pub fn absorb(&mut self, other: Candidate) {
        self.evidence.extend(other.evidence);
        if !other.name.is_empty() {
            self.name = other.name;
        }
        if other.classification.is_some() {
            self.classification = other.classification;
        }
        merge_field(&mut self.address.street, other.address.street);
        merge_field(&mut self.address.house_number, other.address.house_number);
        merge_field(&mut self.address.postcode, other.address.postcode);
        merge_field(&mut self.address.city, other.address.city);
        merge_field(&mut self.address.region, other.address.region);
        merge_field(&mut self.address.country, other.address.country);
        merge_field(&mut self.contact.phone, other.contact.phone);
        merge_field(&mut self.contact.website, other.contact.website);
        merge_field(&mut self.contact.email, other.contact.email);
        if other.coordinates.is_some() {
            self.coordinates = other.coordinates;
        }
        self.raw_tags.extend(other.raw_tags);
    }
}

fn merge_field(existing: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming.filter(|v| !v.is_empty()) {
        *existing = Some(value);
    }
}

/// Priority scan over the fixed classification key list. A generic
/// "landuse" tag only qualifies with the value "farmland"; other land-use
/// values are agricultural parcels, not organizations.
pub fn classify(tags: &BTreeMap<String, String>) -> Option<Classification> {
    for key in CLASSIFICATION_KEYS {
        let Some(value) = tags.get(key).filter(|v| !v.is_empty()) else {
            continue;
        };
        if key == "landuse" && value != "farmland" {
            continue;
        }
        return Some(Classification {
            category: key.to_string(),
            value: value.clone(),
        });
    }
    None
}
