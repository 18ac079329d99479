// src/sources/nominatim.rs - geocoding-by-name search and schema normalization
use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::matching::{email, phone, url};
use crate::models::candidate::{
    classify, Address, Candidate, CandidateIdentity, ContactInfo, Coordinates, SourceEntityKind,
};
use crate::models::matching::{MatchKind, ResolveRequest};

#[derive(Debug, Clone, Deserialize)]
struct NominatimPlace {
    osm_type: String,
    osm_id: i64,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    extratags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
    /// Remaining top-level fields; some deployments surface tag keys
    /// like "shop" here instead of inside extratags.
    #[serde(flatten)]
    root: BTreeMap<String, serde_json::Value>,
}

/// The source's address vocabulary. Settlement and region granularity
/// varies per record (city/town/village, state/province).
#[derive(Debug, Clone, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    house_number: Option<String>,
    postcode: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    province: Option<String>,
    country: Option<String>,
}

/// Client for the geocoding-by-name endpoint. Failures degrade to an
/// empty candidate list, same as the contact-attribute source.
pub struct NominatimClient {
    client: reqwest::Client,
    endpoint: String,
    limit: usize,
}

impl NominatimClient {
    pub fn new(client: reqwest::Client, endpoint: String, limit: usize) -> Self {
        Self {
            client,
            endpoint,
            limit,
        }
    }

    /// Searches by the request's name, scoped to its region when present.
    /// Callers must only invoke this with a name set; without one the
    /// search returns empty immediately.
    pub async fn search_by_name(&self, request: &ResolveRequest) -> Vec<Candidate> {
        let Some(name) = request.name() else {
            return Vec::new();
        };
        let query = match request.region() {
            Some(region) => format!("{}, {}", name, region),
            None => name.to_string(),
        };

        let places = match self.fetch(&query).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Nominatim: request failed, treating as no results: {:#}", e);
                return Vec::new();
            }
        };
        debug!("Nominatim: {} places returned for '{}'", places.len(), query);

        places
            .into_iter()
            .filter_map(|place| place_to_candidate(place, request))
            .collect()
    }

    async fn fetch(&self, query: &str) -> Result<Vec<NominatimPlace>> {
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("extratags", "1"),
                ("limit", limit.as_str()),
                ("namedetails", "1"),
            ])
            .send()
            .await
            .context("Nominatim request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("Nominatim returned status {}", response.status()));
        }
        response
            .json()
            .await
            .context("Nominatim returned malformed JSON")
    }
}

/// Maps a place record to the common candidate shape. Name evidence is
/// structural for this source; contact evidence is added only when the
/// place's own extratags independently match the caller's inputs.
fn place_to_candidate(place: NominatimPlace, request: &ResolveRequest) -> Option<Candidate> {
    let Some(kind) = SourceEntityKind::parse(&place.osm_type) else {
        warn!(
            "Nominatim: skipping place {} with unknown osm_type '{}'",
            place.osm_id, place.osm_type
        );
        return None;
    };
    let tags = place.extratags.unwrap_or_default();
    let address = place.address.unwrap_or_default();
    let coordinates = parse_coordinates(place.lat.as_deref(), place.lon.as_deref());
    let evidence = confirm_evidence(&tags, request);

    // Classification prefers extratags but falls back to string-valued
    // top-level fields carrying the same keys.
    let mut classification_tags: BTreeMap<String, String> = place
        .root
        .iter()
        .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
        .collect();
    classification_tags.extend(tags.clone());

    Some(Candidate {
        identity: CandidateIdentity {
            kind,
            id: place.osm_id,
        },
        name: place.display_name.unwrap_or_default(),
        classification: classify(&classification_tags),
        address: Address {
            street: non_empty(address.road),
            house_number: non_empty(address.house_number),
            postcode: non_empty(address.postcode),
            city: non_empty(address.city)
                .or_else(|| non_empty(address.town))
                .or_else(|| non_empty(address.village)),
            region: non_empty(address.state).or_else(|| non_empty(address.province)),
            country: non_empty(address.country),
        },
        contact: ContactInfo {
            phone: tag(&tags, "phone"),
            website: tag(&tags, "website"),
            email: tag(&tags, "email"),
        },
        raw_tags: tags,
        coordinates,
        evidence,
    })
}

fn confirm_evidence(
    tags: &BTreeMap<String, String>,
    request: &ResolveRequest,
) -> BTreeSet<MatchKind> {
    let mut evidence = BTreeSet::from([MatchKind::Name]);
    if let Some(input_phone) = request.phone() {
        if tags
            .get("phone")
            .is_some_and(|value| phone::phones_match(value, input_phone))
        {
            evidence.insert(MatchKind::Phone);
        }
    }
    if let Some(input_email) = request.email() {
        if tags
            .get("email")
            .is_some_and(|value| email::emails_match(value, input_email))
        {
            evidence.insert(MatchKind::Email);
        }
    }
    if let Some(input_website) = request.website() {
        if tags
            .get("website")
            .is_some_and(|value| url::urls_match(value, input_website))
        {
            evidence.insert(MatchKind::Website);
        }
    }
    evidence
}

fn parse_coordinates(lat: Option<&str>, lon: Option<&str>) -> Option<Coordinates> {
    let latitude = lat?.parse::<f64>().ok()?;
    let longitude = lon?.parse::<f64>().ok()?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn tag(tags: &BTreeMap<String, String>, key: &str) -> Option<String> {
    tags.get(key).filter(|v| !v.is_empty()).cloned()
}
