// src/sources/overpass.rs - contact-attribute search against the bulk spatial-tag source
use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::matching::phone::{self, PhonePattern};
use crate::matching::{email, url};
use crate::models::candidate::{
    classify, Address, Candidate, CandidateIdentity, ContactInfo, Coordinates, SourceEntityKind,
};
use crate::models::matching::{MatchKind, ResolveRequest};
use crate::utils::rate_limit::RateGovernor;

/// Tag keys an organization may record its phone number under.
const PHONE_FIELDS: [&str; 5] = [
    "phone",
    "contact:phone",
    "telephone",
    "contact:mobile",
    "mobile",
];

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Clone, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

/// Client for the Overpass union-query endpoint. Every outbound call is
/// gated by the shared rate governor; any failure degrades to an empty
/// candidate list.
pub struct OverpassClient {
    client: reqwest::Client,
    endpoint: String,
    governor: Arc<RateGovernor>,
}

impl OverpassClient {
    pub fn new(client: reqwest::Client, endpoint: String, governor: Arc<RateGovernor>) -> Self {
        Self {
            client,
            endpoint,
            governor,
        }
    }

    /// Searches for entities carrying any of the request's phone, website
    /// or email values. With no usable attribute, returns empty without
    /// touching the network.
    pub async fn search_by_attributes(&self, request: &ResolveRequest) -> Vec<Candidate> {
        let patterns = request
            .phone()
            .map(phone::canonicalize)
            .unwrap_or_default();
        let Some(query) = build_query(&patterns, request.website(), request.email()) else {
            debug!("Overpass: no contact attributes to query, skipping");
            return Vec::new();
        };

        self.governor.acquire().await;
        let elements = match self.fetch(&query).await {
            Ok(elements) => elements,
            Err(e) => {
                warn!("Overpass: request failed, treating as no results: {:#}", e);
                return Vec::new();
            }
        };
        debug!("Overpass: {} raw elements returned", elements.len());

        dedup_elements(elements)
            .into_iter()
            .filter_map(|element| element_to_candidate(element, request, &patterns))
            .collect()
    }

    async fn fetch(&self, query: &str) -> Result<Vec<OverpassElement>> {
        debug!("Overpass query:\n{}", query);
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .await
            .context("Overpass request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("Overpass returned status {}", response.status()));
        }
        let body: OverpassResponse = response
            .json()
            .await
            .context("Overpass returned malformed JSON")?;
        Ok(body.elements)
    }
}

/// Builds the batched union query, one clause per attribute constraint.
/// Returns None when no attribute produces a clause.
fn build_query(
    phone_patterns: &[PhonePattern],
    website: Option<&str>,
    email: Option<&str>,
) -> Option<String> {
    let mut clauses = Vec::new();
    for pattern in phone_patterns {
        for field in PHONE_FIELDS {
            clauses.push(format!(
                "node[\"{}\"~\"{}\"];",
                field,
                pattern.overpass_escaped()
            ));
        }
    }
    if let Some(website) = website {
        clauses.push(attribute_clause("website", website));
    }
    if let Some(email) = email {
        clauses.push(attribute_clause("email", email));
    }
    if clauses.is_empty() {
        return None;
    }
    Some(format!(
        "[out:json][timeout:25];\n(\n{}\n);\nout body;",
        clauses.join("\n")
    ))
}

/// Case-insensitive substring clause across node/way/relation.
fn attribute_clause(field: &str, value: &str) -> String {
    let escaped = escape_for_overpass(value);
    format!(
        "node[\"{field}\"~\"{escaped}\",i];way[\"{field}\"~\"{escaped}\",i];relation[\"{field}\"~\"{escaped}\",i];"
    )
}

/// Escapes a literal value for use inside an Overpass QL regex string:
/// regex metacharacters get a doubled backslash (one level consumed by
/// the QL string parser), quotes get a single one.
fn escape_for_overpass(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^'
            | '$' => {
                escaped.push_str("\\\\");
                escaped.push(c);
            }
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Deduplicates raw elements by (type, id). The later element wins but
/// keeps the first occurrence's position, matching keyed-map semantics.
fn dedup_elements(elements: Vec<OverpassElement>) -> Vec<OverpassElement> {
    let mut positions: HashMap<(String, i64), usize> = HashMap::new();
    let mut deduped: Vec<OverpassElement> = Vec::new();
    for element in elements {
        let key = (element.kind.clone(), element.id);
        match positions.get(&key) {
            Some(&i) => deduped[i] = element,
            None => {
                positions.insert(key, deduped.len());
                deduped.push(element);
            }
        }
    }
    deduped
}

/// Maps a raw element to the common candidate shape. Elements with an
/// unknown type are skipped rather than guessed at.
fn element_to_candidate(
    element: OverpassElement,
    request: &ResolveRequest,
    phone_patterns: &[PhonePattern],
) -> Option<Candidate> {
    let Some(kind) = SourceEntityKind::parse(&element.kind) else {
        warn!(
            "Overpass: skipping element {} with unknown type '{}'",
            element.id, element.kind
        );
        return None;
    };
    let tags = element.tags.unwrap_or_default();
    let coordinates = match (element.lat, element.lon, element.center) {
        (Some(lat), Some(lon), _) => Some(Coordinates {
            latitude: lat,
            longitude: lon,
        }),
        (_, _, Some(center)) => Some(Coordinates {
            latitude: center.lat,
            longitude: center.lon,
        }),
        _ => None,
    };
    let evidence = confirm_evidence(&tags, request, phone_patterns);

    Some(Candidate {
        identity: CandidateIdentity {
            kind,
            id: element.id,
        },
        name: tag(&tags, "name").unwrap_or_default(),
        classification: classify(&tags),
        address: Address {
            street: tag(&tags, "addr:street"),
            house_number: tag(&tags, "addr:housenumber"),
            postcode: tag(&tags, "addr:postcode"),
            city: tag(&tags, "addr:city"),
            region: tag(&tags, "addr:region").or_else(|| tag(&tags, "addr:province")),
            country: tag(&tags, "addr:country"),
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

/// Recomputes evidence from the element's own tags. A union query does
/// not report which branch fired, so each input is re-tested here; with
/// nothing confirmed the candidate still carries "other".
fn confirm_evidence(
    tags: &BTreeMap<String, String>,
    request: &ResolveRequest,
    phone_patterns: &[PhonePattern],
) -> BTreeSet<MatchKind> {
    let mut evidence = BTreeSet::new();
    let phone_confirmed = PHONE_FIELDS
        .iter()
        .filter_map(|field| tags.get(*field))
        .any(|value| phone::matches_any(value, phone_patterns));
    if phone_confirmed {
        evidence.insert(MatchKind::Phone);
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
    if evidence.is_empty() {
        evidence.insert(MatchKind::Other);
    }
    evidence
}

fn tag(tags: &BTreeMap<String, String>, key: &str) -> Option<String> {
    tags.get(key).filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(phone: Option<&str>, website: Option<&str>, email: Option<&str>) -> ResolveRequest {
        ResolveRequest {
            phone: phone.map(str::to_string),
            website: website.map(str::to_string),
            email: email.map(str::to_string),
            ..Default::default()
        }
    }

    fn patterns_for(request: &ResolveRequest) -> Vec<PhonePattern> {
        request.phone().map(phone::canonicalize).unwrap_or_default()
    }

    #[test]
    fn test_build_query_phone_clause_per_field() {
        let patterns = phone::canonicalize("+31612345678");
        let query = build_query(&patterns, None, None).unwrap();
        assert_eq!(query.matches("node[\"").count(), PHONE_FIELDS.len());
        assert!(query.contains("node[\"contact:mobile\"~\"(\\\\+|00)31"));
        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.ends_with("out body;"));
    }

    #[test]
    fn test_build_query_website_and_email_span_entity_kinds() {
        let query = build_query(&[], Some("bakkerij.example"), Some("info@bakkerij.example"))
            .unwrap();
        assert!(query.contains("node[\"website\"~\"bakkerij\\\\.example\",i];"));
        assert!(query.contains("relation[\"website\"~\"bakkerij\\\\.example\",i];"));
        assert!(query.contains("way[\"email\"~\"info@bakkerij\\\\.example\",i];"));
    }

    #[test]
    fn test_build_query_empty_attributes_yields_none() {
        assert!(build_query(&[], None, None).is_none());
    }

    #[test]
    fn test_escape_for_overpass() {
        assert_eq!(escape_for_overpass("a.b+c"), "a\\\\.b\\\\+c");
        assert_eq!(escape_for_overpass("say \"hi\""), "say \\\"hi\\\"");
    }

    #[test]
    fn test_dedup_later_element_wins_first_position() {
        let elements: Vec<OverpassElement> = serde_json::from_value(json!([
            {"type": "node", "id": 1, "tags": {"name": "old"}},
            {"type": "way", "id": 2},
            {"type": "node", "id": 1, "tags": {"name": "new"}}
        ]))
        .unwrap();
        let deduped = dedup_elements(elements);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, 1);
        assert_eq!(
            deduped[0].tags.as_ref().unwrap().get("name").unwrap(),
            "new"
        );
    }

    #[test]
    fn test_element_mapping_and_evidence() {
        let element: OverpassElement = serde_json::from_value(json!({
            "type": "node",
            "id": 123456,
            "lat": 53.03,
            "lon": 5.66,
            "tags": {
                "name": "Bakkerij Jansen",
                "shop": "bakery",
                "addr:street": "Hoofdstraat",
                "addr:housenumber": "12",
                "addr:city": "Sneek",
                "phone": "+31 515 43 31 54",
                "email": "info@bakkerij.example"
            }
        }))
        .unwrap();
        let input = request(Some("0031515433154"), None, Some("INFO@bakkerij.example"));
        let candidate = element_to_candidate(element, &input, &patterns_for(&input)).unwrap();

        assert_eq!(candidate.identity.token(), "node/123456");
        assert_eq!(candidate.name, "Bakkerij Jansen");
        assert_eq!(candidate.classification.as_ref().unwrap().value, "bakery");
        assert_eq!(candidate.address.street.as_deref(), Some("Hoofdstraat"));
        assert_eq!(candidate.coordinates.unwrap().latitude, 53.03);
        assert_eq!(
            candidate.evidence,
            [MatchKind::Phone, MatchKind::Email].into_iter().collect()
        );
    }

    #[test]
    fn test_unconfirmed_evidence_falls_back_to_other() {
        let element: OverpassElement = serde_json::from_value(json!({
            "type": "way",
            "id": 9,
            "center": {"lat": 52.0, "lon": 4.9},
            "tags": {"phone": "+31 88 0000000"}
        }))
        .unwrap();
        let input = request(Some("+31612345678"), None, None);
        let candidate = element_to_candidate(element, &input, &patterns_for(&input)).unwrap();
        assert_eq!(
            candidate.evidence,
            [MatchKind::Other].into_iter().collect()
        );
        // way coordinates come from the center
        assert_eq!(candidate.coordinates.unwrap().longitude, 4.9);
    }

    #[test]
    fn test_unknown_element_type_is_skipped() {
        let element: OverpassElement =
            serde_json::from_value(json!({"type": "area", "id": 5})).unwrap();
        assert!(element_to_candidate(element, &request(None, None, None), &[]).is_none());
    }

    #[tokio::test]
    async fn test_no_attributes_issues_no_call() {
        // The query builder yields no clauses, so the unroutable
        // endpoint below is never contacted.
        let client = OverpassClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:0/interpreter".to_string(),
            Arc::new(RateGovernor::new(std::time::Duration::from_millis(0))),
        );
        let results = client.search_by_attributes(&request(None, None, None)).await;
        assert!(results.is_empty());
    }
}
