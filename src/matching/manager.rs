// src/matching/manager.rs - merges both sources and ranks the disambiguation list
use anyhow::{Context, Result};
use futures::future::join_all;
use log::{debug, info, warn};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ResolverConfig;
use crate::models::candidate::{Candidate, CandidateIdentity};
use crate::models::matching::ResolveRequest;
use crate::sources::nominatim::NominatimClient;
use crate::sources::overpass::OverpassClient;
use crate::utils::rate_limit::RateGovernor;

/// The engine's public entry point: fans a request out to the
/// contact-attribute source and the name source, merges duplicates by
/// identity and returns candidates ordered by evidence strength. Every
/// failure mode below this type reduces to fewer or zero candidates.
pub struct Resolver {
    overpass: OverpassClient,
    nominatim: NominatimClient,
}

impl Resolver {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        if config.user_agent.is_empty() {
            warn!(
                "No user agent configured; outbound requests will not carry \
                 a descriptive client identifier"
            );
        }
        let mut builder = reqwest::Client::builder().timeout(config.http_timeout);
        if !config.user_agent.is_empty() {
            builder = builder.user_agent(config.user_agent.clone());
        }
        let client = builder
            .build()
            .context("Failed to build HTTP client for resolver")?;

        let governor = Arc::new(RateGovernor::new(config.overpass_min_interval));
        Ok(Self {
            overpass: OverpassClient::new(client.clone(), config.overpass_url.clone(), governor),
            nominatim: NominatimClient::new(
                client,
                config.nominatim_url.clone(),
                config.name_search_limit,
            ),
        })
    }

    /// Resolves one request: contact-attribute search when any of
    /// phone/website/email is present, name search when a name is
    /// present, merged and ranked. An empty request returns an empty
    /// list without any outbound call; so do two empty source answers.
    pub async fn resolve(&self, request: &ResolveRequest) -> Vec<Candidate> {
        let contact_results = if request.has_contact_attribute() {
            self.overpass.search_by_attributes(request).await
        } else {
            Vec::new()
        };
        let name_results = if request.name().is_some() {
            self.nominatim.search_by_name(request).await
        } else {
            Vec::new()
        };
        debug!(
            "Resolve: {} contact-attribute candidates, {} name candidates",
            contact_results.len(),
            name_results.len()
        );

        let merged = merge_candidates(contact_results, name_results);
        info!("Resolve: {} ranked candidates", merged.len());
        merged
    }

    /// Variant for callers scoping a search to several regions: one
    /// contact-attribute search plus one name search per region, the
    /// region searches running concurrently. Fan-out is bounded only by
    /// the number of regions requested.
    pub async fn resolve_in_regions(
        &self,
        request: &ResolveRequest,
        regions: &[String],
    ) -> Vec<Candidate> {
        if regions.is_empty() {
            return self.resolve(request).await;
        }

        let contact_results = if request.has_contact_attribute() {
            self.overpass.search_by_attributes(request).await
        } else {
            Vec::new()
        };

        let name_results = if request.name().is_some() {
            let searches = regions.iter().map(|region| {
                let mut scoped = request.clone();
                scoped.region = Some(region.clone());
                async move { self.nominatim.search_by_name(&scoped).await }
            });
            join_all(searches).await.into_iter().flatten().collect()
        } else {
            Vec::new()
        };

        merge_candidates(contact_results, name_results)
    }
}

/// Merges the two source answers by identity and ranks the result.
/// Contact-attribute candidates are applied first; a same-identity name
/// candidate unions its evidence in and overwrites any field it has a
/// non-empty value for (later write wins, callers must not rely on a
/// fixed tie winner).
pub fn merge_candidates(
    contact_results: Vec<Candidate>,
    name_results: Vec<Candidate>,
) -> Vec<Candidate> {
    let mut positions: HashMap<CandidateIdentity, usize> = HashMap::new();
    let mut merged: Vec<Candidate> = Vec::new();
    for candidate in contact_results.into_iter().chain(name_results) {
        match positions.get(&candidate.identity) {
            Some(&i) => merged[i].absorb(candidate),
            None => {
                positions.insert(candidate.identity, merged.len());
                merged.push(candidate);
            }
        }
    }
    rank_candidates(&mut merged);
    merged
}

/// More distinct evidence kinds first; among equals, the strongest
/// single kind (lowest priority number) first. The sort is stable, so
/// full ties keep insertion order.
fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by_key(|candidate| {
        (
            Reverse(candidate.evidence.len()),
            candidate.best_evidence_priority(),
        )
    });
}
