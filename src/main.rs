// src/main.rs - `locate` binary: resolve an organization to ranked location candidates
use anyhow::{Context, Result};
use clap::Parser;
use locator_lib::config::ResolverConfig;
use locator_lib::matching::manager::Resolver;
use locator_lib::models::candidate::Candidate;
use locator_lib::models::matching::{MatchKind, ResolveRequest};
use locator_lib::utils::env::load_env;
use log::info;

/// Find and rank candidate physical locations for a partially-known
/// organization, using the Overpass and Nominatim APIs.
#[derive(Parser, Debug)]
#[command(name = "locate", version, about)]
struct Args {
    /// Organization name
    #[arg(long)]
    name: Option<String>,

    /// Region to scope the name search to (repeat for several regions)
    #[arg(long)]
    region: Vec<String>,

    /// Phone number in international notation, e.g. "+31 515 433154"
    #[arg(long)]
    phone: Option<String>,

    /// Website URL
    #[arg(long)]
    website: Option<String>,

    /// Email address
    #[arg(long)]
    email: Option<String>,

    /// Maximum number of candidates to display
    #[arg(long, default_value_t = 8)]
    limit: usize,

    /// Print the full ranked list as JSON instead of a numbered list
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = Args::parse();

    let config = ResolverConfig::from_env();
    config.log_config();
    let resolver = Resolver::new(&config)?;

    let request = ResolveRequest {
        name: args.name,
        region: args.region.first().cloned(),
        phone: args.phone,
        website: args.website,
        email: args.email,
    };
    info!("🔎 Resolving organization location candidates");

    let candidates = if args.region.len() > 1 {
        resolver.resolve_in_regions(&request, &args.region).await
    } else {
        resolver.resolve(&request).await
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&candidates)
                .context("Failed to serialize candidates to JSON")?
        );
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No candidates found. Try broader attributes or enter the location manually.");
        return Ok(());
    }

    println!("Found {} candidate(s):", candidates.len());
    for (i, candidate) in candidates.iter().take(args.limit).enumerate() {
        println!("{}. {}", i + 1, render_candidate(candidate));
    }
    if candidates.len() > args.limit {
        println!("... and {} more (raise --limit to see them)", candidates.len() - args.limit);
    }

    Ok(())
}

fn render_candidate(candidate: &Candidate) -> String {
    let mut parts = Vec::new();
    if candidate.name.is_empty() {
        parts.push("(unnamed)".to_string());
    } else {
        parts.push(candidate.name.clone());
    }
    parts.push(format!("[{}]", candidate.identity.token()));
    if let Some(classification) = &candidate.classification {
        parts.push(format!("{}={}", classification.category, classification.value));
    }
    if let Some(address) = render_address(candidate) {
        parts.push(address);
    }
    let evidence: Vec<&str> = candidate.evidence.iter().map(MatchKind::as_str).collect();
    parts.push(format!("evidence: {}", evidence.join(", ")));
    parts.join(" | ")
}

fn render_address(candidate: &Candidate) -> Option<String> {
    let address = &candidate.address;
    if address.is_empty() {
        return None;
    }
    let mut line = Vec::new();
    if let Some(street) = &address.street {
        match &address.house_number {
            Some(number) => line.push(format!("{} {}", street, number)),
            None => line.push(street.clone()),
        }
    }
    if let Some(city) = &address.city {
        line.push(city.clone());
    }
    if let Some(region) = &address.region {
        line.push(region.clone());
    }
    if let Some(country) = &address.country {
        line.push(country.clone());
    }
    if line.is_empty() {
        None
    } else {
        Some(line.join(", "))
    }
}
