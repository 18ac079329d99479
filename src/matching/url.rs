// src/matching/url.rs - website URL normalization for evidence confirmation
use url::Url;

/// Canonical form for comparing website values: the parsed URL rendered
/// without its trailing slash, lowercased. A value that does not parse as
/// an absolute URL (sources often record bare domains) falls back to the
/// same trailing-slash/case treatment on the raw string.
pub fn normalize_url(value: &str) -> String {
    let value = value.trim();
    match Url::parse(value) {
        Ok(parsed) => parsed.as_str().trim_end_matches('/').to_lowercase(),
        Err(_) => value.trim_end_matches('/').to_lowercase(),
    }
}

/// Normalized equality; empty strings never match anything.
pub fn urls_match(candidate_url: &str, input_url: &str) -> bool {
    let candidate = normalize_url(candidate_url);
    let input = normalize_url(input_url);
    !candidate.is_empty() && candidate == input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_and_case() {
        assert_eq!(
            normalize_url("https://Bakkerij.example/"),
            "https://bakkerij.example"
        );
        assert!(urls_match(
            "https://bakkerij.example",
            "https://Bakkerij.example/"
        ));
    }

    #[test]
    fn test_bare_domain_fallback() {
        assert_eq!(normalize_url("Bakkerij.example/"), "bakkerij.example");
        assert!(urls_match("bakkerij.example", "Bakkerij.example/"));
    }

    #[test]
    fn test_scheme_mismatch_does_not_match() {
        // Preserved source behavior: the scheme is part of the canonical form
        assert!(!urls_match(
            "http://bakkerij.example",
            "https://bakkerij.example"
        ));
    }

    #[test]
    fn test_empty_never_matches() {
        assert!(!urls_match("", ""));
    }
}
