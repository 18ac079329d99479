// src/matching/email.rs - email equality for evidence confirmation
/// Lowercased, trimmed form used for comparisons.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Case-insensitive equality; empty strings never match anything.
pub fn emails_match(candidate_email: &str, input_email: &str) -> bool {
    let candidate = normalize_email(candidate_email);
    let input = normalize_email(input_email);
    !candidate.is_empty() && candidate == input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emails_match_case_insensitive() {
        assert!(emails_match("Info@Bakkerij.NL", "info@bakkerij.nl"));
        assert!(emails_match(" info@bakkerij.nl ", "info@bakkerij.nl"));
    }

    #[test]
    fn test_emails_differ() {
        assert!(!emails_match("info@bakkerij.nl", "sales@bakkerij.nl"));
    }

    #[test]
    fn test_empty_never_matches() {
        assert!(!emails_match("", ""));
        assert!(!emails_match("", "info@bakkerij.nl"));
    }
}
