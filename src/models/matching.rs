// src/models/matching.rs - evidence kinds and the resolve request shape
use serde::Serialize;

/// The kind of input attribute that caused a candidate to be proposed.
/// Declaration order is the ranking priority: phone is the strongest
/// evidence, "other" the weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Phone,
    Email,
    Website,
    Name,
    Other,
}

impl MatchKind {
    /// Ranking priority, lower is stronger.
    pub fn priority(&self) -> u8 {
        match self {
            MatchKind::Phone => 1,
            MatchKind::Email => 2,
            MatchKind::Website => 3,
            MatchKind::Name => 4,
            MatchKind::Other => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Phone => "phone",
            MatchKind::Email => "email",
            MatchKind::Website => "website",
            MatchKind::Name => "name",
            MatchKind::Other => "other",
        }
    }
}

/// Attributes of a partially-known organization. All fields optional;
/// empty strings are treated the same as absent fields.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub name: Option<String>,
    pub region: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
}

impl ResolveRequest {
    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn region(&self) -> Option<&str> {
        non_empty(&self.region)
    }

    pub fn phone(&self) -> Option<&str> {
        non_empty(&self.phone)
    }

    pub fn website(&self) -> Option<&str> {
        non_empty(&self.website)
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(&self.email)
    }

    /// True when at least one of phone/website/email is usable, i.e. the
    /// contact-attribute source is worth querying.
    pub fn has_contact_attribute(&self) -> bool {
        self.phone().is_some() || self.website().is_some() || self.email().is_some()
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(MatchKind::Phone.priority() < MatchKind::Email.priority());
        assert!(MatchKind::Email.priority() < MatchKind::Website.priority());
        assert!(MatchKind::Website.priority() < MatchKind::Name.priority());
        assert!(MatchKind::Name.priority() < MatchKind::Other.priority());
        // BTreeSet iteration order must agree with priority
        assert!(MatchKind::Phone < MatchKind::Other);
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let request = ResolveRequest {
            name: Some("  ".to_string()),
            phone: Some(String::new()),
            ..Default::default()
        };
        assert!(request.name().is_none());
        assert!(request.phone().is_none());
        assert!(!request.has_contact_attribute());
    }

    #[test]
    fn test_has_contact_attribute() {
        let request = ResolveRequest {
            email: Some("info@bakkerij.nl".to_string()),
            ..Default::default()
        };
        assert!(request.has_contact_attribute());
        assert!(request.name().is_none());
    }
}
