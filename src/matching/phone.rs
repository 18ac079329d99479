// src/matching/phone.rs - country-code-aware phone canonicalization
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// ITU E.164 country calling codes, sorted by length descending so that a
/// longer code is matched before a shorter code sharing its leading digits
/// (e.g. "212" before "21"-less "2x" codes, "31" before "3").
static CALLING_CODES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut codes = vec![
        "1", "7", "20", "27", "30", "31", "32", "33", "34", "36", "39", "40", "41", "43", "44",
        "45", "46", "47", "48", "49", "51", "52", "53", "54", "55", "56", "57", "58", "60", "61",
        "62", "63", "64", "65", "66", "81", "82", "84", "86", "90", "91", "92", "93", "94", "95",
        "98", "211", "212", "213", "216", "218", "220", "221", "222", "223", "224", "225", "226",
        "227", "228", "229", "230", "231", "232", "233", "234", "235", "236", "237", "238", "239",
        "240", "241", "242", "243", "244", "245", "246", "247", "248", "249", "250", "251", "252",
        "253", "254", "255", "256", "257", "258", "260", "261", "262", "263", "264", "265", "266",
        "267", "268", "269", "290", "291", "297", "298", "299", "350", "351", "352", "353", "354",
        "355", "356", "357", "358", "359", "370", "371", "372", "373", "374", "375", "376", "377",
        "378", "379", "380", "381", "382", "383", "385", "386", "387", "389", "420", "421", "423",
        "500", "501", "502", "503", "504", "505", "506", "507", "508", "509", "590", "591", "592",
        "593", "594", "595", "596", "597", "598", "599", "670", "672", "673", "674", "675", "676",
        "677", "678", "679", "680", "681", "682", "683", "685", "686", "687", "688", "689", "690",
        "691", "692", "850", "852", "853", "855", "856", "870", "871", "872", "873", "874", "878",
        "880", "881", "882", "883", "886", "888", "960", "961", "962", "963", "964", "965", "966",
        "967", "968", "970", "971", "972", "973", "974", "975", "976", "977", "992", "993", "994",
        "995", "996", "997", "998", "999",
    ];
    codes.sort_by_key(|code| std::cmp::Reverse(code.len()));
    codes
});

/// A matching pattern derived from one canonical phone number: the calling
/// code in either "+" or "00" notation, followed by the subscriber digits
/// in order with arbitrary separators interspersed. Tolerates the
/// formatting differences (spaces, hyphens, parenthesized zeros) between
/// the canonical number and a source's free-text phone field.
#[derive(Debug, Clone)]
pub struct PhonePattern {
    pub calling_code: String,
    pattern: String,
    regex: Regex,
}

impl PhonePattern {
    /// The raw regex text, for queries against local strings.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// The pattern with backslashes doubled, as Overpass QL string
    /// literals require.
    pub fn overpass_escaped(&self) -> String {
        self.pattern.replace('\\', "\\\\")
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Turns a free-form phone string into matching patterns. A number that
/// cannot be recognized as international (no leading "+" or "00", or an
/// unknown calling code) yields no patterns: the phone then contributes
/// no constraint and no evidence, which is not an error.
pub fn canonicalize(phone: &str) -> Vec<PhonePattern> {
    let phone = phone.trim();
    let mut normalized = String::with_capacity(phone.len());
    for c in phone.chars() {
        // A "+" before the first digit is the international prefix, even
        // behind cosmetic characters as in "(+31) ..."; after a digit it
        // is just a separator.
        if c.is_ascii_digit() || (c == '+' && normalized.is_empty()) {
            normalized.push(c);
        }
    }
    if normalized.starts_with("00") {
        normalized.replace_range(..2, "+");
    }
    if !normalized.starts_with('+') {
        debug!("Phone '{}' is not in international notation, skipping", phone);
        return Vec::new();
    }

    let digits = &normalized[1..];
    let Some(code) = CALLING_CODES.iter().find(|code| digits.starts_with(**code)) else {
        debug!("Phone '{}' has no known calling code, skipping", phone);
        return Vec::new();
    };
    let subscriber = &digits[code.len()..];
    if subscriber.is_empty() {
        return Vec::new();
    }

    let mut pattern = format!("(\\+|00){}", code);
    for digit in subscriber.chars() {
        pattern.push_str(".*");
        pattern.push(digit);
    }
    match Regex::new(&pattern) {
        Ok(regex) => vec![PhonePattern {
            calling_code: code.to_string(),
            pattern,
            regex,
        }],
        Err(e) => {
            // Unreachable for digit-only input
            debug!("Failed to compile phone pattern '{}': {}", pattern, e);
            Vec::new()
        }
    }
}

/// Tests a source phone field against the patterns. The field may hold
/// multiple numbers separated by ";".
pub fn matches_any(candidate_field: &str, patterns: &[PhonePattern]) -> bool {
    if candidate_field.is_empty() || patterns.is_empty() {
        return false;
    }
    candidate_field
        .split(';')
        .map(str::trim)
        .any(|number| patterns.iter().any(|pattern| pattern.is_match(number)))
}

/// Convenience predicate over two free-form phone strings.
pub fn phones_match(candidate_field: &str, input_phone: &str) -> bool {
    matches_any(candidate_field, &canonicalize(input_phone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_dutch_mobile() {
        let patterns = canonicalize("+31 6 12345678");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].calling_code, "31");
        assert_eq!(
            patterns[0].as_str(),
            "(\\+|00)31.*6.*1.*2.*3.*4.*5.*6.*7.*8"
        );
        assert!(patterns[0].is_match("0031612345678"));
        assert!(patterns[0].is_match("+31-6-12345678"));
        assert!(!patterns[0].is_match("+4412345678"));
    }

    #[test]
    fn test_canonicalize_double_zero_prefix() {
        let patterns = canonicalize("0031515433154");
        assert_eq!(patterns.len(), 1);
        assert!(patterns[0].is_match("+31 515 433154"));
    }

    #[test]
    fn test_local_number_yields_no_patterns() {
        assert!(canonicalize("0612345678").is_empty());
        assert!(canonicalize("(0515) 43 31 54").is_empty());
        assert!(canonicalize("").is_empty());
    }

    #[test]
    fn test_plus_without_subscriber_digits() {
        assert!(canonicalize("+31").is_empty());
        assert!(canonicalize("+").is_empty());
    }

    #[test]
    fn test_longest_calling_code_wins() {
        // "212" (Morocco) must win over "21" falling through to "2x" codes
        let patterns = canonicalize("+212612345678");
        assert_eq!(patterns[0].calling_code, "212");
    }

    #[test]
    fn test_parenthesized_country_prefix() {
        let patterns = canonicalize("(+31) 515 433154");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].calling_code, "31");
        assert!(patterns[0].is_match("0031515433154"));
    }

    #[test]
    fn test_plus_only_stripped_inside() {
        // A "+" not in leading position is a separator, not a prefix
        let patterns = canonicalize("0031+515433154");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].calling_code, "31");
    }

    #[test]
    fn test_matches_any_semicolon_separated_field() {
        let patterns = canonicalize("+31515433154");
        assert!(matches_any("+31 88 123456; +31 515 433154", &patterns));
        assert!(!matches_any("+31 88 123456", &patterns));
        assert!(!matches_any("", &patterns));
    }

    #[test]
    fn test_overpass_escaped_doubles_backslashes() {
        let patterns = canonicalize("+3161");
        assert!(patterns[0].overpass_escaped().starts_with("(\\\\+|00)31"));
    }

    #[test]
    fn test_phones_match() {
        assert!(phones_match("+31 515 43 31 54", "0031515433154"));
        assert!(!phones_match("+32 515 43 31 54", "0031515433154"));
    }
}
