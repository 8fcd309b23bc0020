use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").unwrap();
}

/// Redacts a login identifier for use as a structured log field.
///
/// The whole value is replaced by a short correlation hash; nothing the
/// caller typed is ever echoed. Exactly one address hashes as `EMAIL[..]`,
/// anything else as `INPUT[..]`.
pub fn redact_email(value: &str) -> String {
    // Addresses compare case-insensitively, so must their hashes.
    let normalized = value.trim().to_lowercase();
    let tag = if EMAIL_REGEX.is_match(&normalized) { "EMAIL" } else { "INPUT" };
    format!("{tag}[{}]", hash_value(&normalized))
}

fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    // First 8 bytes are enough to correlate log lines.
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_email_is_case_insensitive() {
        assert_eq!(redact_email("Bob@Example.COM"), redact_email(" bob@example.com "));
        assert_ne!(redact_email("bob@example.com"), redact_email("alice@example.com"));
        assert!(redact_email("bob@example.com").starts_with("EMAIL["));
    }

    #[test]
    fn non_email_input_is_hashed_whole() {
        let redacted = redact_email("not-an-email");
        assert!(redacted.starts_with("INPUT["));
        assert!(!redacted.contains("not-an-email"));
    }

    #[test]
    fn text_around_an_address_never_reaches_the_output() {
        let redacted = redact_email("alice@example.com hunter2-password");

        assert!(redacted.starts_with("INPUT["));
        assert!(!redacted.contains("hunter2"));
        assert!(!redacted.contains("alice"));
        assert_ne!(redacted, redact_email("alice@example.com"));
    }
}
