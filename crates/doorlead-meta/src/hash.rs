//! PII normalization/hashing and deterministic event-id derivation.

use sha2::{Digest, Sha256};

fn sha256_hex(input: &str) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// One-way hash of a user identifier (email or phone) for `user_data`.
///
/// The value is trimmed and case-folded first, per the API's match-key
/// normalization rules, so `" Sam@Example.COM "` and `"sam@example.com"`
/// produce the same hash.
#[must_use]
pub fn hash_identifier(raw: &str) -> String {
    sha256_hex(&raw.trim().to_lowercase())
}

/// Derives a deterministic event id from the event name, timestamp, and the
/// serialized custom attributes.
///
/// Two deliveries of the same logical event (same name, same custom data,
/// same second) collapse to one id, so the remote API's deduplication
/// absorbs retries; distinct events still get distinct ids.
#[must_use]
pub fn deterministic_event_id(
    event_name: &str,
    event_time: i64,
    custom_data: Option<&crate::CustomData>,
) -> String {
    let custom_json = serde_json::to_string(&custom_data).unwrap_or_default();
    sha256_hex(&format!("{event_name}:{event_time}:{custom_json}"))
}

/// Event id for a step-one "Lead" event, derived from the contact identity
/// and the event timestamp.
///
/// The same id is handed back to the browser so the pixel's client-side
/// firing of the same logical event deduplicates against the server-side
/// delivery.
#[must_use]
pub fn lead_event_id(email: &str, phone: &str, event_time: i64) -> String {
    sha256_hex(&format!(
        "{}:{}:{event_time}",
        email.trim().to_lowercase(),
        phone.trim()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CustomData;

    #[test]
    fn hash_identifier_normalizes_before_hashing() {
        assert_eq!(
            hash_identifier(" Sam@Example.COM "),
            hash_identifier("sam@example.com")
        );
    }

    #[test]
    fn hash_identifier_is_sha256_hex() {
        // sha256("sam@example.com")
        assert_eq!(
            hash_identifier("sam@example.com"),
            "cd25a6171969f2a3c6e35c7667e3908ef1bd2424241db04411a0eec454ca6c16"
        );
    }

    #[test]
    fn same_event_same_custom_data_same_id() {
        let custom = CustomData {
            location: Some("chicago".to_string()),
            door_issue: Some("weathered".to_string()),
            ..CustomData::default()
        };
        let a = deterministic_event_id("Lead", 1_700_000_000, Some(&custom));
        let b = deterministic_event_id("Lead", 1_700_000_000, Some(&custom));
        assert_eq!(a, b);
    }

    #[test]
    fn different_custom_data_different_id() {
        let chicago = CustomData {
            location: Some("chicago".to_string()),
            ..CustomData::default()
        };
        let detroit = CustomData {
            location: Some("detroit".to_string()),
            ..CustomData::default()
        };
        let a = deterministic_event_id("Lead", 1_700_000_000, Some(&chicago));
        let b = deterministic_event_id("Lead", 1_700_000_000, Some(&detroit));
        assert_ne!(a, b);
    }

    #[test]
    fn different_timestamp_different_id() {
        let a = deterministic_event_id("Lead", 1_700_000_000, None);
        let b = deterministic_event_id("Lead", 1_700_000_001, None);
        assert_ne!(a, b);
    }

    #[test]
    fn lead_event_id_is_stable_for_same_identity() {
        let a = lead_event_id("Sam@Example.com", "5551234567", 1_700_000_000);
        let b = lead_event_id("sam@example.com", "5551234567", 1_700_000_000);
        assert_eq!(a, b);
        assert_ne!(
            a,
            lead_event_id("sam@example.com", "5559999999", 1_700_000_000)
        );
    }
}
