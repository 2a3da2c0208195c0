use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const UNKNOWN: &str = "Unknown";

/// One record as the external form service returns it. The interesting part
/// is `submitted_data`, a JSON string nested inside the JSON envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct RawSubmission {
    pub submission_id: String,

    #[serde(default)]
    pub submitted_data: String,

    #[serde(default)]
    pub created_at: String,
}

/// A submission after its payload has been decoded. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSubmission {
    pub name: String,
    pub email: String,
    pub referral_code: String,
    pub referred_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub email: String,
    pub referral_code: String,
    pub referral_count: u32,
    pub rank: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct SubmittedFields {
    name: Option<String>,
    email: Option<String>,
    referral_code: Option<String>,
    referred_by: Option<String>,
}

/// Decodes one submission's payload, or `None` if it is not valid JSON.
/// Missing fields are defaulted rather than treated as errors. An empty
/// payload counts as the empty object, matching what the original form
/// service hands back for blank submissions.
pub fn parse_submission(raw: &RawSubmission) -> Option<ParsedSubmission> {
    let payload = if raw.submitted_data.trim().is_empty() {
        "{}"
    } else {
        raw.submitted_data.as_str()
    };

    let fields: SubmittedFields = match serde_json::from_str(payload) {
        Ok(fields) => fields,
        Err(e) => {
            debug!(
                "Dropping submission {}: payload not parseable: {e}",
                raw.submission_id
            );
            return None;
        }
    };

    Some(ParsedSubmission {
        name: fields.name.unwrap_or_else(|| UNKNOWN.to_string()),
        email: fields.email.unwrap_or_else(|| UNKNOWN.to_string()),
        referral_code: fields.referral_code.unwrap_or_default(),
        referred_by: fields.referred_by.unwrap_or_default(),
        timestamp: parse_timestamp(&raw.created_at),
    })
}

pub fn parse_submissions(raw: &[RawSubmission]) -> Vec<ParsedSubmission> {
    raw.iter().filter_map(parse_submission).collect()
}

/// The form service reports `created_at` as a bare datetime string. RFC 3339
/// is accepted too; anything else falls back to the epoch so the record still
/// aggregates (it just loses its tie-break position).
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Utc.from_utc_datetime(&naive);
    }

    DateTime::UNIX_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(payload: &str) -> RawSubmission {
        RawSubmission {
            submission_id: "1".to_string(),
            submitted_data: payload.to_string(),
            created_at: "2025-03-01 12:00:00".to_string(),
        }
    }

    #[test]
    fn test_full_payload() {
        let parsed = parse_submission(&raw(
            r#"{"name":"Ada","email":"ada@x.com","referral_code":"ADAX1","referred_by":"BOBY2"}"#,
        ))
        .unwrap();

        assert_eq!(parsed.name, "Ada");
        assert_eq!(parsed.email, "ada@x.com");
        assert_eq!(parsed.referral_code, "ADAX1");
        assert_eq!(parsed.referred_by, "BOBY2");
    }

    #[test]
    fn test_missing_fields_defaulted() {
        let parsed = parse_submission(&raw(r#"{"referral_code":"ADAX1"}"#)).unwrap();

        assert_eq!(parsed.name, UNKNOWN);
        assert_eq!(parsed.email, UNKNOWN);
        assert_eq!(parsed.referred_by, "");
    }

    #[test]
    fn test_garbage_payload_dropped() {
        assert!(parse_submission(&raw("not json at all {{{")).is_none());
    }

    #[test]
    fn test_empty_payload_defaults() {
        let parsed = parse_submission(&raw("")).unwrap();

        assert_eq!(parsed.name, UNKNOWN);
        assert_eq!(parsed.referral_code, "");
    }

    #[test]
    fn test_timestamp_formats() {
        let plain = parse_timestamp("2025-03-01 12:00:00");
        let rfc = parse_timestamp("2025-03-01T12:00:00Z");

        assert_eq!(plain, rfc);
        assert_eq!(parse_timestamp("yesterday-ish"), DateTime::UNIX_EPOCH);
    }
}
