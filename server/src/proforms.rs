//! Client for the hosted form service that owns all waitlist submissions.
//!
//! One endpoint, plain GET with credentials in the query string. The full
//! submission set comes back in a single envelope; there is no pagination.
//! No retries either: a failed fetch surfaces as an error and the manual
//! refresh control is the recovery path.

use reqwest::Client;
use serde::Deserialize;

use referral::models::RawSubmission;

use crate::{config::Config, error::AppError};

#[derive(Deserialize)]
struct Envelope {
    status: String,
    submissions: Option<SubmissionSet>,
}

#[derive(Deserialize)]
struct SubmissionSet {
    data: Vec<RawSubmission>,
}

pub async fn fetch_submissions(
    http: &Client,
    config: &Config,
) -> Result<Vec<RawSubmission>, AppError> {
    let body = http
        .get(&config.proforms_endpoint)
        .query(&[
            ("api_key", config.api_key.as_str()),
            ("access_token", config.access_token.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    decode_envelope(&body)
}

/// Anything other than `status: "success"` with a submission set present is
/// treated as a failed fetch, per-record payload problems are not: those are
/// handled downstream during aggregation.
pub fn decode_envelope(body: &str) -> Result<Vec<RawSubmission>, AppError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|_| AppError::MalformedEnvelope)?;

    if envelope.status != "success" {
        return Err(AppError::UpstreamStatus(envelope.status));
    }

    match envelope.submissions {
        Some(set) => Ok(set.data),
        None => Err(AppError::MalformedEnvelope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let body = r#"{
            "status": "success",
            "submissions": {
                "data": [
                    {
                        "submission_id": "s1",
                        "submitted_data": "{\"email\":\"a@x.com\"}",
                        "created_at": "2025-03-01 10:00:00"
                    }
                ]
            }
        }"#;

        let subs = decode_envelope(body).unwrap();

        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].submission_id, "s1");
    }

    #[test]
    fn test_decode_failure_status() {
        let body = r#"{"status": "error"}"#;

        assert!(matches!(
            decode_envelope(body),
            Err(AppError::UpstreamStatus(s)) if s == "error"
        ));
    }

    #[test]
    fn test_decode_missing_set() {
        assert!(matches!(
            decode_envelope(r#"{"status": "success"}"#),
            Err(AppError::MalformedEnvelope)
        ));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_envelope("<html>nope</html>"),
            Err(AppError::MalformedEnvelope)
        ));
    }
}
