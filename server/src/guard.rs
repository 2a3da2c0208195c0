//! Duplicate-email guard.
//!
//! Best-effort read-then-check against the full submission set before a
//! signup is allowed through. The guard and the eventual form post are two
//! separate network operations with no transaction between them, so a
//! duplicate can still land in the race window; the form service exposes no
//! compare-and-swap, and a low-traffic waitlist tolerates the gap.
//!
//! Failure of the check itself is NOT a duplicate. The three outcomes are
//! kept distinct so the fail-open policy is a visible mapping at the call
//! site rather than a `false` that conflates "no" with "don't know".

use std::sync::Arc;

use tracing::warn;

use referral::models::RawSubmission;

use crate::{proforms::fetch_submissions, state::AppState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DuplicateCheck {
    Duplicate,
    NotDuplicate,
    CheckFailed,
}

impl DuplicateCheck {
    /// Only a confirmed duplicate blocks a signup; a failed check lets the
    /// signup proceed rather than punishing the user for an upstream hiccup.
    pub fn blocks_signup(self) -> bool {
        self == DuplicateCheck::Duplicate
    }
}

pub async fn check_duplicate(state: Arc<AppState>, email: &str) -> DuplicateCheck {
    match fetch_submissions(&state.http, &state.config).await {
        Ok(submissions) => {
            if email_taken(&submissions, email) {
                DuplicateCheck::Duplicate
            } else {
                DuplicateCheck::NotDuplicate
            }
        }
        Err(e) => {
            warn!("Duplicate check failed, allowing signup: {e}");
            DuplicateCheck::CheckFailed
        }
    }
}

/// Case-insensitive membership test. Only the `email` field of each payload
/// matters here; records without one (or with unparseable payloads) are
/// skipped instead of defaulted, unlike leaderboard parsing.
pub fn email_taken(submissions: &[RawSubmission], email: &str) -> bool {
    #[derive(serde::Deserialize)]
    struct EmailOnly {
        email: Option<String>,
    }

    let needle = email.to_lowercase();

    submissions.iter().any(|sub| {
        serde_json::from_str::<EmailOnly>(&sub.submitted_data)
            .ok()
            .and_then(|fields| fields.email)
            .is_some_and(|existing| existing.to_lowercase() == needle)
    })
}
