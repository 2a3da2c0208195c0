//! Explicit per-visitor state.
//!
//! The original site kept this in browser storage: the referral attribution
//! in a durable key, the freshly submitted signup details in session-scoped
//! keys read back by the confirmation view. Modeled here as one object with
//! both lifetimes spelled out, passed between the capture step (landing with
//! a `ref` parameter, submitting the form) and the consuming step (prefilled
//! referred-by field, personalized success summary).

use serde::Serialize;

/// What the confirmation view renders after a signup.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupSummary {
    pub name: String,
    pub email: String,
    pub referral_code: String,
}

#[derive(Clone, Debug, Default)]
pub struct ClientSession {
    /// Durable until explicitly cleared.
    attribution: Option<String>,
    /// Session-scoped; gone when the session is dropped.
    signup: Option<SignupSummary>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the entry-URL rule: a `ref` parameter wins and is persisted;
    /// without one, any previously stored attribution is reused. Returns the
    /// attribution in effect for this visit.
    pub fn observe_entry(&mut self, ref_param: Option<&str>) -> Option<&str> {
        if let Some(code) = ref_param.filter(|c| !c.is_empty()) {
            self.attribution = Some(code.to_string());
        }

        self.attribution.as_deref()
    }

    pub fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }

    pub fn clear_attribution(&mut self) {
        self.attribution = None;
    }

    /// Written immediately before the form post so the confirmation view can
    /// render a summary even though the form service returns nothing usable.
    pub fn stash_signup(&mut self, name: &str, email: &str, referral_code: &str) {
        self.signup = Some(SignupSummary {
            name: name.to_string(),
            email: email.to_string(),
            referral_code: referral_code.to_string(),
        });
    }

    pub fn summary(&self) -> Option<&SignupSummary> {
        self.signup.as_ref()
    }
}

/// The shareable link a participant sends around, e.g. `https://site?ref=CODE`.
pub fn referral_link(origin: &str, code: &str) -> String {
    format!("{}?ref={}", origin.trim_end_matches('/'), code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_param_persists() {
        let mut session = ClientSession::new();

        assert_eq!(session.observe_entry(Some("ABCD1")), Some("ABCD1"));
        assert_eq!(session.observe_entry(None), Some("ABCD1"));
    }

    #[test]
    fn test_new_param_overwrites() {
        let mut session = ClientSession::new();

        session.observe_entry(Some("OLD11"));
        assert_eq!(session.observe_entry(Some("NEW22")), Some("NEW22"));
    }

    #[test]
    fn test_empty_param_ignored() {
        let mut session = ClientSession::new();

        session.observe_entry(Some("KEEP1"));
        assert_eq!(session.observe_entry(Some("")), Some("KEEP1"));
    }

    #[test]
    fn test_clear() {
        let mut session = ClientSession::new();

        session.observe_entry(Some("GONE1"));
        session.clear_attribution();

        assert_eq!(session.observe_entry(None), None);
    }

    #[test]
    fn test_signup_summary_survives_reads() {
        let mut session = ClientSession::new();

        assert!(session.summary().is_none());

        session.stash_signup("Ada", "ada@x.com", "ADAX1234");

        let summary = session.summary().unwrap().clone();
        assert_eq!(summary.name, "Ada");
        assert_eq!(session.summary(), Some(&summary));
    }

    #[test]
    fn test_referral_link() {
        assert_eq!(
            referral_link("https://site.example/", "ABCD1"),
            "https://site.example?ref=ABCD1"
        );
    }
}
