use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

use indexmap::IndexMap;
use reqwest::Client;

use referral::{models::LeaderboardEntry, session::ClientSession};

use crate::config::Config;

/// Session ids arrive unauthenticated, so the map must not grow without
/// bound. When full, the session with the oldest first touch is evicted.
const MAX_SESSIONS: usize = 10_000;

pub struct AppState {
    pub config: Config,
    pub http: Client,
    pub board: SnapshotCell,
    sessions: RwLock<IndexMap<String, ClientSession>>,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Self::with_config(Config::load())
    }

    pub fn with_config(config: Config) -> Arc<Self> {
        Arc::new(Self {
            config,
            http: Client::new(),
            board: SnapshotCell::new(),
            sessions: RwLock::new(IndexMap::new()),
        })
    }

    /// Runs `f` against the caller's session, creating it on first touch.
    /// At capacity the oldest session is dropped first; an evicted visitor
    /// just loses their stored attribution, which self-corrects on the next
    /// visit with a `ref` parameter.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut ClientSession) -> R) -> R {
        let mut sessions = self.sessions.write().unwrap();

        if !sessions.contains_key(id) && sessions.len() >= MAX_SESSIONS {
            sessions.shift_remove_index(0);
        }

        f(sessions.entry(id.to_string()).or_default())
    }

    pub fn session(&self, id: &str) -> Option<ClientSession> {
        self.sessions.read().unwrap().get(id).cloned()
    }

    /// Applies the entry-URL rule without materializing a session when there
    /// is nothing to store: a bare read of a never-seen id stays a read.
    pub fn observe_attribution(&self, id: &str, ref_param: Option<&str>) -> Option<String> {
        match ref_param.filter(|code| !code.is_empty()) {
            Some(code) => self.with_session(id, |session| {
                session.observe_entry(Some(code)).map(str::to_string)
            }),
            None => self
                .session(id)
                .and_then(|session| session.attribution().map(str::to_string)),
        }
    }

    /// Clears a stored attribution without creating a session for an id
    /// that was never seen.
    pub fn clear_attribution(&self, id: &str) {
        if let Some(session) = self.sessions.write().unwrap().get_mut(id) {
            session.clear_attribution();
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }
}

/// The currently displayed leaderboard, tagged with the sequence number of
/// the fetch that produced it.
///
/// Refreshes are not cancelled or serialized, so two can be in flight at
/// once. Each fetch takes a sequence number up front and a completion is
/// only applied if nothing newer already landed, which keeps a slow stale
/// response from overwriting a fresher board.
pub struct SnapshotCell {
    next_seq: AtomicU64,
    snapshot: RwLock<Snapshot>,
}

struct Snapshot {
    seq: u64,
    entries: Vec<LeaderboardEntry>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self {
            next_seq: AtomicU64::new(1),
            snapshot: RwLock::new(Snapshot {
                seq: 0,
                entries: Vec::new(),
            }),
        }
    }

    pub fn begin_fetch(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Installs `entries` unless a newer fetch already completed. Returns
    /// whether the result was applied.
    pub fn apply(&self, seq: u64, entries: Vec<LeaderboardEntry>) -> bool {
        let mut snapshot = self.snapshot.write().unwrap();

        if seq <= snapshot.seq {
            return false;
        }

        snapshot.seq = seq;
        snapshot.entries = entries;
        true
    }

    pub fn current(&self) -> Vec<LeaderboardEntry> {
        self.snapshot.read().unwrap().entries.clone()
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn test_state() -> Arc<AppState> {
        AppState::with_config(Config {
            port: 0,
            proforms_endpoint: String::new(),
            site_origin: "http://localhost:3000".to_string(),
            api_key: String::new(),
            access_token: String::new(),
        })
    }

    #[test]
    fn test_session_map_capped_with_oldest_evicted() {
        let state = test_state();

        for i in 0..MAX_SESSIONS + 50 {
            state.with_session(&format!("sid-{i}"), |session| {
                session.observe_entry(Some("CODE1"));
            });
        }

        assert_eq!(state.session_count(), MAX_SESSIONS);
        assert!(state.session("sid-0").is_none());
        assert!(state
            .session(&format!("sid-{}", MAX_SESSIONS + 49))
            .is_some());
    }

    #[test]
    fn test_bare_attribution_read_creates_no_session() {
        let state = test_state();

        assert_eq!(state.observe_attribution("fresh-id", None), None);
        assert_eq!(state.session_count(), 0);

        assert_eq!(
            state.observe_attribution("fresh-id", Some("ABCD1")),
            Some("ABCD1".to_string())
        );
        assert_eq!(state.session_count(), 1);

        assert_eq!(
            state.observe_attribution("fresh-id", None),
            Some("ABCD1".to_string())
        );
    }

    fn entry(code: &str) -> LeaderboardEntry {
        LeaderboardEntry {
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            referral_code: code.to_string(),
            referral_count: 0,
            rank: 1,
            timestamp: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_clear_touches_only_existing_sessions() {
        let state = test_state();

        state.clear_attribution("never-seen");
        assert_eq!(state.session_count(), 0);

        state.observe_attribution("sid", Some("GONE1"));
        state.clear_attribution("sid");

        assert_eq!(state.session("sid").unwrap().attribution(), None);
    }

    #[test]
    fn test_stale_fetch_discarded() {
        let cell = SnapshotCell::new();

        let first = cell.begin_fetch();
        let second = cell.begin_fetch();
        assert!(first < second);

        assert!(cell.apply(second, vec![entry("FRESH")]));
        assert!(!cell.apply(first, vec![entry("STALE")]));

        assert_eq!(cell.current()[0].referral_code, "FRESH");
    }

    #[test]
    fn test_in_order_applies() {
        let cell = SnapshotCell::new();

        let first = cell.begin_fetch();
        let second = cell.begin_fetch();

        assert!(cell.apply(first, vec![entry("ONE")]));
        assert!(cell.apply(second, vec![entry("TWO")]));

        assert_eq!(cell.current()[0].referral_code, "TWO");
    }
}
