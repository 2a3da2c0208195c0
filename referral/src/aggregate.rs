//! Turns the flat submission list into the ranked leaderboard.
//!
//! Pure and total: any input sequence, including empty, produces a ranked
//! output with contiguous 1-based ranks. Everything is recomputed per call;
//! nothing carries over between fetch cycles.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::models::{parse_submissions, LeaderboardEntry, RawSubmission};

struct Owner {
    name: String,
    email: String,
    timestamp: DateTime<Utc>,
}

/// Builds the leaderboard from raw submissions.
///
/// A code counts as owned by whoever declared it last in input order, but a
/// re-declared code keeps its first-seen position so repeated runs over the
/// same input emit identical output. Referrals pointing at a code nobody
/// declared are counted but never surfaced.
pub fn aggregate(submissions: &[RawSubmission]) -> Vec<LeaderboardEntry> {
    let parsed = parse_submissions(submissions);

    let mut owners: IndexMap<String, Owner> = IndexMap::new();
    let mut counts: HashMap<String, u32> = HashMap::new();

    for sub in &parsed {
        if !sub.referral_code.is_empty() {
            owners.insert(
                sub.referral_code.clone(),
                Owner {
                    name: sub.name.clone(),
                    email: sub.email.clone(),
                    timestamp: sub.timestamp,
                },
            );
        }

        if !sub.referred_by.is_empty() {
            *counts.entry(sub.referred_by.clone()).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<LeaderboardEntry> = owners
        .into_iter()
        .map(|(code, owner)| LeaderboardEntry {
            name: owner.name,
            email: owner.email,
            referral_count: counts.get(&code).copied().unwrap_or(0),
            referral_code: code,
            rank: 0,
            timestamp: owner.timestamp,
        })
        .collect();

    // Stable sort: count descending, earlier signup wins a tie.
    entries.sort_by(|a, b| {
        b.referral_count
            .cmp(&a.referral_count)
            .then(a.timestamp.cmp(&b.timestamp))
    });

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = (index + 1) as u32;
    }

    entries
}

/// Case-insensitive substring filter over name, email, and code. Runs after
/// ranking, so a filtered view keeps the ranks of the full board.
pub fn filter_entries(entries: &[LeaderboardEntry], query: &str) -> Vec<LeaderboardEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entries.to_vec();
    }

    entries
        .iter()
        .filter(|entry| {
            entry.name.to_lowercase().contains(&needle)
                || entry.email.to_lowercase().contains(&needle)
                || entry.referral_code.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
