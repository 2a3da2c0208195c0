//! Referral code generation.
//!
//! Codes are minted on the client path at signup, before the form service
//! has stored anything, so there is no registry to check against. Collisions
//! are possible and accepted; the email-derived prefix exists so a code can
//! be traced back to its owner when debugging.

use chrono::Utc;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const MAX_CODE_LEN: usize = 12;
const PREFIX_LEN: usize = 4;
const SUFFIX_LEN: usize = 4;

/// Builds a short uppercase-alphanumeric code from an email address:
/// up to 4 chars of the local part, 4 random chars, then the current time in
/// base 36, truncated to 12. Assumes form validation already required an `@`.
pub fn generate_referral_code(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);

    let prefix: String = local
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(PREFIX_LEN)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();

    let stamp = base36(Utc::now().timestamp_millis() as u64);

    let mut code = format!("{prefix}{suffix}{stamp}");
    code.truncate(MAX_CODE_LEN);
    code
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }

    out.iter().rev().collect()
}
