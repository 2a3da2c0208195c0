//! # Referral Core
//!
//! Logic behind the waitlist referral program.
//!
//! Durable storage lives in an external hosted form service; this crate only
//! ever sees a flat list of its submissions. Everything here is in-memory and
//! rebuilt from scratch on every fetch cycle.
//!
//! ## Pipeline
//!
//! 1. Parse each raw submission's payload into a typed record. Garbage
//!    payloads are dropped, missing fields are defaulted.
//! 2. Index referral-code owners (last write wins on a duplicate code).
//! 3. Count how often each code appears as `referred_by`.
//! 4. Join, sort by count (ties broken by earliest signup), assign ranks.
//!
//! ## Referral codes
//!
//! Codes are generated client-side at signup, before the form service has
//! seen anything: a slice of the email local part, a random suffix, and a
//! base-36 timestamp. Short and human-copyable, not guaranteed unique.
//!
//! ## Session state
//!
//! The original frontend smeared referral state across `localStorage` and
//! `sessionStorage`. [`session::ClientSession`] replaces that with an explicit
//! object carrying both lifetimes: attribution is durable until cleared,
//! the post-signup summary is session-scoped.

pub mod aggregate;
pub mod codegen;
pub mod models;
pub mod session;
