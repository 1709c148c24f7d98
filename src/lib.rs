//! # matchgate
//!
//! Command-line client for the volunteer matching service. Volunteers and
//! charities sign in against a hosted user pool, then call the matching API's
//! GraphQL endpoint with the resulting ID token.
//!
//! ## Session Guard
//!
//! [`session::SessionGuard`] is the single owner of the stored credential. It
//! decides whether the credential is usable right now (decodable, carries an
//! `exp` claim, and `exp` lies strictly in the future) and gates every
//! privileged call behind that decision:
//!
//! 1. **Load:** the stored token is read once at start. Missing or corrupted
//!    data is treated as "no session", never as an error.
//! 2. **Check:** each privileged call re-evaluates the credential immediately
//!    before sending. A denial revokes the session and returns a redirect
//!    decision without sending anything.
//! 3. **Remote verdict:** a 401/403 from the API revokes the session even if it
//!    looked valid locally. Transport failures leave the session intact.
//!
//! Credentials are decoded, not verified; signature checks belong to the API.

pub mod api;
pub mod catalog;
pub mod cli;
pub mod identity;
pub mod pages;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
