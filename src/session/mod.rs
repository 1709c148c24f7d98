//! Client-side session handling: the stored credential, its validity, and the
//! gate that every privileged call passes through.
//!
//! The session slot is owned by [`SessionGuard`]. Other modules never touch
//! storage directly; they ask the guard for a decision and act on it. Tokens
//! are wrapped in `SecretString` and must never be logged.
//!
//! Credentials are decoded, not verified. Signature checks belong to the
//! remote API, which stays the final authority through
//! [`Denial::Remote`].

pub mod clock;
pub mod credential;
pub mod guard;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{Claims, Credential, CredentialError};
pub use guard::{AuthState, Decision, Denial, SessionGuard, SignInError};
pub use store::{FileStore, MemoryStore, STORAGE_KEY, SessionStore, StorageError};
