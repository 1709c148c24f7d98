//! The session guard: sole owner of the session slot and the gate in front of
//! every privileged call. It returns decisions; navigation happens in the
//! caller (see `pages`).

use crate::{
    api::CallError,
    identity::{IdentityError, IdentityProvider},
    session::{
        clock::Clock,
        credential::{Credential, CredentialError},
        store::{STORAGE_KEY, SessionStore, StorageError},
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt,
    future::Future,
    sync::{Arc, PoisonError, RwLock},
};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Why access was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Denial {
    Absent,
    Malformed(CredentialError),
    MissingExpiry,
    Expired { expired_at: i64 },
    Remote { status: u16 },
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "no session established"),
            Self::Malformed(err) => write!(f, "stored session is unreadable: {err}"),
            Self::MissingExpiry => write!(f, "stored session has no expiry"),
            Self::Expired { expired_at } => write!(f, "session expired at {expired_at}"),
            Self::Remote { status } => write!(f, "session rejected by the server ({status})"),
        }
    }
}

/// Outcome of a guarded call that did not fail in transport.
#[derive(Debug, PartialEq, Eq)]
pub enum Decision<T> {
    Proceed(T),
    /// Access denied; the caller should send the user to re-authentication.
    Redirect(Denial),
}

impl<T> Decision<T> {
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Error)]
pub enum SignInError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
    #[error("identity provider returned a credential that is already expired")]
    NotLive { expires_at: Option<i64> },
}

#[derive(Default)]
struct Slot {
    raw: Option<SecretString>,
    generation: u64,
    state: AuthState,
}

/// Owns the session slot and mirrors it to durable storage.
pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    slot: RwLock<Slot>,
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SessionGuard")
            .field("present", &slot.raw.is_some())
            .field("generation", &slot.generation)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            slot: RwLock::new(Slot::default()),
        }
    }

    /// Reads the storage slot into memory. Missing, unreadable or malformed
    /// data becomes "absent" or a stored-but-invalid token; this never fails
    /// and never redirects.
    #[instrument(skip(self))]
    pub fn load_session(&self) {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(raw) => raw.filter(|value| !value.trim().is_empty()),
            Err(err) => {
                warn!("session storage unreadable, treating as absent: {err}");
                None
            }
        };

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.raw = raw.map(SecretString::from);
        slot.generation += 1;
        let verdict = judge(slot.raw.as_ref(), self.clock.now());
        slot.state = state_of(&verdict);
        drop(slot);

        match verdict {
            Ok(credential) => info!(exp = ?credential.expires_at(), "session loaded"),
            Err(denial) => debug!("no usable session on load: {denial}"),
        }
    }

    /// Judges the current slot against the clock. Re-evaluated on every call.
    ///
    /// # Errors
    /// Returns the reason the slot holds no usable credential.
    pub fn evaluate(&self) -> Result<Credential, Denial> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        judge(slot.raw.as_ref(), self.clock.now())
    }

    /// The usable credential and its remaining lifetime in seconds, both
    /// judged against one clock reading.
    ///
    /// # Errors
    /// Returns the reason the slot holds no usable credential.
    pub fn lifetime(&self) -> Result<(Credential, i64), Denial> {
        let now = self.clock.now();
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        let credential = judge(slot.raw.as_ref(), now)?;
        let remaining = credential.expires_at().map_or(0, |expires_at| expires_at - now);
        Ok((credential, remaining))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.evaluate().is_ok()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.state
    }

    /// Stores `credential`, overwriting any previous one. Storage is written
    /// first; on failure the slot keeps its previous value.
    ///
    /// # Errors
    /// Returns an error if durable storage rejects the write.
    #[instrument(skip_all)]
    pub fn establish(&self, credential: &Credential) -> Result<(), StorageError> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        self.store.set(STORAGE_KEY, credential.expose())?;

        slot.raw = Some(credential.raw().clone());
        slot.generation += 1;
        let live = credential.is_live_at(self.clock.now());
        slot.state = if live {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        drop(slot);

        if live {
            info!(exp = ?credential.expires_at(), "session established");
        } else {
            warn!(exp = ?credential.expires_at(), "established credential is not live");
        }
        Ok(())
    }

    /// Clears the slot and the storage key. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub fn revoke(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        self.clear(&mut slot);
    }

    fn clear(&self, slot: &mut Slot) {
        let was_present = slot.raw.take().is_some();
        slot.generation += 1;
        slot.state = AuthState::Unauthenticated;

        if let Err(err) = self.store.remove(STORAGE_KEY) {
            error!("failed to clear session storage: {err}");
        }

        if was_present {
            info!("session revoked");
        }
    }

    /// Revokes only if nothing replaced the slot since `generation` was read.
    fn revoke_if_current(&self, generation: u64) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == generation {
            self.clear(&mut slot);
        } else {
            debug!("session replaced while request was in flight; keeping newer credential");
        }
    }

    /// Authenticates against the identity provider and establishes the
    /// resulting credential. Identity failures and credentials that are not
    /// live leave the session untouched.
    ///
    /// # Errors
    /// Returns the provider error verbatim, `SignInError::NotLive`, or a
    /// storage error.
    pub async fn sign_in<P: IdentityProvider>(
        &self,
        provider: &P,
        username: &str,
        password: &SecretString,
    ) -> Result<Credential, SignInError> {
        let credential = provider.authenticate(username, password).await?;
        if !credential.is_live_at(self.clock.now()) {
            warn!(
                exp = ?credential.expires_at(),
                "refusing to establish a credential that is not live"
            );
            return Err(SignInError::NotLive {
                expires_at: credential.expires_at(),
            });
        }
        self.establish(&credential)?;
        Ok(credential)
    }

    /// Runs `operation` with the current credential if, and only if, it is
    /// usable right now.
    ///
    /// A local denial revokes and returns `Decision::Redirect` without calling
    /// `operation`. `CallError::Unauthorized` from the operation revokes and
    /// redirects too. Every other error, including transport failures, is
    /// returned unchanged and leaves the session alone.
    ///
    /// # Errors
    /// Returns the operation's non-authorization error.
    pub async fn guard<T, F, Fut>(&self, operation: F) -> Result<Decision<T>, CallError>
    where
        F: FnOnce(Credential) -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let (verdict, generation) = {
            let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            (judge(slot.raw.as_ref(), self.clock.now()), slot.generation)
        };

        let credential = match verdict {
            Ok(credential) => credential,
            Err(denial) => {
                info!("access denied before request: {denial}");
                self.revoke();
                return Ok(Decision::Redirect(denial));
            }
        };

        match operation(credential).await {
            Ok(value) => Ok(Decision::Proceed(value)),
            Err(CallError::Unauthorized { status }) => {
                warn!(status, "remote endpoint rejected the session");
                self.revoke_if_current(generation);
                Ok(Decision::Redirect(Denial::Remote { status }))
            }
            Err(err) => {
                if err.is_transport() {
                    warn!("privileged call failed in transport: {err}");
                }
                Err(err)
            }
        }
    }
}

fn judge(raw: Option<&SecretString>, now: i64) -> Result<Credential, Denial> {
    let raw = raw.ok_or(Denial::Absent)?;
    let credential = Credential::decode(raw.expose_secret()).map_err(Denial::Malformed)?;
    let expires_at = credential.expires_at().ok_or(Denial::MissingExpiry)?;
    if expires_at <= now {
        return Err(Denial::Expired {
            expired_at: expires_at,
        });
    }
    Ok(credential)
}

fn state_of(verdict: &Result<Credential, Denial>) -> AuthState {
    if verdict.is_ok() {
        AuthState::Authenticated
    } else {
        AuthState::Unauthenticated
    }
}
