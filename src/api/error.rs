use thiserror::Error;

/// Failure of a call against the remote operation endpoint.
///
/// `Unauthorized` is an explicit rejection of the attached credential and is
/// consumed by the session guard. `Transport` means the request never got an
/// answer; the credential was not judged and the session must stay intact.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("authorization denied ({status})")]
    Unauthorized { status: u16 },
    #[error("network error: {0}")]
    Transport(String),
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("response error: {0}")]
    Parse(String),
    #[error("request error: {0}")]
    Serialization(String),
}

impl CallError {
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
