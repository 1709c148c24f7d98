//! Identity provider seam. Authentication and registration happen in a hosted
//! user pool; this crate only consumes the outcome. Passwords travel as
//! `SecretString` and must never be logged.

pub mod cognito;

pub use cognito::{CognitoClient, CognitoConfig};

use crate::session::Credential;
use regex::Regex;
use secrecy::SecretString;
use std::future::Future;
use thiserror::Error;

/// Errors carry the provider's human-readable message so it can be shown as is.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("{message}")]
    Rejected { code: String, message: String },
    #[error("additional sign-in challenge required: {0}")]
    Challenge(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("config error: {0}")]
    Config(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAttribute {
    pub name: String,
    pub value: String,
}

impl UserAttribute {
    #[must_use]
    pub fn email(value: &str) -> Self {
        Self {
            name: "email".to_string(),
            value: value.to_string(),
        }
    }
}

/// Result of a sign-up; the account usually still needs email confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub confirmed: bool,
    pub user_sub: Option<String>,
    pub delivery_destination: Option<String>,
}

pub trait IdentityProvider: Send + Sync {
    /// Exchanges a username and password for a session credential.
    fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<Credential, IdentityError>> + Send;

    /// Creates an account with the given attributes.
    fn register(
        &self,
        username: &str,
        password: &SecretString,
        attributes: &[UserAttribute],
    ) -> impl Future<Output = Result<Registration, IdentityError>> + Send;
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_plain_addresses() {
        assert!(valid_email("volunteer@charity.org.uk"));
        assert!(!valid_email("volunteer"));
        assert!(!valid_email("two words@charity.org"));
        assert!(!valid_email("@charity.org"));
    }

    #[test]
    fn rejected_error_shows_provider_message_verbatim() {
        let err = IdentityError::Rejected {
            code: "UsernameExistsException".to_string(),
            message: "User already exists".to_string(),
        };
        assert_eq!(err.to_string(), "User already exists");
    }
}
