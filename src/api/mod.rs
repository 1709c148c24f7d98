//! GraphQL client for the matching API. Requests carry the raw ID token in the
//! `Authorization` header when a credential is supplied; the helpers never log
//! it. Responses are classified so the session guard can tell an authorization
//! denial apart from a transport failure.

pub mod error;
pub mod operations;

pub use error::CallError;

use crate::session::{Credential, Decision, SessionGuard};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{Instrument, debug, info_span};
use ulid::Ulid;
use url::Url;

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|extensions| extensions.get("code"))
            .and_then(Value::as_str)
    }
}

/// Successful HTTP exchange. `errors` holds application-level failures.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

impl GraphqlResponse {
    #[must_use]
    pub fn errors(&self) -> &[GraphqlError] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Status equivalent of a GraphQL error code that refuses the credential.
    fn denial_status(&self) -> Option<u16> {
        // Message-only errors like "Authentication required to find matches" are not denials.
        self.errors().iter().find_map(|error| match error.code() {
            Some("UNAUTHENTICATED") => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Some("FORBIDDEN") => Some(StatusCode::FORBIDDEN.as_u16()),
            _ => None,
        })
    }
}

#[derive(Clone, Debug)]
pub struct GraphqlClient {
    client: Client,
    endpoint: Url,
}

impl GraphqlClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: Url, user_agent: &str, timeout: Duration) -> Result<Self, CallError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|err| CallError::Serialization(format!("Failed to build client: {err}")))?;
        Ok(Self { client, endpoint })
    }

    /// Posts one operation. A single attempt, no retry.
    ///
    /// # Errors
    /// - `Transport` when no response arrived (connect failure, timeout),
    /// - `Unauthorized` on 401/403 or a GraphQL denial code,
    /// - `Http` on any other non-success status,
    /// - `Parse` when the body is not a GraphQL response.
    pub async fn execute(
        &self,
        request: &GraphqlRequest,
        credential: Option<&Credential>,
    ) -> Result<GraphqlResponse, CallError> {
        let request_id = Ulid::new().to_string();

        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .header("X-Request-Id", request_id.as_str())
            .json(request);

        if let Some(credential) = credential {
            builder = builder.header("Authorization", credential.expose());
        }

        let span = info_span!(
            "graphql.execute",
            http.method = "POST",
            url = %self.endpoint,
            request_id = %request_id,
            authenticated = credential.is_some()
        );
        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        debug!(status = status.as_u16(), request_id = %request_id, "graphql response");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CallError::Unauthorized {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| CallError::Transport(format!("Failed to read response: {err}")))?;

        if !status.is_success() {
            return Err(CallError::Http {
                status: status.as_u16(),
                message: sanitize_body(&body),
            });
        }

        let parsed: GraphqlResponse = serde_json::from_str(&body)
            .map_err(|err| CallError::Parse(format!("Failed to decode response: {err}")))?;

        if let Some(status) = parsed.denial_status() {
            return Err(CallError::Unauthorized { status });
        }

        Ok(parsed)
    }

    /// Runs `request` behind the session guard with the current credential.
    ///
    /// # Errors
    /// Returns transport and non-authorization failures; denials become
    /// `Decision::Redirect`.
    pub async fn execute_guarded(
        &self,
        guard: &SessionGuard,
        request: &GraphqlRequest,
    ) -> Result<Decision<GraphqlResponse>, CallError> {
        guard
            .guard(|credential| async move { self.execute(request, Some(&credential)).await })
            .await
    }
}

fn map_request_error(err: reqwest::Error) -> CallError {
    if err.is_timeout() {
        CallError::Transport("Request timed out. Please try again.".to_string())
    } else {
        CallError::Transport(format!("Unable to reach the server: {err}"))
    }
}

/// Trims and truncates error bodies for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
