//! Cognito user pool client over the public JSON 1.1 API. Only unauthenticated
//! actions are used (`InitiateAuth` with `USER_PASSWORD_AUTH`, `SignUp`), so no
//! request signing is involved.

use super::{IdentityError, IdentityProvider, Registration, UserAttribute};
use crate::session::Credential;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{Instrument, debug, info_span};
use url::Url;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct CognitoConfig {
    pub user_pool_id: String,
    pub client_id: String,
    /// Overrides the regional endpoint derived from the pool id.
    pub endpoint: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl CognitoConfig {
    /// Region prefix of a pool id such as `eu-west-2_AbCdEf`.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.user_pool_id
            .trim()
            .split_once('_')
            .map(|(region, _)| region)
            .filter(|region| !region.is_empty())
    }

    /// # Errors
    /// Returns an error if no endpoint can be derived or the override is not a URL.
    pub fn endpoint_url(&self) -> Result<Url, IdentityError> {
        let raw = match self.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => endpoint.to_string(),
            _ => {
                let region = self.region().ok_or_else(|| {
                    IdentityError::Config(format!(
                        "cannot derive region from user pool id '{}'",
                        self.user_pool_id
                    ))
                })?;
                format!("https://cognito-idp.{region}.amazonaws.com/")
            }
        };

        Url::parse(&raw)
            .map_err(|err| IdentityError::Config(format!("invalid endpoint {raw}: {err}")))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: AuthParameters<'a>,
}

#[derive(Serialize)]
struct AuthParameters<'a> {
    #[serde(rename = "USERNAME")]
    username: &'a str,
    #[serde(rename = "PASSWORD")]
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: Vec<AttributeType<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpResponse {
    #[serde(default)]
    user_confirmed: bool,
    user_sub: Option<String>,
    code_delivery_details: Option<CodeDeliveryDetails>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CodeDeliveryDetails {
    destination: Option<String>,
}

#[derive(Debug)]
pub struct CognitoClient {
    client: Client,
    endpoint: Url,
    client_id: String,
}

impl CognitoClient {
    /// # Errors
    /// Returns an error if the endpoint is invalid or the HTTP client cannot be built.
    pub fn new(config: &CognitoConfig) -> Result<Self, IdentityError> {
        let client_id = config.client_id.trim();
        if client_id.is_empty() {
            return Err(IdentityError::Config(
                "user pool client id is not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|err| IdentityError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url()?,
            client_id: client_id.to_string(),
        })
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<T, IdentityError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| IdentityError::Response(format!("failed to encode request: {err}")))?;

        let span = info_span!(
            "cognito.call",
            http.method = "POST",
            action = action,
            url = %self.endpoint
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .body(payload)
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| IdentityError::Transport(format!("failed to read response: {err}")))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), action, "identity provider rejected request");
            return Err(rejection(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|err| IdentityError::Response(format!("failed to decode response: {err}")))
    }
}

impl IdentityProvider for CognitoClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Credential, IdentityError> {
        let request = InitiateAuthRequest {
            auth_flow: "USER_PASSWORD_AUTH",
            client_id: &self.client_id,
            auth_parameters: AuthParameters {
                username,
                password: password.expose_secret(),
            },
        };

        let response: InitiateAuthResponse = self.call("InitiateAuth", &request).await?;

        if let Some(challenge) = response.challenge_name {
            return Err(IdentityError::Challenge(challenge));
        }

        let id_token = response
            .authentication_result
            .and_then(|result| result.id_token)
            .ok_or_else(|| {
                IdentityError::Response("no IdToken in authentication result".to_string())
            })?;

        Credential::decode(&id_token)
            .map_err(|err| IdentityError::Response(format!("unreadable IdToken: {err}")))
    }

    async fn register(
        &self,
        username: &str,
        password: &SecretString,
        attributes: &[UserAttribute],
    ) -> Result<Registration, IdentityError> {
        let request = SignUpRequest {
            client_id: &self.client_id,
            username,
            password: password.expose_secret(),
            user_attributes: attributes
                .iter()
                .map(|attribute| AttributeType {
                    name: &attribute.name,
                    value: &attribute.value,
                })
                .collect(),
        };

        let response: SignUpResponse = self.call("SignUp", &request).await?;

        Ok(Registration {
            username: username.to_string(),
            confirmed: response.user_confirmed,
            user_sub: response.user_sub,
            delivery_destination: response
                .code_delivery_details
                .and_then(|details| details.destination),
        })
    }
}

fn map_request_error(err: reqwest::Error) -> IdentityError {
    if err.is_timeout() {
        IdentityError::Transport("Request timed out. Please try again.".to_string())
    } else {
        IdentityError::Transport(format!("Unable to reach the identity provider: {err}"))
    }
}

/// Builds a rejection from `{"__type": "...#Code", "message": "..."}` bodies.
fn rejection(status: u16, body: &str) -> IdentityError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    let code = parsed
        .get("__type")
        .and_then(Value::as_str)
        .map(|kind| kind.rsplit('#').next().unwrap_or(kind).to_string())
        .unwrap_or_else(|| format!("HTTP{status}"));

    let message = parsed
        .get("message")
        .or_else(|| parsed.get("Message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("Request failed ({status}).")
            } else {
                trimmed.chars().take(MAX_ERROR_CHARS).collect()
            }
        });

    IdentityError::Rejected { code, message }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::credential::encode_for_test;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn config(endpoint: Option<String>) -> CognitoConfig {
        CognitoConfig {
            user_pool_id: "eu-west-2_AbCdEf123".to_string(),
            client_id: "client-123".to_string(),
            endpoint,
            timeout: Duration::from_secs(5),
            user_agent: "matchgate-test/0.1".to_string(),
        }
    }

    #[test]
    fn region_comes_from_pool_id() {
        assert_eq!(config(None).region(), Some("eu-west-2"));
        let url = config(None).endpoint_url().unwrap();
        assert_eq!(url.as_str(), "https://cognito-idp.eu-west-2.amazonaws.com/");
    }

    #[test]
    fn endpoint_requires_region_or_override() {
        let mut cfg = config(None);
        cfg.user_pool_id = "nounderscore".to_string();
        assert!(matches!(cfg.endpoint_url(), Err(IdentityError::Config(_))));

        cfg.endpoint = Some("http://127.0.0.1:9229/".to_string());
        assert_eq!(cfg.endpoint_url().unwrap().as_str(), "http://127.0.0.1:9229/");
    }

    #[test]
    fn client_requires_client_id() {
        let mut cfg = config(None);
        cfg.client_id = "  ".to_string();
        assert!(matches!(CognitoClient::new(&cfg), Err(IdentityError::Config(_))));
    }

    #[test]
    fn rejection_strips_type_namespace() {
        let body = json!({
            "__type": "com.amazonaws.cognito#NotAuthorizedException",
            "message": "Incorrect username or password."
        });
        let err = rejection(400, &body.to_string());
        assert_eq!(
            err,
            IdentityError::Rejected {
                code: "NotAuthorizedException".to_string(),
                message: "Incorrect username or password.".to_string(),
            }
        );
    }

    #[test]
    fn rejection_falls_back_to_body() {
        let err = rejection(502, "bad gateway");
        assert_eq!(err.to_string(), "bad gateway");
        let err = rejection(500, "");
        assert_eq!(err.to_string(), "Request failed (500).");
    }

    #[tokio::test]
    async fn authenticate_returns_id_token() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let id_token = encode_for_test(&json!({"sub": "u-1", "exp": 4_102_444_800_i64}));

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("X-Amz-Target", "AWSCognitoIdentityProviderService.InitiateAuth"))
            .and(body_json(json!({
                "AuthFlow": "USER_PASSWORD_AUTH",
                "ClientId": "client-123",
                "AuthParameters": {"USERNAME": "a@b.org", "PASSWORD": "hunter22"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AuthenticationResult": {
                    "IdToken": id_token,
                    "AccessToken": "access",
                    "ExpiresIn": 3600,
                    "TokenType": "Bearer"
                },
                "ChallengeParameters": {}
            })))
            .mount(&server)
            .await;

        let client = CognitoClient::new(&config(Some(server.uri()))).unwrap();
        let credential = client
            .authenticate("a@b.org", &SecretString::from("hunter22".to_string()))
            .await
            .unwrap();
        assert_eq!(credential.expose(), id_token);
        assert_eq!(credential.claims().get_str("sub"), Some("u-1"));
    }

    #[tokio::test]
    async fn authenticate_surfaces_provider_message() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "NotAuthorizedException",
                "message": "Incorrect username or password."
            })))
            .mount(&server)
            .await;

        let client = CognitoClient::new(&config(Some(server.uri()))).unwrap();
        let err = client
            .authenticate("a@b.org", &SecretString::from("wrong".to_string()))
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Incorrect username or password.");
    }

    #[tokio::test]
    async fn authenticate_reports_challenges() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ChallengeName": "NEW_PASSWORD_REQUIRED",
                "Session": "opaque"
            })))
            .mount(&server)
            .await;

        let client = CognitoClient::new(&config(Some(server.uri()))).unwrap();
        let err = client
            .authenticate("a@b.org", &SecretString::from("pw".to_string()))
            .await
            .err()
            .unwrap();
        assert_eq!(
            err,
            IdentityError::Challenge("NEW_PASSWORD_REQUIRED".to_string())
        );
    }

    #[tokio::test]
    async fn register_sends_email_attribute() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("X-Amz-Target", "AWSCognitoIdentityProviderService.SignUp"))
            .and(header("Content-Type", CONTENT_TYPE))
            .and(body_json(json!({
                "ClientId": "client-123",
                "Username": "a@b.org",
                "Password": "hunter22",
                "UserAttributes": [{"Name": "email", "Value": "a@b.org"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "UserConfirmed": false,
                "UserSub": "sub-1",
                "CodeDeliveryDetails": {
                    "AttributeName": "email",
                    "DeliveryMedium": "EMAIL",
                    "Destination": "a***@b.org"
                }
            })))
            .mount(&server)
            .await;

        let client = CognitoClient::new(&config(Some(server.uri()))).unwrap();
        let registration = client
            .register(
                "a@b.org",
                &SecretString::from("hunter22".to_string()),
                &[UserAttribute::email("a@b.org")],
            )
            .await
            .unwrap();

        assert_eq!(
            registration,
            Registration {
                username: "a@b.org".to_string(),
                confirmed: false,
                user_sub: Some("sub-1".to_string()),
                delivery_destination: Some("a***@b.org".to_string()),
            }
        );
    }
}
