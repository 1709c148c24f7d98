use crate::{
    APP_USER_AGENT,
    api::GraphqlClient,
    identity::{CognitoClient, CognitoConfig},
    session::{FileStore, SessionGuard, SystemClock},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc, time::Duration};
use url::Url;

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub api_url: Option<String>,
    pub user_pool_id: Option<String>,
    pub client_id: Option<String>,
    pub idp_endpoint: Option<String>,
    pub state_dir: PathBuf,
    pub request_timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            api_url: None,
            user_pool_id: None,
            client_id: None,
            idp_endpoint: None,
            state_dir,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Guard over the on-disk session, already loaded.
    #[must_use]
    pub fn session_guard(&self) -> SessionGuard {
        let guard = SessionGuard::new(
            Arc::new(FileStore::new(&self.state_dir)),
            Arc::new(SystemClock),
        );
        guard.load_session();
        guard
    }

    /// # Errors
    /// Returns an error if `--api-url` is missing or not a URL.
    pub fn graphql_client(&self) -> Result<GraphqlClient> {
        let raw = self
            .api_url
            .as_deref()
            .context("missing required argument: --api-url")?;
        let endpoint = Url::parse(raw).with_context(|| format!("invalid --api-url: {raw}"))?;
        Ok(GraphqlClient::new(
            endpoint,
            APP_USER_AGENT,
            self.request_timeout,
        )?)
    }

    /// # Errors
    /// Returns an error if the user pool settings are missing or unusable.
    pub fn identity_provider(&self) -> Result<CognitoClient> {
        let config = CognitoConfig {
            user_pool_id: self
                .user_pool_id
                .clone()
                .context("missing required argument: --user-pool-id")?,
            client_id: self
                .client_id
                .clone()
                .context("missing required argument: --client-id")?,
            endpoint: self.idp_endpoint.clone(),
            timeout: self.request_timeout,
            user_agent: APP_USER_AGENT.to_string(),
        };
        Ok(CognitoClient::new(&config)?)
    }
}

/// `$XDG_STATE_HOME/matchgate` (or `~/.local/state/matchgate`), and the local
/// data directory on platforms without a state directory.
///
/// # Errors
/// Returns an error if no home directory can be determined.
pub fn default_state_dir() -> Result<PathBuf> {
    let base = dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .context("failed to get home directory, set --state-dir")?;
    Ok(base.join(env!("CARGO_PKG_NAME")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(PathBuf::from("/tmp/matchgate"));
        assert_eq!(args.state_dir, PathBuf::from("/tmp/matchgate"));
        assert_eq!(args.request_timeout, Duration::from_secs(10));
        assert!(args.api_url.is_none());
    }

    #[test]
    fn test_missing_api_url() {
        let args = GlobalArgs::new(PathBuf::from("/tmp/matchgate"));
        let err = args.graphql_client().err().map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("missing required argument: --api-url")
        );
    }

    #[test]
    fn test_invalid_api_url() {
        let mut args = GlobalArgs::new(PathBuf::from("/tmp/matchgate"));
        args.api_url = Some("not a url".to_string());
        let err = args.graphql_client().err().map(|e| e.to_string());
        assert!(err.is_some_and(|e| e.starts_with("invalid --api-url")));
    }

    #[test]
    fn test_missing_pool_settings() {
        let mut args = GlobalArgs::new(PathBuf::from("/tmp/matchgate"));
        args.user_pool_id = Some("eu-west-2_AbCdEf".to_string());
        let err = args.identity_provider().err().map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("missing required argument: --client-id")
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_default_state_dir() {
        temp_env::with_vars(
            [
                ("XDG_STATE_HOME", Some("/var/state")),
                ("HOME", Some("/home/ada")),
            ],
            || {
                assert_eq!(
                    default_state_dir().ok(),
                    Some(PathBuf::from("/var/state/matchgate"))
                );
            },
        );
        temp_env::with_vars(
            [("XDG_STATE_HOME", None), ("HOME", Some("/home/ada"))],
            || {
                assert_eq!(
                    default_state_dir().ok(),
                    Some(PathBuf::from("/home/ada/.local/state/matchgate"))
                );
            },
        );
    }

    #[test]
    fn test_default_state_dir_is_never_relative() {
        temp_env::with_vars(
            [
                ("XDG_STATE_HOME", Some("relative/state")),
                ("HOME", None::<&str>),
            ],
            || match default_state_dir() {
                Ok(dir) => assert!(dir.is_absolute(), "{}", dir.display()),
                Err(err) => assert!(err.to_string().contains("--state-dir")),
            },
        );
    }
}
