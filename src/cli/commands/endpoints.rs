use crate::cli::globals::{GlobalArgs, default_state_dir};
use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use std::{path::PathBuf, time::Duration};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_USER_POOL_ID: &str = "user-pool-id";
pub const ARG_CLIENT_ID: &str = "client-id";
pub const ARG_IDP_ENDPOINT: &str = "idp-endpoint";
pub const ARG_STATE_DIR: &str = "state-dir";
pub const ARG_REQUEST_TIMEOUT: &str = "request-timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("GraphQL endpoint of the matching API, example: https://api.tld/graphql")
                .env("MATCHGATE_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_USER_POOL_ID)
                .long(ARG_USER_POOL_ID)
                .help("User pool id, example: eu-west-2_AbCdEf")
                .env("MATCHGATE_USER_POOL_ID")
                .global(true),
        )
        .arg(
            Arg::new(ARG_CLIENT_ID)
                .long(ARG_CLIENT_ID)
                .help("User pool app client id")
                .env("MATCHGATE_CLIENT_ID")
                .global(true),
        )
        .arg(
            Arg::new(ARG_IDP_ENDPOINT)
                .long(ARG_IDP_ENDPOINT)
                .help("Identity provider endpoint (default: derived from the user pool region)")
                .env("MATCHGATE_IDP_ENDPOINT")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_DIR)
                .long(ARG_STATE_DIR)
                .help("Directory holding the stored session (default: $XDG_STATE_HOME/matchgate)")
                .env("MATCHGATE_STATE_DIR")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT)
                .long(ARG_REQUEST_TIMEOUT)
                .help("Outgoing request timeout in seconds")
                .env("MATCHGATE_REQUEST_TIMEOUT")
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..=300)),
        )
}

/// Parse the shared endpoint and storage settings.
///
/// # Errors
/// Returns an error if `--state-dir` is unset and no default can be resolved.
pub fn parse(matches: &ArgMatches) -> Result<GlobalArgs> {
    let state_dir = match matches.get_one::<PathBuf>(ARG_STATE_DIR) {
        Some(dir) => dir.clone(),
        None => default_state_dir()?,
    };
    let mut globals = GlobalArgs::new(state_dir);

    globals.api_url = non_empty(matches, ARG_API_URL);
    globals.user_pool_id = non_empty(matches, ARG_USER_POOL_ID);
    globals.client_id = non_empty(matches, ARG_CLIENT_ID);
    globals.idp_endpoint = non_empty(matches, ARG_IDP_ENDPOINT);
    globals.request_timeout = Duration::from_secs(
        matches
            .get_one::<u64>(ARG_REQUEST_TIMEOUT)
            .copied()
            .unwrap_or(10),
    );

    Ok(globals)
}

fn non_empty(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
