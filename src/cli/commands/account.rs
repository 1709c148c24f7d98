use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const SUBCOMMAND_REGISTER: &str = "register";
pub const SUBCOMMAND_LOGIN: &str = "login";
pub const SUBCOMMAND_LOGOUT: &str = "logout";
pub const SUBCOMMAND_STATUS: &str = "status";

pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";

fn credential_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long(ARG_USERNAME)
                .help("Account email address")
                .env("MATCHGATE_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .short('p')
                .long(ARG_PASSWORD)
                .help("Account password")
                .env("MATCHGATE_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(credential_args(
            Command::new(SUBCOMMAND_REGISTER).about("Create an account in the user pool"),
        ))
        .subcommand(credential_args(
            Command::new(SUBCOMMAND_LOGIN).about("Sign in and store the session"),
        ))
        .subcommand(Command::new(SUBCOMMAND_LOGOUT).about("Forget the stored session"))
        .subcommand(
            Command::new(SUBCOMMAND_STATUS).about("Show whether the stored session is usable"),
        )
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    /// # Errors
    /// Returns an error if the username or password is missing or blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let username = matches
            .get_one::<String>(ARG_USERNAME)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("missing required argument: --username")?;
        let password = matches
            .get_one::<String>(ARG_PASSWORD)
            .filter(|value| !value.is_empty())
            .map(|value| SecretString::from(value.clone()))
            .context("missing required argument: --password")?;

        Ok(Self { username, password })
    }
}
