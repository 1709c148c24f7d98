//! Maps validated CLI matches to the action the binary executes.

use crate::cli::actions::{Action, account, portal};
use crate::cli::commands::{account as account_args, endpoints, portal as portal_args};
use anyhow::{Result, anyhow};

/// # Errors
/// Returns an error if a subcommand is missing or its arguments are invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = endpoints::parse(matches)?;

    match matches.subcommand() {
        Some((account_args::SUBCOMMAND_REGISTER, sub)) => Ok(Action::Register(account::Args {
            globals,
            credentials: account_args::Credentials::parse(sub)?,
        })),
        Some((account_args::SUBCOMMAND_LOGIN, sub)) => Ok(Action::Login(account::Args {
            globals,
            credentials: account_args::Credentials::parse(sub)?,
        })),
        Some((account_args::SUBCOMMAND_LOGOUT, _)) => Ok(Action::Logout(globals)),
        Some((account_args::SUBCOMMAND_STATUS, _)) => Ok(Action::Status(globals)),
        Some((portal_args::SUBCOMMAND_VOLUNTEER, sub)) => {
            Ok(Action::Volunteer(portal::VolunteerArgs {
                globals,
                input: portal_args::volunteer_input(sub)?,
            }))
        }
        Some((portal_args::SUBCOMMAND_MATCH, sub)) => Ok(Action::Match(portal::MatchArgs {
            globals,
            criteria: portal_args::match_criteria(sub)?,
        })),
        Some((portal_args::SUBCOMMAND_OPTIONS, _)) => Ok(Action::Options),
        Some((name, _)) => Err(anyhow!("unknown subcommand: {name}")),
        None => Err(anyhow!("missing subcommand")),
    }
}
