pub mod account;
pub mod options;
pub mod portal;

// The match over variants lives in `run` so this file stays a list of actions.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Register(account::Args),
    Login(account::Args),
    Logout(GlobalArgs),
    Status(GlobalArgs),
    Volunteer(portal::VolunteerArgs),
    Match(portal::MatchArgs),
    Options,
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
