use super::{Action, account, options, portal};
use anyhow::Result;

pub(super) async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Register(args) => account::register(args).await,
        Action::Login(args) => account::login(args).await,
        Action::Logout(globals) => {
            account::logout(&globals);
            Ok(())
        }
        Action::Status(globals) => {
            account::status(&globals);
            Ok(())
        }
        Action::Volunteer(args) => portal::volunteer(args).await,
        Action::Match(args) => portal::find_matches(args).await,
        Action::Options => {
            print!("{}", options::render());
            Ok(())
        }
    }
}
