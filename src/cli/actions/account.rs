use crate::{
    cli::{commands::account::Credentials, globals::GlobalArgs},
    identity::{self, IdentityProvider, Registration, UserAttribute},
    pages::{self, Navigation, Page},
    session::{Credential, SessionGuard},
};
use anyhow::{Result, anyhow};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub credentials: Credentials,
}

/// Create an account. The username doubles as the email attribute.
///
/// # Errors
/// Returns an error if the username is not an email address or the provider
/// refuses the sign-up.
pub async fn sign_up<P: IdentityProvider>(
    provider: &P,
    credentials: &Credentials,
) -> Result<Registration> {
    if !identity::valid_email(&credentials.username) {
        return Err(anyhow!(
            "invalid email address: {}",
            credentials.username
        ));
    }

    let registration = provider
        .register(
            &credentials.username,
            &credentials.password,
            &[UserAttribute::email(&credentials.username)],
        )
        .await?;

    info!(
        username = %registration.username,
        confirmed = registration.confirmed,
        "account registered"
    );
    Ok(registration)
}

/// Sign in and persist the returned credential.
///
/// # Errors
/// Returns the provider's message verbatim, a storage error, or an error when
/// the returned credential is already unusable. Only a live credential is
/// stored.
pub async fn sign_in<P: IdentityProvider>(
    guard: &SessionGuard,
    provider: &P,
    credentials: &Credentials,
) -> Result<Credential> {
    if let Navigation::Redirect { to: Page::Portal, .. } = pages::enter(Page::SignIn, guard) {
        debug!("replacing an existing session");
    }

    Ok(guard
        .sign_in(provider, &credentials.username, &credentials.password)
        .await?)
}

fn subject(credential: &Credential) -> &str {
    let claims = credential.claims();
    claims
        .get_str("email")
        .or_else(|| claims.get_str("cognito:username"))
        .or_else(|| claims.get_str("sub"))
        .unwrap_or("unknown user")
}

fn remaining(secs: i64) -> String {
    let secs = secs.max(0);
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}

/// One-line summary of the session. Never includes the token.
#[must_use]
pub fn describe(guard: &SessionGuard) -> String {
    match guard.lifetime() {
        Ok((credential, secs)) => {
            let expires_at = credential
                .expires_at()
                .map_or_else(|| "unknown".to_string(), |exp| exp.to_string());
            format!(
                "Signed in as {} (expires at {expires_at}, in {})",
                subject(&credential),
                remaining(secs)
            )
        }
        Err(denial) => format!("Not signed in: {denial}"),
    }
}

/// # Errors
/// Returns an error if the identity provider is not configured or refuses the sign-up.
pub async fn register(args: Args) -> Result<()> {
    let provider = args.globals.identity_provider()?;
    let registration = sign_up(&provider, &args.credentials).await?;

    if registration.confirmed {
        println!("Registration successful for {}.", registration.username);
    } else {
        let destination = registration
            .delivery_destination
            .as_deref()
            .unwrap_or("your email");
        println!(
            "Registration successful for {}. Check {destination} for a confirmation code.",
            registration.username
        );
    }
    Ok(())
}

/// # Errors
/// Returns an error if sign-in fails or the session cannot be stored.
pub async fn login(args: Args) -> Result<()> {
    let guard = args.globals.session_guard();
    let provider = args.globals.identity_provider()?;
    let credential = sign_in(&guard, &provider, &args.credentials).await?;

    println!("Signed in as {}.", subject(&credential));
    Ok(())
}

pub fn logout(globals: &GlobalArgs) {
    globals.session_guard().revoke();
    println!("Signed out.");
}

pub fn status(globals: &GlobalArgs) {
    let guard = globals.session_guard();
    println!("{}", describe(&guard));
}
