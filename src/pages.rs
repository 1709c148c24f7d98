//! Views and the privileged actions each one exposes. The guard decides; this
//! module maps decisions to navigation so the caller only has to perform it.

use crate::session::{Denial, SessionGuard};
use std::fmt;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    SignIn,
    Portal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrivilegedAction {
    RegisterVolunteer,
    FindMatches,
}

impl PrivilegedAction {
    /// The page that exposes this action, entered before it is dispatched.
    #[must_use]
    pub fn page(self) -> Option<Page> {
        Page::ALL.into_iter().find(|page| page.allows(self))
    }
}

impl fmt::Display for PrivilegedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegisterVolunteer => write!(f, "registerVolunteer"),
            Self::FindMatches => write!(f, "findMatches"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Redirect { to: Page, reason: Option<Denial> },
}

impl Page {
    pub const ALL: [Self; 2] = [Self::SignIn, Self::Portal];

    #[must_use]
    pub const fn actions(self) -> &'static [PrivilegedAction] {
        match self {
            Self::SignIn => &[],
            Self::Portal => &[
                PrivilegedAction::RegisterVolunteer,
                PrivilegedAction::FindMatches,
            ],
        }
    }

    #[must_use]
    pub fn allows(self, action: PrivilegedAction) -> bool {
        self.actions().contains(&action)
    }

    const fn requires_session(self) -> bool {
        !self.actions().is_empty()
    }
}

/// Page-load gate. A page exposing privileged actions needs a usable session;
/// the sign-in page sends an already-authenticated user on to the portal.
#[must_use]
pub fn enter(page: Page, guard: &SessionGuard) -> Navigation {
    match (page.requires_session(), guard.evaluate()) {
        (true, Ok(_)) | (false, Err(_)) => Navigation::Stay,
        (true, Err(denial)) => {
            debug!(?page, "page requires a session: {denial}");
            guard.revoke();
            Navigation::Redirect {
                to: Page::SignIn,
                reason: Some(denial),
            }
        }
        (false, Ok(_)) => Navigation::Redirect {
            to: Page::Portal,
            reason: None,
        },
    }
}
