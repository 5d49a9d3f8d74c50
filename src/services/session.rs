//! Session context.
//!
//! Who the caller is, carried explicitly as a value instead of mutable
//! global login state. A session is obtained from
//! [`AccountsService::login`](super::accounts::AccountsService::login) or
//! [`login_admin`](super::accounts::AccountsService::login_admin) and
//! dropped (or replaced) on logout.

use crate::models::EntityId;

/// The caller's identity for the duration of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Borrower(EntityId),
    Admin,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        matches!(self, Session::Admin)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Session::Anonymous)
    }

    /// The borrower behind this session, if any.
    pub fn borrower(&self) -> Option<&EntityId> {
        match self {
            Session::Borrower(id) => Some(id),
            _ => None,
        }
    }

    /// Pure transition back to [`Session::Anonymous`].
    pub fn logout(self) -> Session {
        Session::Anonymous
    }
}

/// Result of a login attempt. Bad credentials are a negative outcome the
/// caller branches on, not an error; which part was wrong is not disclosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Granted(Session),
    Denied,
}
