//! Borrower model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::loan::Loan;
use super::EntityId;
use crate::query::{MatchMode, SortDirection, SortKey};

/// Borrower record as returned by the store. `loans` holds the currently
/// open loans, recomputed from the loans collection on every fetch.
#[derive(Debug, Clone, Serialize)]
pub struct Borrower {
    pub id: EntityId,
    pub username: String,
    /// Stored in the clear; the store carries whatever the caller supplied.
    pub password: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub last_updated: DateTime<Utc>,
    pub loans: Vec<Loan>,
}

/// Fields for creating a borrower account. All fields are required;
/// username uniqueness is checked by a pre-insert lookup, not by the store.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateBorrower {
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    pub phone: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "address must not be empty"))]
    pub address: String,
}

/// Partial account update. The username is fixed at creation.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateBorrower {
    pub password: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

impl UpdateBorrower {
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
    }
}

/// Search criteria for borrowers.
#[derive(Debug, Clone, Default)]
pub struct BorrowerQuery {
    pub username: Vec<String>,
    pub name: Vec<String>,
    pub phone: Vec<String>,
    pub email: Vec<String>,
    pub address: Vec<String>,
    pub match_mode: MatchMode,
    pub sort: Vec<(BorrowerSortKey, SortDirection)>,
}

/// Sortable borrower fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowerSortKey {
    Username,
    Name,
}

impl SortKey for BorrowerSortKey {
    fn column(&self) -> &'static str {
        match self {
            BorrowerSortKey::Username => "username",
            BorrowerSortKey::Name => "name",
        }
    }
}

/// Result of an account-creation attempt. A taken username is an ordinary
/// negative outcome callers branch on, not an error.
#[derive(Debug, Clone)]
pub enum SignupOutcome {
    Created(EntityId),
    UsernameTaken,
}
