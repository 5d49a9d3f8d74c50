//! Loan model, borrow/return outcomes and library metadata

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::EntityId;
use crate::query::{Range, SortDirection, SortKey};

/// A loan record. Created open (`returned = false`), closed exactly once on
/// return, never deleted. The book/borrower references are not retracted
/// when the referenced entity is deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Loan {
    pub id: EntityId,
    pub book: EntityId,
    pub borrower: EntityId,
    pub begin_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub returned: bool,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        !self.returned
    }
}

/// Search criteria for loans.
#[derive(Debug, Clone, Default)]
pub struct LoanQuery {
    pub book: Option<EntityId>,
    pub borrower: Option<EntityId>,
    pub returned: Option<bool>,
    pub begin_date: Vec<Range<DateTime<Utc>>>,
    pub end_date: Vec<Range<DateTime<Utc>>>,
    pub sort: Vec<(LoanSortKey, SortDirection)>,
}

/// Sortable loan fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanSortKey {
    BeginDate,
    EndDate,
}

impl SortKey for LoanSortKey {
    fn column(&self) -> &'static str {
        match self {
            LoanSortKey::BeginDate => "begin_date",
            LoanSortKey::EndDate => "end_date",
        }
    }
}

/// Result of a borrow attempt. Availability and quota rejections are
/// ordinary negative outcomes callers branch on, not errors.
#[derive(Debug, Clone)]
pub enum BorrowOutcome {
    Loaned(Loan),
    /// The book already has an open loan.
    BookUnavailable,
    /// The borrower has reached the configured quota of open loans.
    QuotaExceeded { open: u32, quota: u32 },
}

/// Result of a successful return.
#[derive(Debug, Clone)]
pub struct LoanReturn {
    pub loan: Loan,
    /// Whether the return happened after the agreed end date.
    pub late: bool,
}

/// Library-wide lending policy, a singleton record.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LibraryMeta {
    /// Maximum simultaneous open loans per borrower.
    pub quota: u32,
    /// Loan duration in days, applied at borrow time.
    pub period: u32,
}

impl Default for LibraryMeta {
    fn default() -> Self {
        Self {
            quota: 16,
            period: 14,
        }
    }
}
