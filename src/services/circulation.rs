//! Circulation service: borrowing, returning and the lending policy.

use crate::{
    error::{AppError, AppResult},
    models::{BorrowOutcome, EntityId, LibraryMeta, Loan, LoanQuery, LoanReturn},
    repository::Library,
};

#[derive(Clone)]
pub struct CirculationService {
    library: Library,
}

impl CirculationService {
    pub fn new(library: Library) -> Self {
        Self { library }
    }

    /// Borrow a book for a borrower. Both must exist; availability and
    /// quota are checked atomically by the store, so a concurrent borrow of
    /// the same book cannot also succeed.
    pub async fn borrow(&self, book: &EntityId, borrower: &EntityId) -> AppResult<BorrowOutcome> {
        if !self.library.books.exists(book).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", book)));
        }
        if !self.library.borrowers.exists(borrower).await? {
            return Err(AppError::NotFound(format!(
                "Borrower with id {} not found",
                borrower
            )));
        }
        let meta = self.library.meta.get().await?;
        self.library.loans.create_open(book, borrower, &meta).await
    }

    /// Return a loan. Fails with `NotFound` for an unknown loan and with
    /// `BusinessRule` when it was already returned.
    pub async fn return_loan(&self, loan: &EntityId) -> AppResult<LoanReturn> {
        self.library.loans.return_loan(loan).await
    }

    pub async fn get_loan(&self, id: &EntityId) -> AppResult<Option<Loan>> {
        self.library.loans.get(id).await
    }

    pub async fn search_loans(&self, query: &LoanQuery) -> AppResult<Vec<Loan>> {
        self.library.loans.search(query).await
    }

    /// The current lending policy (per-borrower quota and loan period).
    pub async fn policy(&self) -> AppResult<LibraryMeta> {
        self.library.meta.get().await
    }

    /// Adjust the lending policy. Omitted fields keep their value; open
    /// loans keep the dates they were created with.
    pub async fn set_policy(
        &self,
        quota: Option<u32>,
        period: Option<u32>,
    ) -> AppResult<LibraryMeta> {
        self.library.meta.update(quota, period).await
    }
}
