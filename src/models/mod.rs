//! Data models for Bibliotheca

pub mod book;
pub mod borrower;
pub mod id;
pub mod loan;

// Re-export commonly used types
pub use book::{Book, BookQuery, BookSortKey, CreateBook, UpdateBook};
pub use borrower::{
    Borrower, BorrowerQuery, BorrowerSortKey, CreateBorrower, SignupOutcome, UpdateBorrower,
};
pub use id::EntityId;
pub use loan::{BorrowOutcome, LibraryMeta, Loan, LoanQuery, LoanReturn, LoanSortKey};
