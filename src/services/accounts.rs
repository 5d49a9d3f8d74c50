//! Accounts service: borrower operations, login and JSON import.

use std::path::Path;

use validator::Validate;

use super::catalog::read_json_array;
use super::session::{LoginOutcome, Session};
use crate::{
    config::AdminConfig,
    error::AppResult,
    models::{
        Borrower, BorrowerQuery, CreateBorrower, EntityId, SignupOutcome, UpdateBorrower,
    },
    repository::Library,
};

#[derive(Clone)]
pub struct AccountsService {
    library: Library,
    admin: AdminConfig,
}

impl AccountsService {
    pub fn new(library: Library, admin: AdminConfig) -> Self {
        Self { library, admin }
    }

    /// Create a borrower account. A taken username is an ordinary negative
    /// outcome; the store itself does not enforce uniqueness.
    pub async fn signup(&self, borrower: &CreateBorrower) -> AppResult<SignupOutcome> {
        borrower.validate()?;
        if self.library.borrowers.username_exists(&borrower.username).await? {
            tracing::debug!(username = %borrower.username, "signup rejected, username taken");
            return Ok(SignupOutcome::UsernameTaken);
        }
        let id = self.library.borrowers.add(borrower).await?;
        Ok(SignupOutcome::Created(id))
    }

    /// Authenticate a borrower: exact, case-sensitive username match plus
    /// password equality. Which part was wrong is not disclosed.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let Some(borrower) = self.library.borrowers.get_by_username(username).await? else {
            return Ok(LoginOutcome::Denied);
        };
        if borrower.password != password {
            return Ok(LoginOutcome::Denied);
        }
        tracing::info!(borrower = %borrower.id, "borrower logged in");
        Ok(LoginOutcome::Granted(Session::Borrower(borrower.id)))
    }

    /// Authenticate as the administrator against the configured credentials.
    pub fn login_admin(&self, username: &str, password: &str) -> LoginOutcome {
        if username == self.admin.username && password == self.admin.password {
            tracing::info!("administrator logged in");
            LoginOutcome::Granted(Session::Admin)
        } else {
            LoginOutcome::Denied
        }
    }

    pub async fn get(&self, id: &EntityId) -> AppResult<Option<Borrower>> {
        self.library.borrowers.get(id).await
    }

    pub async fn update(&self, id: &EntityId, update: &UpdateBorrower) -> AppResult<Borrower> {
        self.library.borrowers.update(id, update).await
    }

    pub async fn delete(&self, id: &EntityId) -> AppResult<Option<Borrower>> {
        self.library.borrowers.delete(id).await
    }

    pub async fn search(&self, query: &BorrowerQuery) -> AppResult<Vec<Borrower>> {
        self.library.borrowers.search(query).await
    }

    /// Import borrowers from a `.json` file. With `update`, records whose
    /// username already exists overwrite that account; the batch lands in
    /// one transaction, all or nothing.
    pub async fn import_borrowers(&self, path: &Path, update: bool) -> AppResult<Vec<EntityId>> {
        let borrowers: Vec<CreateBorrower> = read_json_array(path)?;
        let ids = self.library.borrowers.import(&borrowers, update).await?;
        tracing::info!(path = %path.display(), count = ids.len(), "borrowers imported");
        Ok(ids)
    }
}
