//! Catalog service: book operations and JSON import.

use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookQuery, CreateBook, EntityId, UpdateBook},
    repository::Library,
};

#[derive(Clone)]
pub struct CatalogService {
    library: Library,
}

impl CatalogService {
    pub fn new(library: Library) -> Self {
        Self { library }
    }

    pub async fn add(&self, book: &CreateBook) -> AppResult<EntityId> {
        self.library.books.add(book).await
    }

    pub async fn get(&self, id: &EntityId) -> AppResult<Option<Book>> {
        self.library.books.get(id).await
    }

    pub async fn update(&self, id: &EntityId, update: &UpdateBook) -> AppResult<Book> {
        self.library.books.update(id, update).await
    }

    pub async fn delete(&self, id: &EntityId) -> AppResult<Option<Book>> {
        self.library.books.delete(id).await
    }

    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.library.books.search(query).await
    }

    /// Import books from a `.json` file holding an array of book records.
    /// Every record is validated before anything is written; the batch is
    /// inserted in one transaction, all or nothing.
    pub async fn import_books(&self, path: &Path) -> AppResult<Vec<EntityId>> {
        let books: Vec<CreateBook> = read_json_array(path)?;
        let ids = self.library.books.add_many(&books).await?;
        tracing::info!(path = %path.display(), count = ids.len(), "books imported");
        Ok(ids)
    }
}

/// Read and parse a `.json` import file. Any other extension is rejected
/// up-front.
pub(super) fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {}
        _ => {
            return Err(AppError::Validation(format!(
                "unsupported import file (expected .json): {}",
                path.display()
            )))
        }
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
