//! Store client and per-entity repositories.
//!
//! [`Library`] owns the connection pool and the four collection tables
//! (books, borrowers, loans, library metadata). Connecting checks that every
//! configured table exists and fails with `MissingCollection` when one is
//! absent and creation was not requested, so a misconfigured deployment
//! surfaces at startup rather than mid-operation.

pub mod books;
pub mod borrowers;
pub mod loans;
pub mod meta;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::{
    config::{AppConfig, CollectionsConfig},
    error::{AppError, AppResult},
};

/// Validated names of the collection tables. Names are interpolated into
/// SQL, so they must be plain identifiers.
#[derive(Debug, Clone)]
pub struct Tables {
    pub books: String,
    pub borrowers: String,
    pub loans: String,
    pub library: String,
}

impl Tables {
    pub fn from_config(config: &CollectionsConfig) -> AppResult<Self> {
        for name in [
            &config.books,
            &config.borrowers,
            &config.loans,
            &config.library,
        ] {
            if !is_identifier(name) {
                return Err(AppError::Validation(format!(
                    "collection name is not a valid identifier: {:?}",
                    name
                )));
            }
        }
        Ok(Self {
            books: config.books.clone(),
            borrowers: config.borrowers.clone(),
            loans: config.loans.clone(),
            library: config.library.clone(),
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Main store client holding the pool and the per-entity repositories.
#[derive(Clone)]
pub struct Library {
    pub pool: SqlitePool,
    pub books: books::BooksRepository,
    pub borrowers: borrowers::BorrowersRepository,
    pub loans: loans::LoansRepository,
    pub meta: meta::MetaRepository,
}

impl Library {
    /// Connect to the configured store and select the four collections.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        let tables = Tables::from_config(&config.collections)?;
        let create = config.database.create_missing;

        let options = SqliteConnectOptions::from_str(&config.database.url)?
            .create_if_missing(create)
            .foreign_keys(false);

        // An in-memory database lives and dies with its connection: pin a
        // single connection and never recycle it, or the data vanishes
        // between operations.
        let in_memory =
            config.database.url.contains(":memory:") || config.database.url.contains("mode=memory");
        let max_connections = if in_memory {
            1
        } else {
            config.database.max_connections
        };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        tracing::info!(url = %config.database.url, "connected to library store");

        ensure_collections(&pool, &tables, create).await?;

        Ok(Self {
            books: books::BooksRepository::new(pool.clone(), tables.clone()),
            borrowers: borrowers::BorrowersRepository::new(pool.clone(), tables.clone()),
            loans: loans::LoansRepository::new(pool.clone(), tables.clone()),
            meta: meta::MetaRepository::new(pool.clone(), tables),
            pool,
        })
    }

    /// Close the connection pool.
    pub async fn disconnect(&self) {
        self.pool.close().await;
    }
}

/// Check that every configured table exists; create the schema when allowed.
async fn ensure_collections(pool: &SqlitePool, tables: &Tables, create: bool) -> AppResult<()> {
    let existing: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;

    for name in [
        &tables.books,
        &tables.borrowers,
        &tables.loans,
        &tables.library,
    ] {
        if existing.iter().any(|t| t == name) {
            continue;
        }
        if !create {
            return Err(AppError::MissingCollection(name.clone()));
        }
    }

    if create {
        create_schema(pool, tables).await?;
    }

    Ok(())
}

async fn create_schema(pool: &SqlitePool, tables: &Tables) -> AppResult<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{books}" (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            isbn TEXT,
            authors TEXT NOT NULL DEFAULT '[]',
            genres TEXT NOT NULL DEFAULT '[]',
            publisher TEXT NOT NULL DEFAULT '[]',
            pages INTEGER,
            words INTEGER,
            pub_date TEXT,
            last_updated TEXT NOT NULL
        )
        "#,
        books = tables.books
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{borrowers}" (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            password TEXT NOT NULL,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            last_updated TEXT NOT NULL
        )
        "#,
        borrowers = tables.borrowers
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{loans}" (
            id TEXT PRIMARY KEY,
            book_id TEXT NOT NULL,
            borrower_id TEXT NOT NULL,
            begin_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            returned INTEGER NOT NULL DEFAULT 0
        )
        "#,
        loans = tables.loans
    ))
    .execute(pool)
    .await?;

    // At most one open loan may reference a book.
    sqlx::query(&format!(
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "{loans}_open_book" ON "{loans}" (book_id) WHERE returned = 0"#,
        loans = tables.loans
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"CREATE INDEX IF NOT EXISTS "{loans}_borrower" ON "{loans}" (borrower_id, returned)"#,
        loans = tables.loans
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{library}" (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            quota INTEGER NOT NULL,
            period INTEGER NOT NULL
        )
        "#,
        library = tables.library
    ))
    .execute(pool)
    .await?;

    // Seed the metadata singleton so a fresh library has a lending policy.
    let defaults = crate::models::LibraryMeta::default();
    sqlx::query(&format!(
        r#"INSERT OR IGNORE INTO "{library}" (id, quota, period) VALUES (1, ?, ?)"#,
        library = tables.library
    ))
    .bind(defaults.quota as i64)
    .bind(defaults.period as i64)
    .execute(pool)
    .await?;

    tracing::debug!("collection schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_validation() {
        assert!(is_identifier("books"));
        assert!(is_identifier("_loans2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2books"));
        assert!(!is_identifier("books; DROP TABLE loans"));
    }
}
