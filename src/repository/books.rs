//! Books repository for store operations

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use validator::Validate;

use super::Tables;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookQuery, CreateBook, EntityId, UpdateBook},
    query::{bind_args, order_clause, FilterBuilder},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: SqlitePool,
    tables: Tables,
}

impl BooksRepository {
    pub fn new(pool: SqlitePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    /// SELECT with the derived `borrowed` flag recomputed from the loans
    /// collection on every read.
    fn select_sql(&self, where_sql: &str, order_sql: &str) -> String {
        format!(
            r#"
            SELECT b.id, b.name, b.isbn, b.authors, b.genres, b.publisher,
                   b.pages, b.words, b.pub_date, b.last_updated,
                   EXISTS (
                       SELECT 1 FROM "{loans}" l
                       WHERE l.book_id = b.id AND l.returned = 0
                   ) AS borrowed
            FROM "{books}" b
            {where_sql}
            {order_sql}
            "#,
            loans = self.tables.loans,
            books = self.tables.books,
            where_sql = where_sql,
            order_sql = order_sql,
        )
    }

    /// Get a book by id. Absent is not an error.
    pub async fn get(&self, id: &EntityId) -> AppResult<Option<Book>> {
        let sql = self.select_sql("WHERE b.id = ?", "");
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| book_from_row(&r)).transpose()
    }

    /// Check whether a book exists. Absent yields false, never an error.
    pub async fn exists(&self, id: &EntityId) -> AppResult<bool> {
        let sql = format!(
            r#"SELECT EXISTS (SELECT 1 FROM "{books}" WHERE id = ?)"#,
            books = self.tables.books
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id.to_hex())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Add a book, returning its new identifier.
    pub async fn add(&self, book: &CreateBook) -> AppResult<EntityId> {
        book.validate()?;
        let id = EntityId::new();
        self.insert(&self.pool, &id, book, Utc::now()).await?;
        tracing::debug!(book = %id, name = %book.name, "book added");
        Ok(id)
    }

    /// Add a batch of books in one transaction: every record is validated
    /// up-front and either all are inserted or none.
    pub async fn add_many(&self, books: &[CreateBook]) -> AppResult<Vec<EntityId>> {
        for (index, book) in books.iter().enumerate() {
            book.validate()
                .map_err(|e| AppError::Validation(format!("record {}: {}", index, e)))?;
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(books.len());
        for book in books {
            let id = EntityId::new();
            self.insert(&mut *tx, &id, book, now).await?;
            ids.push(id);
        }
        tx.commit().await?;
        tracing::debug!(count = ids.len(), "book batch added");
        Ok(ids)
    }

    async fn insert<'e, E>(
        &self,
        executor: E,
        id: &EntityId,
        book: &CreateBook,
        now: DateTime<Utc>,
    ) -> AppResult<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let sql = format!(
            r#"
            INSERT INTO "{books}"
                (id, name, isbn, authors, genres, publisher, pages, words, pub_date, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            books = self.tables.books
        );
        sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(&book.name)
            .bind(&book.isbn)
            .bind(serde_json::to_string(&book.authors)?)
            .bind(serde_json::to_string(&book.genres)?)
            .bind(serde_json::to_string(&book.publisher)?)
            .bind(book.pages.map(i64::from))
            .bind(book.words.map(i64::from))
            .bind(book.pub_date)
            .bind(now)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Merge the provided fields into an existing book. Fails with
    /// `NotFound` when the book is absent; always refreshes `last_updated`.
    pub async fn update(&self, id: &EntityId, update: &UpdateBook) -> AppResult<Book> {
        if let Some(ref name) = update.name {
            if name.is_empty() {
                return Err(AppError::Validation(
                    "book name must not be empty".to_string(),
                ));
            }
        }

        let authors = update
            .authors
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let genres = update
            .genres
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let publisher = update
            .publisher
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let sql = format!(
            r#"
            UPDATE "{books}" SET
                name = COALESCE(?, name),
                isbn = COALESCE(?, isbn),
                authors = COALESCE(?, authors),
                genres = COALESCE(?, genres),
                publisher = COALESCE(?, publisher),
                pages = COALESCE(?, pages),
                words = COALESCE(?, words),
                pub_date = COALESCE(?, pub_date),
                last_updated = ?
            WHERE id = ?
            "#,
            books = self.tables.books
        );
        let result = sqlx::query(&sql)
            .bind(&update.name)
            .bind(&update.isbn)
            .bind(authors)
            .bind(genres)
            .bind(publisher)
            .bind(update.pages.map(i64::from))
            .bind(update.words.map(i64::from))
            .bind(update.pub_date)
            .bind(Utc::now())
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book, returning the deleted record or None when absent.
    /// Loans referencing the book are left untouched.
    pub async fn delete(&self, id: &EntityId) -> AppResult<Option<Book>> {
        let Some(book) = self.get(id).await? else {
            return Ok(None);
        };

        let sql = format!(
            r#"DELETE FROM "{books}" WHERE id = ?"#,
            books = self.tables.books
        );
        sqlx::query(&sql)
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;

        tracing::debug!(book = %id, "book deleted");
        Ok(Some(book))
    }

    /// Search books with the composed filter; an empty query matches
    /// everything in store-native order.
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut builder = FilterBuilder::new();
        builder
            .text_all("b.name", &query.name, query.match_mode)
            .text_all("b.isbn", &query.isbn, query.match_mode)
            .text_all_in_list("b.authors", &query.authors, query.match_mode)
            .text_all_in_list("b.genres", &query.genres, query.match_mode)
            .text_all_in_list("b.publisher", &query.publisher, query.match_mode)
            .range_any("b.pages", &query.pages)
            .range_any("b.words", &query.words)
            .range_any("b.pub_date", &query.pub_date);
        let filter = builder.build();

        let sql = self.select_sql(&filter.where_sql, &order_clause(&query.sort));
        let rows = bind_args(sqlx::query(&sql), &filter.args)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(book_from_row).collect()
    }
}

fn book_from_row(row: &SqliteRow) -> AppResult<Book> {
    let id: String = row.try_get("id")?;
    let authors: String = row.try_get("authors")?;
    let genres: String = row.try_get("genres")?;
    let publisher: String = row.try_get("publisher")?;

    Ok(Book {
        id: id.parse()?,
        name: row.try_get("name")?,
        isbn: row.try_get("isbn")?,
        authors: serde_json::from_str(&authors)?,
        genres: serde_json::from_str(&genres)?,
        publisher: serde_json::from_str(&publisher)?,
        pages: row.try_get::<Option<i64>, _>("pages")?.map(|v| v as u32),
        words: row.try_get::<Option<i64>, _>("words")?.map(|v| v as u32),
        pub_date: row.try_get::<Option<NaiveDate>, _>("pub_date")?,
        last_updated: row.try_get::<DateTime<Utc>, _>("last_updated")?,
        borrowed: row.try_get("borrowed")?,
    })
}
