//! Borrowers repository for store operations

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use validator::Validate;

use super::Tables;
use crate::{
    error::{AppError, AppResult},
    models::{Borrower, BorrowerQuery, CreateBorrower, EntityId, Loan, UpdateBorrower},
    query::{bind_args, order_clause, FilterBuilder},
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: SqlitePool,
    tables: Tables,
}

impl BorrowersRepository {
    pub fn new(pool: SqlitePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    /// Get a borrower by id, enriched with their open loans. Absent is not
    /// an error.
    pub async fn get(&self, id: &EntityId) -> AppResult<Option<Borrower>> {
        let sql = format!(
            r#"SELECT * FROM "{borrowers}" WHERE id = ?"#,
            borrowers = self.tables.borrowers
        );
        let Some(row) = sqlx::query(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut borrower = borrower_from_row(&row)?;
        borrower.loans = self.open_loans(id).await?;
        Ok(Some(borrower))
    }

    /// Exact, case-sensitive username lookup (login and the pre-insert
    /// uniqueness check).
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<Borrower>> {
        let sql = format!(
            r#"SELECT * FROM "{borrowers}" WHERE username = ?"#,
            borrowers = self.tables.borrowers
        );
        let Some(row) = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut borrower = borrower_from_row(&row)?;
        let id = borrower.id;
        borrower.loans = self.open_loans(&id).await?;
        Ok(Some(borrower))
    }

    /// Check whether a borrower exists. Absent yields false, never an error.
    pub async fn exists(&self, id: &EntityId) -> AppResult<bool> {
        let sql = format!(
            r#"SELECT EXISTS (SELECT 1 FROM "{borrowers}" WHERE id = ?)"#,
            borrowers = self.tables.borrowers
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id.to_hex())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let sql = format!(
            r#"SELECT EXISTS (SELECT 1 FROM "{borrowers}" WHERE username = ?)"#,
            borrowers = self.tables.borrowers
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a borrower record. Uniqueness of the username is the caller's
    /// concern (see `AccountsService::signup`).
    pub async fn add(&self, borrower: &CreateBorrower) -> AppResult<EntityId> {
        borrower.validate()?;
        let id = EntityId::new();
        let sql = format!(
            r#"
            INSERT INTO "{borrowers}"
                (id, username, password, name, phone, email, address, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            borrowers = self.tables.borrowers
        );
        sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(&borrower.username)
            .bind(&borrower.password)
            .bind(&borrower.name)
            .bind(&borrower.phone)
            .bind(&borrower.email)
            .bind(&borrower.address)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        tracing::debug!(borrower = %id, username = %borrower.username, "borrower added");
        Ok(id)
    }

    /// Import a batch of borrowers in one transaction: every record is
    /// validated up-front and either the whole batch lands or none of it.
    /// With `update`, a record whose username already exists overwrites that
    /// account; without it, a taken username aborts the import.
    pub async fn import(&self, borrowers: &[CreateBorrower], update: bool) -> AppResult<Vec<EntityId>> {
        for (index, borrower) in borrowers.iter().enumerate() {
            borrower
                .validate()
                .map_err(|e| AppError::Validation(format!("record {}: {}", index, e)))?;
        }

        let lookup_sql = format!(
            r#"SELECT id FROM "{borrowers}" WHERE username = ?"#,
            borrowers = self.tables.borrowers
        );
        let insert_sql = format!(
            r#"
            INSERT INTO "{borrowers}"
                (id, username, password, name, phone, email, address, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            borrowers = self.tables.borrowers
        );
        let update_sql = format!(
            r#"
            UPDATE "{borrowers}" SET
                password = ?, name = ?, phone = ?, email = ?, address = ?, last_updated = ?
            WHERE username = ?
            "#,
            borrowers = self.tables.borrowers
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(borrowers.len());
        for (index, borrower) in borrowers.iter().enumerate() {
            let existing: Option<String> = sqlx::query_scalar(&lookup_sql)
                .bind(&borrower.username)
                .fetch_optional(&mut *tx)
                .await?;

            match existing {
                Some(id) if update => {
                    sqlx::query(&update_sql)
                        .bind(&borrower.password)
                        .bind(&borrower.name)
                        .bind(&borrower.phone)
                        .bind(&borrower.email)
                        .bind(&borrower.address)
                        .bind(now)
                        .bind(&borrower.username)
                        .execute(&mut *tx)
                        .await?;
                    ids.push(id.parse()?);
                }
                Some(_) => {
                    return Err(AppError::Validation(format!(
                        "record {}: username {:?} is already taken",
                        index, borrower.username
                    )));
                }
                None => {
                    let id = EntityId::new();
                    sqlx::query(&insert_sql)
                        .bind(id.to_hex())
                        .bind(&borrower.username)
                        .bind(&borrower.password)
                        .bind(&borrower.name)
                        .bind(&borrower.phone)
                        .bind(&borrower.email)
                        .bind(&borrower.address)
                        .bind(now)
                        .execute(&mut *tx)
                        .await?;
                    ids.push(id);
                }
            }
        }
        tx.commit().await?;
        tracing::debug!(count = ids.len(), update, "borrower batch imported");
        Ok(ids)
    }

    /// Merge the provided fields into an existing borrower. Fails with
    /// `NotFound` when absent; always refreshes `last_updated`.
    pub async fn update(&self, id: &EntityId, update: &UpdateBorrower) -> AppResult<Borrower> {
        update.validate()?;

        let sql = format!(
            r#"
            UPDATE "{borrowers}" SET
                password = COALESCE(?, password),
                name = COALESCE(?, name),
                phone = COALESCE(?, phone),
                email = COALESCE(?, email),
                address = COALESCE(?, address),
                last_updated = ?
            WHERE id = ?
            "#,
            borrowers = self.tables.borrowers
        );
        let result = sqlx::query(&sql)
            .bind(&update.password)
            .bind(&update.name)
            .bind(&update.phone)
            .bind(&update.email)
            .bind(&update.address)
            .bind(Utc::now())
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Borrower with id {} not found",
                id
            )));
        }

        self.get(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Borrower with id {} not found", id))
        })
    }

    /// Delete a borrower, returning the deleted record or None when absent.
    /// Their loans are deliberately left in place, even open ones.
    pub async fn delete(&self, id: &EntityId) -> AppResult<Option<Borrower>> {
        let Some(borrower) = self.get(id).await? else {
            return Ok(None);
        };

        let sql = format!(
            r#"DELETE FROM "{borrowers}" WHERE id = ?"#,
            borrowers = self.tables.borrowers
        );
        sqlx::query(&sql)
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;

        tracing::debug!(borrower = %id, "borrower deleted");
        Ok(Some(borrower))
    }

    /// Search borrowers; every hit is enriched with its open loans.
    pub async fn search(&self, query: &BorrowerQuery) -> AppResult<Vec<Borrower>> {
        let mut builder = FilterBuilder::new();
        builder
            .text_all("username", &query.username, query.match_mode)
            .text_all("name", &query.name, query.match_mode)
            .text_all("phone", &query.phone, query.match_mode)
            .text_all("email", &query.email, query.match_mode)
            .text_all("address", &query.address, query.match_mode);
        let filter = builder.build();

        let sql = format!(
            r#"SELECT * FROM "{borrowers}" {where_sql} {order_sql}"#,
            borrowers = self.tables.borrowers,
            where_sql = filter.where_sql,
            order_sql = order_clause(&query.sort),
        );
        let rows = bind_args(sqlx::query(&sql), &filter.args)
            .fetch_all(&self.pool)
            .await?;

        let mut borrowers = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut borrower = borrower_from_row(row)?;
            let id = borrower.id;
            borrower.loans = self.open_loans(&id).await?;
            borrowers.push(borrower);
        }
        Ok(borrowers)
    }

    /// Open loans for a borrower, recomputed per call.
    async fn open_loans(&self, borrower: &EntityId) -> AppResult<Vec<Loan>> {
        let sql = format!(
            r#"
            SELECT id, book_id, borrower_id, begin_date, end_date, returned
            FROM "{loans}"
            WHERE borrower_id = ? AND returned = 0
            ORDER BY begin_date
            "#,
            loans = self.tables.loans
        );
        let rows = sqlx::query(&sql)
            .bind(borrower.to_hex())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(super::loans::loan_from_row).collect()
    }
}

fn borrower_from_row(row: &SqliteRow) -> AppResult<Borrower> {
    let id: String = row.try_get("id")?;
    Ok(Borrower {
        id: id.parse()?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        last_updated: row.try_get::<DateTime<Utc>, _>("last_updated")?,
        loans: Vec::new(),
    })
}
