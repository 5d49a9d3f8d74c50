//! Loans repository for store operations

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::Tables;
use crate::{
    error::{AppError, AppResult},
    models::{BorrowOutcome, EntityId, LibraryMeta, Loan, LoanQuery, LoanReturn},
    query::{bind_args, order_clause, Arg, FilterBuilder},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: SqlitePool,
    tables: Tables,
}

impl LoansRepository {
    pub fn new(pool: SqlitePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    /// Get a loan by id. Absent is not an error.
    pub async fn get(&self, id: &EntityId) -> AppResult<Option<Loan>> {
        let sql = format!(
            r#"SELECT * FROM "{loans}" WHERE id = ?"#,
            loans = self.tables.loans
        );
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| loan_from_row(&r)).transpose()
    }

    /// Search loans with the composed filter.
    pub async fn search(&self, query: &LoanQuery) -> AppResult<Vec<Loan>> {
        let mut builder = FilterBuilder::new();
        if let Some(ref book) = query.book {
            builder.equals_id("book_id", book);
        }
        if let Some(ref borrower) = query.borrower {
            builder.equals_id("borrower_id", borrower);
        }
        if let Some(returned) = query.returned {
            builder.equals("returned", Arg::Bool(returned));
        }
        builder
            .range_any("begin_date", &query.begin_date)
            .range_any("end_date", &query.end_date);
        let filter = builder.build();

        let sql = format!(
            r#"SELECT * FROM "{loans}" {where_sql} {order_sql}"#,
            loans = self.tables.loans,
            where_sql = filter.where_sql,
            order_sql = order_clause(&query.sort),
        );
        let rows = bind_args(sqlx::query(&sql), &filter.args)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(loan_from_row).collect()
    }

    /// Whether the book has an open loan.
    pub async fn book_borrowed(&self, book: &EntityId) -> AppResult<bool> {
        let sql = format!(
            r#"SELECT EXISTS (SELECT 1 FROM "{loans}" WHERE book_id = ? AND returned = 0)"#,
            loans = self.tables.loans
        );
        let borrowed: bool = sqlx::query_scalar(&sql)
            .bind(book.to_hex())
            .fetch_one(&self.pool)
            .await?;
        Ok(borrowed)
    }

    /// Number of open loans held by a borrower.
    pub async fn open_loan_count(&self, borrower: &EntityId) -> AppResult<u32> {
        let sql = format!(
            r#"SELECT COUNT(*) FROM "{loans}" WHERE borrower_id = ? AND returned = 0"#,
            loans = self.tables.loans
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(borrower.to_hex())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u32)
    }

    /// Open a loan if and only if the book has no open loan and the borrower
    /// is below quota. Both conditions are evaluated inside the single
    /// guarded INSERT, so concurrent borrow attempts cannot both succeed;
    /// the partial unique index on open loans backs this up.
    pub async fn create_open(
        &self,
        book: &EntityId,
        borrower: &EntityId,
        meta: &LibraryMeta,
    ) -> AppResult<BorrowOutcome> {
        let id = EntityId::new();
        let begin = Utc::now();
        let end = begin + Duration::days(i64::from(meta.period));

        let sql = format!(
            r#"
            INSERT INTO "{loans}" (id, book_id, borrower_id, begin_date, end_date, returned)
            SELECT ?, ?, ?, ?, ?, 0
            WHERE NOT EXISTS (
                SELECT 1 FROM "{loans}" WHERE book_id = ? AND returned = 0
            )
            AND (SELECT COUNT(*) FROM "{loans}" WHERE borrower_id = ? AND returned = 0) < ?
            "#,
            loans = self.tables.loans
        );
        let result = sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(book.to_hex())
            .bind(borrower.to_hex())
            .bind(begin)
            .bind(end)
            .bind(book.to_hex())
            .bind(borrower.to_hex())
            .bind(meta.quota as i64)
            .execute(&self.pool)
            .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                // Lost the race on the open-loan index.
                return Ok(BorrowOutcome::BookUnavailable);
            }
            Err(e) => return Err(e.into()),
        };

        if result.rows_affected() == 0 {
            if self.book_borrowed(book).await? {
                return Ok(BorrowOutcome::BookUnavailable);
            }
            let open = self.open_loan_count(borrower).await?;
            if open >= meta.quota {
                return Ok(BorrowOutcome::QuotaExceeded {
                    open,
                    quota: meta.quota,
                });
            }
            // A blocking loan was returned between the insert and the
            // diagnosis. Report unavailable and let the caller retry.
            return Ok(BorrowOutcome::BookUnavailable);
        }

        tracing::info!(loan = %id, book = %book, borrower = %borrower, "loan opened");
        Ok(BorrowOutcome::Loaned(Loan {
            id,
            book: *book,
            borrower: *borrower,
            begin_date: begin,
            end_date: end,
            returned: false,
        }))
    }

    /// Close a loan. Fails with `NotFound` when the loan is absent and with
    /// `BusinessRule` when it was already returned.
    pub async fn return_loan(&self, id: &EntityId) -> AppResult<LoanReturn> {
        let sql = format!(
            r#"UPDATE "{loans}" SET returned = 1 WHERE id = ? AND returned = 0"#,
            loans = self.tables.loans
        );
        let result = sqlx::query(&sql)
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get(id).await? {
                Some(_) => Err(AppError::BusinessRule(format!(
                    "Loan {} was already returned",
                    id
                ))),
                None => Err(AppError::NotFound(format!("Loan with id {} not found", id))),
            };
        }

        let loan = self.get(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Loan with id {} not found", id))
        })?;
        let late = Utc::now() > loan.end_date;
        tracing::info!(loan = %id, late, "loan returned");
        Ok(LoanReturn { loan, late })
    }
}

pub(crate) fn loan_from_row(row: &SqliteRow) -> AppResult<Loan> {
    let id: String = row.try_get("id")?;
    let book: String = row.try_get("book_id")?;
    let borrower: String = row.try_get("borrower_id")?;
    Ok(Loan {
        id: id.parse()?,
        book: book.parse()?,
        borrower: borrower.parse()?,
        begin_date: row.try_get::<DateTime<Utc>, _>("begin_date")?,
        end_date: row.try_get::<DateTime<Utc>, _>("end_date")?,
        returned: row.try_get("returned")?,
    })
}
