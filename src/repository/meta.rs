//! Library metadata repository: the lending-policy singleton.

use sqlx::{Row, SqlitePool};

use super::Tables;
use crate::{
    error::{AppError, AppResult},
    models::LibraryMeta,
};

#[derive(Clone)]
pub struct MetaRepository {
    pool: SqlitePool,
    tables: Tables,
}

impl MetaRepository {
    pub fn new(pool: SqlitePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    /// Read the lending policy. A library without its metadata record is
    /// misconfigured, so absence is an error here.
    pub async fn get(&self) -> AppResult<LibraryMeta> {
        let sql = format!(
            r#"SELECT quota, period FROM "{library}" WHERE id = 1"#,
            library = self.tables.library
        );
        let row = sqlx::query(&sql)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Library metadata not found".to_string()))?;
        Ok(LibraryMeta {
            quota: row.try_get::<i64, _>("quota")? as u32,
            period: row.try_get::<i64, _>("period")? as u32,
        })
    }

    /// Update the lending policy; omitted fields keep their value. Affects
    /// future borrows only, open loans keep their dates.
    pub async fn update(&self, quota: Option<u32>, period: Option<u32>) -> AppResult<LibraryMeta> {
        let sql = format!(
            r#"
            UPDATE "{library}" SET
                quota = COALESCE(?, quota),
                period = COALESCE(?, period)
            WHERE id = 1
            "#,
            library = self.tables.library
        );
        let result = sqlx::query(&sql)
            .bind(quota.map(i64::from))
            .bind(period.map(i64::from))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Library metadata not found".to_string()));
        }

        let meta = self.get().await?;
        tracing::info!(quota = meta.quota, period = meta.period, "lending policy updated");
        Ok(meta)
    }
}
