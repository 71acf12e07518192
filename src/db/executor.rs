//! Statement execution.
//!
//! Statements run without bind parameters. Each call accepts exactly one
//! statement: MySQL prepares the text, which the server refuses for more
//! than one statement, and SQLite runs it in a transaction that is rolled
//! back if a second statement follows. Results are fully materialized
//! before they are returned.
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `mysql`: MySQL-specific fetch and execute
//! - `sqlite`: SQLite-specific fetch and execute
//!
//! Each submodule provides identical functionality adapted to the database's type system.

use crate::db::pool::DbPool;
use crate::db::types::RowToCells;
use crate::error::{DbError, DbResult};
use crate::models::{EffectSummary, RowSet};
use std::time::Instant;
use tracing::debug;

/// Runs statements against a pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run a row-returning statement and collect every row.
    pub async fn fetch_all(&self, pool: &DbPool, sql: &str) -> DbResult<RowSet> {
        let start = Instant::now();
        let result = match pool {
            DbPool::MySql(p) => mysql::fetch_all(p, sql).await?,
            DbPool::SQLite(p) => sqlite::fetch_all(p, sql).await?,
        };

        debug!(
            rows = result.row_count(),
            columns = result.columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(result)
    }

    /// Run a statement for its effect.
    pub async fn execute(&self, pool: &DbPool, sql: &str) -> DbResult<EffectSummary> {
        let start = Instant::now();
        let summary = match pool {
            DbPool::MySql(p) => mysql::execute(p, sql).await?,
            DbPool::SQLite(p) => sqlite::execute(p, sql).await?,
        };

        debug!(
            rows_affected = summary.rows_affected,
            last_insert_id = summary.last_insert_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statement completed"
        );
        Ok(summary)
    }
}

// =============================================================================
// Common Helper Functions
// =============================================================================

/// Decode rows into a row set, enforcing one cell per column.
fn build_row_set<R: RowToCells>(columns: Vec<String>, rows: &[R]) -> DbResult<RowSet> {
    let mut set = RowSet::new(columns);
    set.rows.reserve(rows.len());
    for row in rows {
        let cells = row.to_cells()?;
        if cells.len() != set.columns.len() {
            return Err(DbError::backend(
                format!(
                    "column count mismatch: expected {}, got {}",
                    set.columns.len(),
                    cells.len()
                ),
                None,
            ));
        }
        set.rows.push(cells);
    }
    Ok(set)
}

const MULTIPLE_STATEMENTS: &str = "multiple statements are not allowed";

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use sqlx::{Column, Executor, MySqlPool};

    pub async fn fetch_all(pool: &MySqlPool, sql: &str) -> DbResult<RowSet> {
        let rows = sqlx::query(sql).fetch_all(pool).await?;
        let columns = match rows.first() {
            Some(row) => row.column_names(),
            None => describe_columns(pool, sql).await,
        };
        build_row_set(columns, &rows)
    }

    /// Column names for a statement that returned no rows.
    async fn describe_columns(pool: &MySqlPool, sql: &str) -> Vec<String> {
        match pool.describe(sql).await {
            Ok(describe) => describe
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            Err(e) => {
                debug!(error = %e, "Could not describe empty result");
                Vec::new()
            }
        }
    }

    pub async fn execute(pool: &MySqlPool, sql: &str) -> DbResult<EffectSummary> {
        let result = sqlx::query(sql).execute(pool).await?;
        Ok(EffectSummary {
            rows_affected: saturating_i64(result.rows_affected()),
            last_insert_id: saturating_i64(result.last_insert_id()),
        })
    }
}

mod sqlite {
    use super::*;
    use futures_util::TryStreamExt;
    use sqlx::sqlite::{SqliteConnection, SqliteQueryResult, SqliteRow};
    use sqlx::{Column, Either, Executor, SqlitePool};

    pub async fn fetch_all(pool: &SqlitePool, sql: &str) -> DbResult<RowSet> {
        let (rows, _) = run_single(pool, sql).await?;
        let columns = match rows.first() {
            Some(row) => row.column_names(),
            None => describe_columns(pool, sql).await,
        };
        build_row_set(columns, &rows)
    }

    async fn describe_columns(pool: &SqlitePool, sql: &str) -> Vec<String> {
        match pool.describe(sql).await {
            Ok(describe) => describe
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            Err(e) => {
                debug!(error = %e, "Could not describe empty result");
                Vec::new()
            }
        }
    }

    pub async fn execute(pool: &SqlitePool, sql: &str) -> DbResult<EffectSummary> {
        let (_, result) = run_single(pool, sql).await?;
        Ok(EffectSummary {
            rows_affected: saturating_i64(result.rows_affected()),
            last_insert_id: result.last_insert_rowid(),
        })
    }

    /// Run `sql` inside a transaction that is rolled back unless the text
    /// held exactly one statement.
    async fn run_single(
        pool: &SqlitePool,
        sql: &str,
    ) -> DbResult<(Vec<SqliteRow>, SqliteQueryResult)> {
        let mut tx = pool.begin().await?;
        match collect_single(&mut tx, sql).await {
            Ok(output) => {
                tx.commit().await?;
                Ok(output)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    debug!(error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    /// SQLite reports one result per statement, after that statement's rows.
    async fn collect_single(
        conn: &mut SqliteConnection,
        sql: &str,
    ) -> DbResult<(Vec<SqliteRow>, SqliteQueryResult)> {
        let mut rows = Vec::new();
        let mut done = None;
        let mut stream = conn.fetch_many(sql);

        while let Some(item) = stream.try_next().await? {
            if done.is_some() {
                return Err(DbError::backend(MULTIPLE_STATEMENTS, None));
            }
            match item {
                Either::Left(result) => done = Some(result),
                Either::Right(row) => rows.push(row),
            }
        }
        Ok((rows, done.unwrap_or_default()))
    }
}
