use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{DatabaseConnection, SqlxSqliteConnector, sea_query::LikeExpr};
use sqlx::{
    FromRow, Sqlite,
    query::{Query, QueryAs},
    sqlite::{
        SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
        SqliteRow,
    },
};

pub type DbPool = SqlitePool;
pub type OrmConn = DatabaseConnection;

/// Open the SQLite file named by `database_url`, creating it when missing.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Private in-memory database. A single long-lived connection keeps the data alive.
pub async fn create_memory_pool() -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Wrap the sqlx pool in a SeaORM connection so both share the same connections.
pub fn create_orm_conn(pool: &DbPool) -> OrmConn {
    SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone())
}

pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Execute a statement and return the number of affected rows.
pub async fn run<'q>(
    pool: &DbPool,
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
) -> Result<u64, sqlx::Error> {
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Fetch at most one row.
pub async fn get<'q, T>(
    pool: &DbPool,
    query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
) -> Result<Option<T>, sqlx::Error>
where
    T: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
{
    query.fetch_optional(pool).await
}

/// Fetch every matching row.
pub async fn all<'q, T>(
    pool: &DbPool,
    query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
) -> Result<Vec<T>, sqlx::Error>
where
    T: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
{
    query.fetch_all(pool).await
}

/// `%term%` pattern that matches `term` literally, `%` and `_` included.
pub fn like_contains(term: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}
