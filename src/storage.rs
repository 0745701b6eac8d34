// --- File: src/storage.rs ---

use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Account {0} already exists")]
    AlreadyExists(String),
    #[error("Account {0} not found")]
    NotFound(String),
}

/// A registered user together with the room created for them.
///
/// `created_at` is only a creation marker (Unix seconds) compared against the
/// retention cutoff; accounts have no other notion of expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub password: String,
    pub room: String,
    pub created_at: i64,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        password: impl Into<String>,
        room: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            room: room.into(),
            created_at,
        }
    }
}

// The trait defining account storage operations.
// Implementations are shared by every request and the sweeper, so they must
// handle their own synchronization.
pub trait AccountStore: Send + Sync {
    fn find_by_name<'a>(&'a self, name: &'a str)
        -> BoxFuture<'a, Result<Option<Account>, StorageError>>;

    fn insert<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<(), StorageError>>;

    fn update_secret<'a>(
        &'a self,
        name: &'a str,
        secret: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Returns whether a record was removed. Deleting an absent name is not an error.
    fn delete_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool, StorageError>>;

    /// Accounts with `created_at <= cutoff`.
    fn list_created_before<'a>(
        &'a self,
        cutoff: i64,
    ) -> BoxFuture<'a, Result<Vec<Account>, StorageError>>;

    /// Deletes every account with `created_at <= cutoff` and returns their names.
    fn delete_created_before<'a>(
        &'a self,
        cutoff: i64,
    ) -> BoxFuture<'a, Result<Vec<String>, StorageError>>;
}

#[derive(Clone, Debug)]
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

/// Connects to the database and makes sure the `accounts` table exists.
pub async fn create_sqlite_account_store(
    database_url: &str,
) -> Result<SqliteAccountStore, sqlx::Error> {
    let mut options = SqlitePoolOptions::new().max_connections(5);
    // Every in-memory connection is its own database, so pin a single one.
    if database_url.contains(":memory:") {
        options = options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = options.connect(database_url).await?;
    let store = SqliteAccountStore { pool };
    store.migrate().await?;
    Ok(store)
}

impl SqliteAccountStore {
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                name       TEXT PRIMARY KEY,
                password   TEXT NOT NULL,
                room       TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_created_at ON accounts (created_at)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn account_from_row(row: &SqliteRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        name: row.try_get("name")?,
        password: row.try_get("password")?,
        room: row.try_get("room")?,
        created_at: row.try_get("created_at")?,
    })
}

impl AccountStore for SqliteAccountStore {
    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Account>, StorageError>> {
        async move {
            let row = sqlx::query(
                "SELECT name, password, room, created_at FROM accounts WHERE name = ?",
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
            let account = row.as_ref().map(account_from_row).transpose()?;
            Ok(account)
        }
        .boxed()
    }

    fn insert<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let result = sqlx::query(
                "INSERT INTO accounts (name, password, room, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&account.name)
            .bind(&account.password)
            .bind(&account.room)
            .bind(account.created_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    Err(StorageError::AlreadyExists(account.name.clone()))
                }
                Err(e) => {
                    tracing::error!(name = %account.name, error = %e, "DB error inserting account");
                    Err(StorageError::Database(e))
                }
            }
        }
        .boxed()
    }

    fn update_secret<'a>(
        &'a self,
        name: &'a str,
        secret: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let done = sqlx::query("UPDATE accounts SET password = ? WHERE name = ?")
                .bind(secret)
                .bind(name)
                .execute(&self.pool)
                .await?;
            if done.rows_affected() == 0 {
                return Err(StorageError::NotFound(name.to_string()));
            }
            Ok(())
        }
        .boxed()
    }

    fn delete_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool, StorageError>> {
        async move {
            let done = sqlx::query("DELETE FROM accounts WHERE name = ?")
                .bind(name)
                .execute(&self.pool)
                .await?;
            Ok(done.rows_affected() > 0)
        }
        .boxed()
    }

    fn list_created_before<'a>(
        &'a self,
        cutoff: i64,
    ) -> BoxFuture<'a, Result<Vec<Account>, StorageError>> {
        async move {
            let rows = sqlx::query(
                "SELECT name, password, room, created_at FROM accounts WHERE created_at <= ? ORDER BY created_at",
            )
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;
            let accounts = rows
                .iter()
                .map(account_from_row)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(accounts)
        }
        .boxed()
    }

    fn delete_created_before<'a>(
        &'a self,
        cutoff: i64,
    ) -> BoxFuture<'a, Result<Vec<String>, StorageError>> {
        async move {
            let names: Vec<String> =
                sqlx::query_scalar("DELETE FROM accounts WHERE created_at <= ? RETURNING name")
                    .bind(cutoff)
                    .fetch_all(&self.pool)
                    .await?;
            Ok(names)
        }
        .boxed()
    }
}
