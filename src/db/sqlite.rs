// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and OAuth token state)
//! - Google Ads accounts (customer IDs linked to a user)
//!
//! All statements run on the blocking pool behind a single connection.

use crate::db::tables;
use crate::error::AppError;
use crate::models::{GoogleAdsAccount, User};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const USER_COLUMNS: &str =
    "id, name, email, profile_pic, access_token, refresh_token, token_expiry";

/// SQLite database client.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open the database named by a connection string and create the schema.
    pub fn open(database_url: &str) -> Result<Self, AppError> {
        let path = sqlite_path(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
                    })?;
                }
            }
            Connection::open(path)?
        };

        let db = Self::from_connection(conn)?;
        tracing::info!(path, "Connected to SQLite");
        Ok(db)
    }

    /// Create a private in-memory database (tests and local experiments).
    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a statement on the blocking pool.
    async fn call<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| AppError::Database(format!("Connection lock poisoned: {}", e)))?;
            f(&guard).map_err(AppError::from)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Database task failed: {}", e)))?
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their Google subject identifier.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM {} WHERE id = ?1", tables::USERS),
                params![user_id],
                user_from_row,
            )
            .optional()
        })
        .await
    }

    /// All users that have a stored access token.
    pub async fn list_users_with_access_token(&self) -> Result<Vec<User>, AppError> {
        self.call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM {} WHERE access_token IS NOT NULL ORDER BY id",
                tables::USERS
            ))?;
            let users = stmt.query_map([], user_from_row)?;
            users.collect()
        })
        .await
    }

    /// Create a user or refresh its profile and tokens after a login.
    ///
    /// A missing refresh token keeps the one already stored.
    pub async fn upsert_user_login(&self, user: &User) -> Result<(), AppError> {
        let user = user.clone();
        self.call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET
                         name = excluded.name,
                         email = excluded.email,
                         profile_pic = excluded.profile_pic,
                         access_token = excluded.access_token,
                         refresh_token = COALESCE(excluded.refresh_token, {table}.refresh_token),
                         token_expiry = excluded.token_expiry",
                    table = tables::USERS
                ),
                params![
                    user.id,
                    user.name,
                    user.email,
                    user.profile_pic,
                    user.access_token,
                    user.refresh_token,
                    user.token_expiry,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Store a refreshed token triple.
    ///
    /// `refresh_token = None` keeps the stored refresh token.
    /// Returns `false` if the user does not exist.
    pub async fn save_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let user_id = user_id.to_string();
        let access_token = access_token.to_string();
        let refresh_token = refresh_token.map(str::to_string);
        self.call(move |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE {} SET access_token = ?2,
                         refresh_token = COALESCE(?3, refresh_token),
                         token_expiry = ?4
                     WHERE id = ?1",
                    tables::USERS
                ),
                params![user_id, access_token, refresh_token, token_expiry],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    // ─── Google Ads Account Operations ───────────────────────────

    /// Accounts linked to a user, in insertion order.
    pub async fn list_accounts(&self, user_id: &str) -> Result<Vec<GoogleAdsAccount>, AppError> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, user_id, customer_id FROM {} WHERE user_id = ?1 ORDER BY id",
                tables::GOOGLE_ADS_ACCOUNTS
            ))?;
            let accounts = stmt.query_map(params![user_id], |row| {
                Ok(GoogleAdsAccount {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    customer_id: row.get(2)?,
                })
            })?;
            accounts.collect()
        })
        .await
    }

    /// Link a customer ID to a user unless the pair already exists.
    ///
    /// Returns `true` if a new row was inserted.
    pub async fn add_account_if_absent(
        &self,
        user_id: &str,
        customer_id: &str,
    ) -> Result<bool, AppError> {
        let user_id = user_id.to_string();
        let customer_id = customer_id.to_string();
        self.call(move |conn| {
            let inserted = conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (user_id, customer_id) VALUES (?1, ?2)",
                    tables::GOOGLE_ADS_ACCOUNTS
                ),
                params![user_id, customer_id],
            )?;
            Ok(inserted > 0)
        })
        .await
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS {users} (
             id TEXT PRIMARY KEY,
             name TEXT NOT NULL,
             email TEXT NOT NULL,
             profile_pic TEXT,
             access_token TEXT,
             refresh_token TEXT,
             token_expiry TEXT,
             CHECK (access_token IS NULL OR token_expiry IS NOT NULL)
         );
         CREATE TABLE IF NOT EXISTS {accounts} (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             user_id TEXT NOT NULL REFERENCES {users}(id) ON DELETE CASCADE,
             customer_id TEXT NOT NULL,
             UNIQUE (user_id, customer_id)
         );
         CREATE INDEX IF NOT EXISTS idx_accounts_user_id ON {accounts}(user_id);",
        users = tables::USERS,
        accounts = tables::GOOGLE_ADS_ACCOUNTS,
    ))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        profile_pic: row.get(3)?,
        access_token: row.get(4)?,
        refresh_token: row.get(5)?,
        token_expiry: row.get(6)?,
    })
}

/// Extract the file path from a SQLite connection string.
///
/// Accepts `sqlite:///relative.db`, `sqlite:////abs.db`, `sqlite:path.db`
/// and bare paths.
fn sqlite_path(database_url: &str) -> &str {
    if let Some(rest) = database_url.strip_prefix("sqlite:///") {
        rest
    } else if let Some(rest) = database_url.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = database_url.strip_prefix("sqlite:") {
        rest
    } else {
        database_url
    }
}
