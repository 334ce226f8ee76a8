//! SQL per backend

use crate::error::{StoreError, StoreResult};
use std::fmt;

/// Database family behind a connection URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    MySql,
    Postgres,
}

impl Backend {
    pub fn from_url(url: &str) -> StoreResult<Self> {
        if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else if url.starts_with("mysql:") || url.starts_with("mariadb:") {
            Ok(Backend::MySql)
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Ok(Backend::Postgres)
        } else {
            Err(StoreError::UnsupportedBackend(url.to_string()))
        }
    }

    pub fn schema(&self) -> &'static [&'static str] {
        match self {
            Backend::Sqlite => &[
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY,
                    username TEXT,
                    balance REAL,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                "CREATE TABLE IF NOT EXISTS transactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    amount REAL,
                    description TEXT,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
            ],
            Backend::MySql => &[
                "CREATE TABLE IF NOT EXISTS users (
                    id BIGINT PRIMARY KEY,
                    username VARCHAR(255),
                    balance DECIMAL(10, 2),
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
                )",
                "CREATE TABLE IF NOT EXISTS transactions (
                    id BIGINT AUTO_INCREMENT PRIMARY KEY,
                    user_id BIGINT NOT NULL,
                    amount DECIMAL(10, 2),
                    description TEXT,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
            ],
            Backend::Postgres => &[
                "CREATE TABLE IF NOT EXISTS users (
                    id BIGINT PRIMARY KEY,
                    username VARCHAR(255),
                    balance NUMERIC(10, 2),
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                "CREATE TABLE IF NOT EXISTS transactions (
                    id BIGSERIAL PRIMARY KEY,
                    user_id BIGINT NOT NULL,
                    amount NUMERIC(10, 2),
                    description TEXT,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
            ],
        }
    }

    pub fn insert_transaction(&self) -> &'static str {
        match self {
            Backend::Postgres => {
                "INSERT INTO transactions (user_id, amount, description) VALUES ($1, $2, $3)"
            }
            _ => "INSERT INTO transactions (user_id, amount, description) VALUES (?, ?, ?)",
        }
    }

    /// Insert a user or bump the balance of an existing one
    pub fn upsert_user(&self) -> &'static str {
        match self {
            Backend::Sqlite => {
                "INSERT INTO users (id, username, balance) VALUES (?, ?, ?)
                 ON CONFLICT (id) DO UPDATE
                 SET balance = users.balance + 1, updated_at = CURRENT_TIMESTAMP"
            }
            Backend::MySql => {
                "INSERT INTO users (id, username, balance) VALUES (?, ?, ?)
                 ON DUPLICATE KEY UPDATE
                 balance = balance + 1, updated_at = CURRENT_TIMESTAMP"
            }
            Backend::Postgres => {
                "INSERT INTO users (id, username, balance) VALUES ($1, $2, $3)
                 ON CONFLICT (id) DO UPDATE
                 SET balance = users.balance + 1, updated_at = CURRENT_TIMESTAMP"
            }
        }
    }

    // DECIMAL and NUMERIC columns do not decode through the Any driver,
    // so only integer and text columns are read back.
    pub fn lookup_user(&self) -> &'static str {
        match self {
            Backend::Postgres => "SELECT id, username FROM users WHERE id = $1",
            _ => "SELECT id, username FROM users WHERE id = ?",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sqlite => f.write_str("sqlite"),
            Backend::MySql => f.write_str("mysql"),
            Backend::Postgres => f.write_str("postgres"),
        }
    }
}
