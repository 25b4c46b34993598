// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! `Database` is the single writer; do not open additional connections for writes.

use std::path::Path;
use std::time::Duration;

use hemobank_core::HemoError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the registry's SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, HemoError> {
        Self::open_with(path, true).await
    }

    /// Open with an explicit journal mode choice.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, HemoError> {
        match Path::new(path).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent).map_err(HemoError::storage)?;
            }
            _ => {}
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| HemoError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<Result<(), HemoError>, rusqlite::Error> {
            if wal_mode {
                let mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            Ok(run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), HemoError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Close the connection, consuming the handle.
    pub async fn close(self) -> Result<(), HemoError> {
        self.conn.close().await.map_err(|e| HemoError::Storage {
            source: Box::new(e),
        })
    }
}

/// Convert a tokio-rusqlite error into `HemoError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> HemoError {
    HemoError::Storage {
        source: Box::new(e),
    }
}
