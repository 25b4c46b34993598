// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hemobank backup` and `hemobank restore-db`.
//!
//! Copies go through SQLite's online backup API so a consistent snapshot is
//! taken even while another process holds the registry open in WAL mode.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;

use hemobank_core::HemoError;

/// Pages copied per backup step.
const PAGES_PER_STEP: std::os::raw::c_int = 100;
const STEP_PAUSE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupReport {
    pub source: String,
    pub destination: String,
    pub bytes: u64,
    /// Copy of the replaced registry, written before a restore.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_copy: Option<String>,
}

impl BackupReport {
    pub fn size_mb(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}

fn missing(what: &str, path: &str) -> HemoError {
    HemoError::storage(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{what} not found: {path}"),
    ))
}

/// Open `path` read-only and prove it is an SQLite database.
fn open_source(path: &str) -> Result<Connection, HemoError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(HemoError::storage)?;
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(HemoError::storage)?;
    Ok(conn)
}

fn copy_into(src: &Connection, dst_path: &str) -> Result<u64, HemoError> {
    let mut dst = Connection::open(dst_path).map_err(HemoError::storage)?;
    rusqlite::backup::Backup::new(src, &mut dst)
        .map_err(HemoError::storage)?
        .run_to_completion(PAGES_PER_STEP, STEP_PAUSE, None)
        .map_err(HemoError::storage)?;
    drop(dst);
    let bytes = std::fs::metadata(dst_path).map_err(HemoError::storage)?.len();
    Ok(bytes)
}

/// Snapshot the registry at `db_path` into `backup_path`.
pub fn run_backup(db_path: &str, backup_path: &str) -> Result<BackupReport, HemoError> {
    if !Path::new(db_path).exists() {
        return Err(missing("registry database", db_path));
    }
    let src = open_source(db_path)?;
    let bytes = copy_into(&src, backup_path)?;
    Ok(BackupReport {
        source: db_path.to_string(),
        destination: backup_path.to_string(),
        bytes,
        safety_copy: None,
    })
}

/// Replace the registry at `db_path` with the snapshot at `restore_from`.
///
/// The current registry, if any, is first copied to `<db_path>.pre-restore`.
pub fn run_restore(db_path: &str, restore_from: &str) -> Result<BackupReport, HemoError> {
    if !Path::new(restore_from).exists() {
        return Err(missing("backup file", restore_from));
    }
    let src = open_source(restore_from)?;

    let safety_copy = if Path::new(db_path).exists() {
        let pre_restore = format!("{db_path}.pre-restore");
        run_backup(db_path, &pre_restore)?;
        Some(pre_restore)
    } else {
        None
    };

    let bytes = copy_into(&src, db_path)?;
    Ok(BackupReport {
        source: restore_from.to_string(),
        destination: db_path.to_string(),
        bytes,
        safety_copy,
    })
}
