// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every open. Refinery records applied versions in `refinery_schema_history`.

use hemobank_core::HemoError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), HemoError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(HemoError::storage)?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}
