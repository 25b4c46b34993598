// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only activity log.

use hemobank_core::{ActivityRecord, HemoError};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::parse_column;

pub async fn append(db: &Database, record: &ActivityRecord) -> Result<(), HemoError> {
    let record = record.clone();
    let details = serde_json::to_string(&record.details).map_err(HemoError::storage)?;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO activity_log
                 (id, user_name, action_type, entity_type, entity_id, description, details, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.user_name,
                    record.action_type.to_string(),
                    record.entity_type,
                    record.entity_id,
                    record.description,
                    details,
                    record.timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent records first.
pub async fn recent(db: &Database, limit: usize) -> Result<Vec<ActivityRecord>, HemoError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<ActivityRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, user_name, action_type, entity_type, entity_id, description, details, timestamp
                 FROM activity_log
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                let raw: String = row.get(6)?;
                let details = serde_json::from_str(&raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
                })?;
                Ok(ActivityRecord {
                    id: row.get(0)?,
                    user_name: row.get(1)?,
                    action_type: parse_column(row, 2)?,
                    entity_type: row.get(3)?,
                    entity_id: row.get(4)?,
                    description: row.get(5)?,
                    details,
                    timestamp: row.get(7)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
