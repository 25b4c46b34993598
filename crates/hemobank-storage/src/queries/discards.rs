// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Disposal records for non-conforming units.

use hemobank_core::{
    ComponentType, DiscardDetails, DiscardReceipt, DiscardRecord, HemoError, Transition, UnitStatus,
};
use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::database::{map_tr_err, Database};
use crate::models::{format_date, optional_date_column, optional_time_column, parse_column, TIME_FORMAT};
use crate::queries::normalize_serials;
use crate::queries::units::apply_transition;

fn discard_from_row(row: &Row<'_>) -> rusqlite::Result<DiscardRecord> {
    Ok(DiscardRecord {
        discard_id: row.get(0)?,
        component: parse_column(row, 1)?,
        serial_ids: Vec::new(),
        details: DiscardDetails {
            responsible_personnel: row.get(2)?,
            reason_for_discarding: row.get(3)?,
            authorized_by: row.get(4)?,
            date_of_discard: optional_date_column(row, 5)?,
            time_of_discard: optional_time_column(row, 6)?,
            method_of_disposal: row.get(7)?,
            remarks: row.get(8)?,
        },
        created_at: row.get(9)?,
    })
}

fn discard_items(conn: &Connection, discard_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT serial_id FROM discard_items WHERE discard_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![discard_id], |row| row.get(0))?;
    rows.collect()
}

/// Discard non-conforming units and write one disposal record.
///
/// A unit still in storage fails with `Precondition`: it has to be
/// transferred first.
pub async fn discard_non_conforming(
    db: &Database,
    component: ComponentType,
    serial_ids: &[String],
    details: &DiscardDetails,
) -> Result<DiscardReceipt, HemoError> {
    let serials = normalize_serials(serial_ids)?;
    let details = details.clone();
    let discard_id = uuid::Uuid::new_v4().to_string();

    let receipt = db
        .connection()
        .call(move |conn| -> Result<Result<DiscardReceipt, HemoError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let discarded = match apply_transition(
                &tx,
                component,
                &serials,
                Transition::Discard,
                Some(UnitStatus::NonConforming),
            )? {
                Ok(n) => n,
                Err(e) => return Ok(Err(e)),
            };
            tx.execute(
                "INSERT INTO discards
                 (discard_id, component, responsible_personnel, reason_for_discarding,
                  authorized_by, date_of_discard, time_of_discard, method_of_disposal, remarks)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    discard_id,
                    component.slug(),
                    details.responsible_personnel,
                    details.reason_for_discarding,
                    details.authorized_by,
                    details.date_of_discard.map(format_date),
                    details.time_of_discard.map(|t| t.format(TIME_FORMAT).to_string()),
                    details.method_of_disposal,
                    details.remarks,
                ],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO discard_items (discard_id, position, serial_id) VALUES (?1, ?2, ?3)",
                )?;
                for (position, serial) in serials.iter().enumerate() {
                    stmt.execute(params![discard_id, position as i64, serial])?;
                }
            }
            tx.commit()?;
            Ok(Ok(DiscardReceipt {
                discard_id,
                discarded,
            }))
        })
        .await
        .map_err(map_tr_err)??;

    debug!(discard_id = %receipt.discard_id, count = receipt.discarded, "disposal record written");
    Ok(receipt)
}

/// Disposal records for one component, newest first.
pub async fn list_discards(db: &Database, component: ComponentType) -> Result<Vec<DiscardRecord>, HemoError> {
    db.connection()
        .call(move |conn| -> Result<Vec<DiscardRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT discard_id, component, responsible_personnel, reason_for_discarding,
                        authorized_by, date_of_discard, time_of_discard, method_of_disposal,
                        remarks, created_at
                 FROM discards WHERE component = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let mut records = stmt
                .query_map(params![component.slug()], discard_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            for record in &mut records {
                record.serial_ids = discard_items(conn, &record.discard_id)?;
            }
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}
