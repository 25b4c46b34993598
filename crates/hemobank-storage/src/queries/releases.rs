// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Release invoices.

use hemobank_core::{ComponentType, HemoError, ReleaseDetails, ReleaseReceipt, ReleaseRecord, Transition};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::database::{map_tr_err, Database};
use crate::models::{format_date, optional_date_column, parse_column};
use crate::queries::normalize_serials;
use crate::queries::units::apply_transition;

const RELEASE_COLUMNS: &str = "invoice_id, component, receiving_facility, address, contact_number, \
     classification, authorized_recipient, recipient_designation, date_of_release, \
     condition_upon_release, request_reference, released_by, created_at";

fn release_from_row(row: &Row<'_>) -> rusqlite::Result<ReleaseRecord> {
    Ok(ReleaseRecord {
        invoice_id: row.get(0)?,
        component: parse_column(row, 1)?,
        serial_ids: Vec::new(),
        details: ReleaseDetails {
            receiving_facility: row.get(2)?,
            address: row.get(3)?,
            contact_number: row.get(4)?,
            classification: row.get(5)?,
            authorized_recipient: row.get(6)?,
            recipient_designation: row.get(7)?,
            date_of_release: optional_date_column(row, 8)?,
            condition_upon_release: row.get(9)?,
            request_reference: row.get(10)?,
            released_by: row.get(11)?,
        },
        created_at: row.get(12)?,
    })
}

fn release_items(conn: &Connection, invoice_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT serial_id FROM release_items WHERE invoice_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![invoice_id], |row| row.get(0))?;
    rows.collect()
}

/// Release stored units and write one invoice covering all of them.
pub async fn release_units(
    db: &Database,
    component: ComponentType,
    serial_ids: &[String],
    details: &ReleaseDetails,
) -> Result<ReleaseReceipt, HemoError> {
    let serials = normalize_serials(serial_ids)?;
    let details = details.clone();
    let invoice_id = uuid::Uuid::new_v4().to_string();

    let receipt = db
        .connection()
        .call(move |conn| -> Result<Result<ReleaseReceipt, HemoError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            if let Err(e) = apply_transition(&tx, component, &serials, Transition::Release, None)? {
                return Ok(Err(e));
            }
            tx.execute(
                "INSERT INTO releases
                 (invoice_id, component, receiving_facility, address, contact_number,
                  classification, authorized_recipient, recipient_designation, date_of_release,
                  condition_upon_release, request_reference, released_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    invoice_id,
                    component.slug(),
                    details.receiving_facility,
                    details.address,
                    details.contact_number,
                    details.classification,
                    details.authorized_recipient,
                    details.recipient_designation,
                    details.date_of_release.map(format_date),
                    details.condition_upon_release,
                    details.request_reference,
                    details.released_by,
                ],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO release_items (invoice_id, position, serial_id) VALUES (?1, ?2, ?3)",
                )?;
                for (position, serial) in serials.iter().enumerate() {
                    stmt.execute(params![invoice_id, position as i64, serial])?;
                }
            }
            tx.commit()?;
            Ok(Ok(ReleaseReceipt {
                invoice_id,
                released: serials,
            }))
        })
        .await
        .map_err(map_tr_err)??;

    debug!(invoice_id = %receipt.invoice_id, count = receipt.released.len(), "release invoice written");
    Ok(receipt)
}

pub async fn get_release(db: &Database, invoice_id: &str) -> Result<Option<ReleaseRecord>, HemoError> {
    let invoice_id = invoice_id.trim().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ReleaseRecord>, rusqlite::Error> {
            let record = conn
                .query_row(
                    &format!("SELECT {RELEASE_COLUMNS} FROM releases WHERE invoice_id = ?1"),
                    params![invoice_id],
                    release_from_row,
                )
                .optional()?;
            match record {
                Some(mut record) => {
                    record.serial_ids = release_items(conn, &record.invoice_id)?;
                    Ok(Some(record))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Invoices for one component, newest first.
pub async fn list_releases(db: &Database, component: ComponentType) -> Result<Vec<ReleaseRecord>, HemoError> {
    db.connection()
        .call(move |conn| -> Result<Vec<ReleaseRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RELEASE_COLUMNS} FROM releases WHERE component = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let mut records = stmt
                .query_map(params![component.slug()], release_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            for record in &mut records {
                record.serial_ids = release_items(conn, &record.invoice_id)?;
            }
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use hemobank_core::UnitStatus;

    use super::*;
    use crate::queries::test_support::{new_unit, serials, temp_db};
    use crate::queries::units::{insert_units, lookup_by_serial};

    fn details() -> ReleaseDetails {
        ReleaseDetails {
            receiving_facility: "St. Luke's".into(),
            address: "1 Main St".into(),
            contact_number: "555-0100".into(),
            classification: "Hospital".into(),
            authorized_recipient: "Dr. Cruz".into(),
            recipient_designation: "Pathologist".into(),
            date_of_release: NaiveDate::from_ymd_opt(2025, 2, 1),
            condition_upon_release: "Good".into(),
            request_reference: None,
            released_by: "operator".into(),
        }
    }

    #[tokio::test]
    async fn release_writes_invoice_and_moves_units() {
        let (_dir, db) = temp_db().await;
        insert_units(
            &db,
            ComponentType::Rbc,
            &[new_unit(ComponentType::Rbc, "RBC001"), new_unit(ComponentType::Rbc, "RBC002")],
        )
        .await
        .unwrap();

        let receipt = release_units(&db, ComponentType::Rbc, &serials(&["RBC002", "RBC001"]), &details())
            .await
            .unwrap();
        assert_eq!(receipt.released, vec!["RBC002", "RBC001"]);

        let record = get_release(&db, &receipt.invoice_id).await.unwrap().unwrap();
        assert_eq!(record.serial_ids, vec!["RBC002", "RBC001"]);
        assert_eq!(record.component, ComponentType::Rbc);
        assert_eq!(record.details, details());

        for serial in ["RBC001", "RBC002"] {
            let unit = lookup_by_serial(&db, serial).await.unwrap().unwrap();
            assert_eq!(unit.status, UnitStatus::Released);
        }
    }

    #[tokio::test]
    async fn release_with_one_unavailable_unit_changes_nothing() {
        let (_dir, db) = temp_db().await;
        insert_units(
            &db,
            ComponentType::Rbc,
            &[new_unit(ComponentType::Rbc, "A"), new_unit(ComponentType::Rbc, "B")],
        )
        .await
        .unwrap();
        release_units(&db, ComponentType::Rbc, &serials(&["B"]), &details())
            .await
            .unwrap();

        let err = release_units(&db, ComponentType::Rbc, &serials(&["A", "B"]), &details())
            .await
            .unwrap_err();
        assert!(matches!(err, HemoError::Precondition { ref serial_id, .. } if serial_id == "B"));

        let a = lookup_by_serial(&db, "A").await.unwrap().unwrap();
        assert_eq!(a.status, UnitStatus::Stored);
        assert_eq!(list_releases(&db, ComponentType::Rbc).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_releases_is_scoped_and_newest_first() {
        let (_dir, db) = temp_db().await;
        insert_units(
            &db,
            ComponentType::Plasma,
            &[new_unit(ComponentType::Plasma, "P1"), new_unit(ComponentType::Plasma, "P2")],
        )
        .await
        .unwrap();
        let first = release_units(&db, ComponentType::Plasma, &serials(&["P1"]), &details())
            .await
            .unwrap();
        let second = release_units(&db, ComponentType::Plasma, &serials(&["P2"]), &details())
            .await
            .unwrap();

        let listed = list_releases(&db, ComponentType::Plasma).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.invoice_id.clone()).collect();
        assert_eq!(ids, vec![second.invoice_id, first.invoice_id]);
        assert!(list_releases(&db, ComponentType::Rbc).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_invoice_is_none() {
        let (_dir, db) = temp_db().await;
        assert!(get_release(&db, "missing").await.unwrap().is_none());
    }
}
