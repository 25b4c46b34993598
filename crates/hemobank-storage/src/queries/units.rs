// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blood unit reads, writes, and status transitions.

use hemobank_core::lifecycle::ensure_in_storage;
use hemobank_core::{
    BloodUnit, ComponentType, HemoError, NewUnit, SortKey, Transition, UnitEdit, UnitPage,
    UnitQuery, UnitStatus,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::database::{map_tr_err, Database};
use crate::models::{format_date, unit_from_row, UNIT_COLUMNS};
use crate::queries::normalize_serials;

pub(crate) fn fetch_unit(conn: &Connection, serial_id: &str) -> rusqlite::Result<Option<BloodUnit>> {
    conn.query_row(
        &format!("SELECT {UNIT_COLUMNS} FROM blood_units WHERE serial_id = ?1"),
        params![serial_id],
        unit_from_row,
    )
    .optional()
}

/// Load every serial of a batch, rejecting the first one that is missing,
/// filed under another component, or refused by `check`.
pub(crate) fn load_batch<F>(
    conn: &Connection,
    component: ComponentType,
    serial_ids: &[String],
    check: F,
) -> rusqlite::Result<Result<Vec<BloodUnit>, HemoError>>
where
    F: Fn(&BloodUnit) -> Result<(), HemoError>,
{
    let mut units = Vec::with_capacity(serial_ids.len());
    for serial_id in serial_ids {
        let Some(unit) = fetch_unit(conn, serial_id)? else {
            return Ok(Err(HemoError::NotFound {
                serial_id: serial_id.clone(),
            }));
        };
        if unit.component != component {
            return Ok(Err(HemoError::CategoryMismatch {
                serial_id: serial_id.clone(),
                expected: component,
                actual: unit.component,
            }));
        }
        if let Err(e) = check(&unit) {
            return Ok(Err(e));
        }
        units.push(unit);
    }
    Ok(Ok(units))
}

/// Move every serial through `transition` inside `tx`.
///
/// When `required` is set, units must currently be in that status. Nothing
/// is written unless every unit passes.
pub(crate) fn apply_transition(
    tx: &Transaction<'_>,
    component: ComponentType,
    serial_ids: &[String],
    transition: Transition,
    required: Option<UnitStatus>,
) -> rusqlite::Result<Result<usize, HemoError>> {
    let checked = load_batch(tx, component, serial_ids, |unit| {
        match required {
            Some(from) if unit.status != from => Err(HemoError::Precondition {
                serial_id: unit.serial_id.clone(),
                status: unit.status,
                action: transition.to_string(),
            }),
            _ => transition.check(&unit.serial_id, unit.status).map(|_| ()),
        }
    })?;
    let units = match checked {
        Ok(units) => units,
        Err(e) => return Ok(Err(e)),
    };

    let mut stmt = tx.prepare(
        "UPDATE blood_units
         SET status = ?2, modified_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE serial_id = ?1",
    )?;
    let mut changed = 0;
    for unit in &units {
        let target = match transition.check(&unit.serial_id, unit.status) {
            Ok(target) => target,
            Err(e) => return Ok(Err(e)),
        };
        changed += stmt.execute(params![unit.serial_id, target.to_string()])?;
    }
    Ok(Ok(changed))
}

/// Find a unit by serial in any component or status.
pub async fn lookup_by_serial(db: &Database, serial_id: &str) -> Result<Option<BloodUnit>, HemoError> {
    let serial_id = serial_id.trim().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<BloodUnit>, rusqlite::Error> { fetch_unit(conn, &serial_id) })
        .await
        .map_err(map_tr_err)
}

/// Insert a batch of new units as `stored`.
///
/// Fails with `DuplicateSerial` if any serial already exists, including one
/// earlier in the same batch.
pub async fn insert_units(
    db: &Database,
    component: ComponentType,
    units: &[NewUnit],
) -> Result<Vec<String>, HemoError> {
    if units.is_empty() {
        return Err(HemoError::Validation("no valid items".into()));
    }
    let units = units.to_vec();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<Result<Vec<String>, HemoError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut inserted = Vec::with_capacity(units.len());
            for unit in &units {
                if fetch_unit(&tx, unit.serial_id())?.is_some() {
                    return Ok(Err(HemoError::DuplicateSerial {
                        serial_id: unit.serial_id().to_string(),
                    }));
                }
                tx.execute(
                    "INSERT INTO blood_units
                     (serial_id, component, blood_type, rh_factor, volume_ml,
                      collection_date, expiration_date)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        unit.serial_id(),
                        component.slug(),
                        unit.blood_type().to_string(),
                        unit.rh_factor().to_string(),
                        unit.volume_ml(),
                        format_date(unit.collection_date()),
                        format_date(unit.expiration_date()),
                    ],
                )?;
                inserted.push(unit.serial_id().to_string());
            }
            tx.commit()?;
            Ok(Ok(inserted))
        })
        .await
        .map_err(map_tr_err)??;
    debug!(component = %component, count = inserted.len(), "units inserted");
    Ok(inserted)
}

/// Apply `edit` to a stored unit and return the updated row.
pub async fn update_unit(
    db: &Database,
    component: ComponentType,
    serial_id: &str,
    edit: &UnitEdit,
) -> Result<BloodUnit, HemoError> {
    if edit.is_empty() {
        return Err(HemoError::Validation("no changes supplied".into()));
    }
    let serials = normalize_serials(&[serial_id.to_string()])?;
    let edit = edit.clone();
    db.connection()
        .call(move |conn| -> Result<Result<BloodUnit, HemoError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let checked = load_batch(&tx, component, &serials, |unit| {
                ensure_in_storage(&unit.serial_id, unit.status, "edit")
            })?;
            if let Err(e) = checked {
                return Ok(Err(e));
            }
            let serial = &serials[0];
            let (collection, expiration) = match edit.new_dates() {
                Some((c, e)) => (Some(format_date(c)), Some(format_date(e))),
                None => (None, None),
            };
            tx.execute(
                "UPDATE blood_units SET
                     blood_type = COALESCE(?2, blood_type),
                     rh_factor = COALESCE(?3, rh_factor),
                     volume_ml = COALESCE(?4, volume_ml),
                     collection_date = COALESCE(?5, collection_date),
                     expiration_date = COALESCE(?6, expiration_date),
                     modified_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE serial_id = ?1",
                params![
                    serial,
                    edit.new_blood_type().map(|b| b.to_string()),
                    edit.new_rh_factor().map(|r| r.to_string()),
                    edit.new_volume_ml(),
                    collection,
                    expiration,
                ],
            )?;
            let updated = fetch_unit(&tx, serial)?;
            tx.commit()?;
            Ok(updated.ok_or_else(|| HemoError::Internal(format!("unit {serial} vanished during edit"))))
        })
        .await
        .map_err(map_tr_err)?
}

/// Remove stored units. Any unit outside storage rejects the batch.
pub async fn delete_units(
    db: &Database,
    component: ComponentType,
    serial_ids: &[String],
) -> Result<usize, HemoError> {
    let serials = normalize_serials(serial_ids)?;
    db.connection()
        .call(move |conn| -> Result<Result<usize, HemoError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let checked = load_batch(&tx, component, &serials, |unit| {
                ensure_in_storage(&unit.serial_id, unit.status, "delete")
            })?;
            if let Err(e) = checked {
                return Ok(Err(e));
            }
            let mut deleted = 0;
            for serial in &serials {
                deleted += tx.execute("DELETE FROM blood_units WHERE serial_id = ?1", params![serial])?;
            }
            tx.commit()?;
            Ok(Ok(deleted))
        })
        .await
        .map_err(map_tr_err)?
}

/// `stored -> non_conforming` for every serial, atomically.
pub async fn transfer_to_non_conforming(
    db: &Database,
    component: ComponentType,
    serial_ids: &[String],
) -> Result<usize, HemoError> {
    let serials = normalize_serials(serial_ids)?;
    db.connection()
        .call(move |conn| -> Result<Result<usize, HemoError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = match apply_transition(&tx, component, &serials, Transition::Transfer, None)? {
                Ok(changed) => changed,
                Err(e) => return Ok(Err(e)),
            };
            tx.commit()?;
            Ok(Ok(changed))
        })
        .await
        .map_err(map_tr_err)?
}

/// `from -> stored` for every serial, atomically. `from` must be
/// `released` or `non_conforming`.
pub async fn restore_units(
    db: &Database,
    component: ComponentType,
    from: UnitStatus,
    serial_ids: &[String],
) -> Result<usize, HemoError> {
    if !matches!(from, UnitStatus::Released | UnitStatus::NonConforming) {
        return Err(HemoError::Validation(format!(
            "units cannot be restored from {from}"
        )));
    }
    let serials = normalize_serials(serial_ids)?;
    db.connection()
        .call(move |conn| -> Result<Result<usize, HemoError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed =
                match apply_transition(&tx, component, &serials, Transition::Restore, Some(from))? {
                    Ok(changed) => changed,
                    Err(e) => return Ok(Err(e)),
                };
            tx.commit()?;
            Ok(Ok(changed))
        })
        .await
        .map_err(map_tr_err)?
}

fn sort_column(key: SortKey) -> &'static str {
    match key {
        SortKey::SerialId => "serial_id",
        SortKey::CollectionDate => "collection_date",
        SortKey::ExpirationDate => "expiration_date",
        SortKey::Volume => "volume_ml",
    }
}

fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Build the `WHERE` clause and its bound values for a query.
fn filter_clause(query: &UnitQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    if let Some(component) = query.component {
        clauses.push("component = ?");
        values.push(Value::Text(component.slug().to_string()));
    }
    if let Some(status) = query.status {
        clauses.push("status = ?");
        values.push(Value::Text(status.to_string()));
    }
    if let Some(blood_type) = query.blood_type {
        clauses.push("blood_type = ?");
        values.push(Value::Text(blood_type.to_string()));
    }
    if let Some(rh) = query.rh_factor {
        clauses.push("rh_factor = ?");
        values.push(Value::Text(rh.to_string()));
    }
    if let Some(needle) = query.serial_contains.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        clauses.push("serial_id LIKE ? ESCAPE '\\'");
        values.push(Value::Text(escape_like(needle)));
    }
    if let Some(before) = query.expiring_before {
        clauses.push("expiration_date < ?");
        values.push(Value::Text(format_date(before)));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

/// Filter, sort, and page units.
pub async fn search_units(db: &Database, query: &UnitQuery) -> Result<UnitPage, HemoError> {
    if query.page == 0 || query.page_size == 0 {
        return Err(HemoError::Validation(
            "page and page size must be at least 1".into(),
        ));
    }
    let (where_sql, values) = filter_clause(query);
    let direction = if query.descending { "DESC" } else { "ASC" };
    let order = format!("{} {direction}, serial_id ASC", sort_column(query.sort));
    let (page, page_size, offset) = (query.page, query.page_size, query.offset());

    db.connection()
        .call(move |conn| -> Result<UnitPage, rusqlite::Error> {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM blood_units{where_sql}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {UNIT_COLUMNS} FROM blood_units{where_sql}
                 ORDER BY {order} LIMIT {page_size} OFFSET {offset}"
            ))?;
            let units = stmt
                .query_map(params_from_iter(values.iter()), unit_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(UnitPage {
                units,
                total: u64::try_from(total).unwrap_or_default(),
                page,
                page_size,
            })
        })
        .await
        .map_err(map_tr_err)
}
