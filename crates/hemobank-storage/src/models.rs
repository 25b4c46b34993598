// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite text columns and domain types.
//!
//! Enums are stored as their `Display` form (components as slugs) and dates
//! as `YYYY-MM-DD`. Parse failures surface as `FromSqlConversionFailure`.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use hemobank_core::BloodUnit;
use rusqlite::types::Type;
use rusqlite::Row;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";

/// Columns selected for every `BloodUnit` read, in `unit_from_row` order.
pub(crate) const UNIT_COLUMNS: &str = "serial_id, component, blood_type, rh_factor, volume_ml, \
     collection_date, expiration_date, status, created_at, modified_at";

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Parse a text column through `FromStr`.
pub(crate) fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn optional_date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn optional_time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveTime::parse_from_str(&s, TIME_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn unit_from_row(row: &Row<'_>) -> rusqlite::Result<BloodUnit> {
    Ok(BloodUnit {
        serial_id: row.get(0)?,
        component: parse_column(row, 1)?,
        blood_type: parse_column(row, 2)?,
        rh_factor: parse_column(row, 3)?,
        volume_ml: row.get(4)?,
        collection_date: date_column(row, 5)?,
        expiration_date: date_column(row, 6)?,
        status: parse_column(row, 7)?,
        created_at: row.get(8)?,
        modified_at: row.get(9)?,
    })
}
