// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over the registry database.
//!
//! Every function takes a [`Database`](crate::database::Database) and runs on
//! its background thread. Batch mutations run inside one transaction; a domain
//! rejection found mid-batch is returned as the inner `Err` of
//! `Result<Result<T, HemoError>, rusqlite::Error>` so the transaction is
//! dropped without commit.

pub mod activity;
pub mod discards;
pub mod releases;
pub mod units;

use std::collections::HashSet;

use hemobank_core::HemoError;

/// Trim, drop blanks, and de-duplicate serials while keeping first-seen order.
pub(crate) fn normalize_serials(serial_ids: &[String]) -> Result<Vec<String>, HemoError> {
    let mut seen = HashSet::new();
    let serials: Vec<String> = serial_ids
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect();
    if serials.is_empty() {
        return Err(HemoError::Validation("no valid items".into()));
    }
    Ok(serials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_first_occurrence_order() {
        let input = vec![
            " B ".to_string(),
            "A".to_string(),
            "B".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_serials(&input).unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn normalize_rejects_all_blank() {
        let err = normalize_serials(&["  ".to_string()]).unwrap_err();
        assert!(matches!(err, HemoError::Validation(ref m) if m == "no valid items"));
    }
}
