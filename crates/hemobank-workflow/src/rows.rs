// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered row lists with stable identities.

use serde::{Deserialize, Serialize};

/// Identity of a row that survives insertions and removals around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(u64);

impl RowId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A non-empty ordered list of rows.
///
/// Removing the last remaining row is a no-op, so a form always has at
/// least one row to type into.
#[derive(Debug, Clone)]
pub struct RowList<T> {
    rows: Vec<(RowId, T)>,
    next_id: u64,
}

impl<T> RowList<T> {
    pub fn new(first: T) -> Self {
        Self {
            rows: vec![(RowId(0), first)],
            next_id: 1,
        }
    }

    pub fn push(&mut self, row: T) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.push((id, row));
        id
    }

    /// Remove a row. Returns `false` for an unknown id or the only row left.
    pub fn remove(&mut self, id: RowId) -> bool {
        if self.rows.len() <= 1 {
            return false;
        }
        match self.rows.iter().position(|(row_id, _)| *row_id == id) {
            Some(index) => {
                self.rows.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: RowId) -> Option<&T> {
        self.rows.iter().find(|(row_id, _)| *row_id == id).map(|(_, row)| row)
    }

    pub fn get_mut(&mut self, id: RowId) -> Option<&mut T> {
        self.rows
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, row)| row)
    }

    pub fn first_id(&self) -> RowId {
        self.rows[0].0
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|(id, _)| *id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowId, &T)> {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every row and start over with `first`.
    pub fn reset(&mut self, first: T) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows = vec![(id, first)];
        id
    }
}
