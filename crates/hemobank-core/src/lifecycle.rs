// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-unit lifecycle state machine.
//!
//! ```text
//! Stored --release--> Released --restore--> Stored
//! Stored --transfer--> NonConforming --discard--> Discarded
//!                      NonConforming --restore--> Stored
//! ```
//!
//! `Discarded` is terminal. Every other pair is rejected with
//! [`HemoError::Precondition`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HemoError;
use crate::types::UnitStatus;

/// A lifecycle move applied to one unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Release,
    Transfer,
    Discard,
    Restore,
}

impl Transition {
    /// Target status when applied to `from`, or `None` if the move is illegal.
    pub fn apply(self, from: UnitStatus) -> Option<UnitStatus> {
        use UnitStatus::*;
        match (self, from) {
            (Transition::Release, Stored) => Some(Released),
            (Transition::Transfer, Stored) => Some(NonConforming),
            (Transition::Discard, NonConforming) => Some(Discarded),
            (Transition::Restore, Released | NonConforming) => Some(Stored),
            _ => None,
        }
    }

    /// Like [`Transition::apply`], reporting the offending unit on failure.
    pub fn check(self, serial_id: &str, from: UnitStatus) -> Result<UnitStatus, HemoError> {
        self.apply(from).ok_or_else(|| HemoError::Precondition {
            serial_id: serial_id.to_string(),
            status: from,
            action: self.to_string(),
        })
    }

    /// Status a unit must be in for this move, when there is exactly one.
    pub fn source_status(self) -> Option<UnitStatus> {
        match self {
            Transition::Release | Transition::Transfer => Some(UnitStatus::Stored),
            Transition::Discard => Some(UnitStatus::NonConforming),
            Transition::Restore => None,
        }
    }
}

/// Edits and deletions only touch units that are still in storage.
pub fn ensure_in_storage(serial_id: &str, status: UnitStatus, action: &str) -> Result<(), HemoError> {
    if status == UnitStatus::Stored {
        Ok(())
    } else {
        Err(HemoError::Precondition {
            serial_id: serial_id.to_string(),
            status,
            action: action.to_string(),
        })
    }
}
