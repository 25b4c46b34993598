// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inventory workflows for the Hemobank blood bank engine.
//!
//! One generic engine serves every blood component. Workflows resolve serials
//! against the unit registry, accumulate a batch, and commit it in one
//! registry transaction followed by an activity record. Each workflow carries
//! an explicit [`WorkflowPhase`] and a cancellation token; registry calls are
//! bounded by the configured request timeout.

pub mod debounce;
pub mod engine;
pub mod intake;
pub mod maintenance;
pub mod nonconforming;
pub mod outcome;
pub mod phase;
pub mod release;
pub mod resolution;
pub mod restore;
pub mod rows;
pub mod selection;
pub mod session;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use debounce::{DebouncedLookup, RowLookup};
pub use engine::InventoryEngine;
pub use intake::{DraftUnit, IntakeWorkflow};
pub use maintenance::UnitChanges;
pub use nonconforming::{DiscardWorkflow, TransferWorkflow};
pub use outcome::Outcome;
pub use phase::{transition, PhaseEvent, WorkflowPhase};
pub use release::ReleaseWorkflow;
pub use resolution::{LookupTarget, Resolution, SerialResolver};
pub use restore::RestoreWorkflow;
pub use rows::{RowId, RowList};
pub use selection::{Picker, SelectionRow};
pub use session::OperatorSession;
pub use settings::WorkflowSettings;
