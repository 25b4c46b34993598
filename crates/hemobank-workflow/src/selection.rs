// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-based unit selection shared by the release, transfer, discard, and
//! restore workflows.

use std::collections::HashSet;
use std::future::Future;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hemobank_core::{BloodUnit, HemoError};

use crate::debounce::{DebouncedLookup, RowLookup};
use crate::engine::InventoryEngine;
use crate::phase::{transition, PhaseEvent, WorkflowPhase};
use crate::resolution::{LookupTarget, Resolution};
use crate::rows::{RowId, RowList};

/// One selection row and what its serial resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRow {
    pub serial_id: String,
    /// `None` until a lookup for the current serial completes.
    pub resolution: Option<Resolution>,
    /// Registry failure from the last lookup, if any.
    pub lookup_error: Option<String>,
}

impl SelectionRow {
    pub fn is_found(&self) -> bool {
        self.resolution.as_ref().is_some_and(Resolution::is_found)
    }

    /// Read-only preview of the resolved unit.
    pub fn unit(&self) -> Option<&BloodUnit> {
        self.resolution.as_ref().and_then(Resolution::unit)
    }
}

/// Rows, their lookups, the phase, and the cancellation token of one
/// selection-driven workflow.
pub struct Picker {
    engine: InventoryEngine,
    target: LookupTarget,
    rows: RowList<SelectionRow>,
    lookups: DebouncedLookup,
    phase: WorkflowPhase,
    token: CancellationToken,
}

impl Picker {
    /// A picker already open in `Selecting`.
    pub(crate) fn open(engine: InventoryEngine, target: LookupTarget) -> Self {
        let lookups = DebouncedLookup::new(engine.resolver(), engine.settings().lookup_debounce);
        Self {
            engine,
            target,
            rows: RowList::new(SelectionRow::default()),
            lookups,
            phase: WorkflowPhase::Selecting,
            token: CancellationToken::new(),
        }
    }

    pub fn engine(&self) -> &InventoryEngine {
        &self.engine
    }

    pub fn target(&self) -> LookupTarget {
        self.target
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn step(&mut self, event: PhaseEvent) -> Result<WorkflowPhase, HemoError> {
        self.phase = transition(self.phase, event)?;
        Ok(self.phase)
    }

    /// Start a fresh selection after `Done` or a cancellation.
    pub fn reopen(&mut self) -> Result<(), HemoError> {
        self.step(PhaseEvent::Open)?;
        self.lookups.cancel_all();
        self.token = CancellationToken::new();
        self.rows.reset(SelectionRow::default());
        Ok(())
    }

    fn ensure_selecting(&self, event: &str) -> Result<(), HemoError> {
        if self.phase == WorkflowPhase::Selecting {
            Ok(())
        } else {
            Err(HemoError::InvalidPhase {
                phase: self.phase.to_string(),
                event: event.to_string(),
            })
        }
    }

    pub(crate) fn ensure_live(&self) -> Result<(), HemoError> {
        if self.token.is_cancelled() {
            Err(HemoError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn add_row(&mut self) -> Result<RowId, HemoError> {
        self.ensure_selecting("add a row")?;
        Ok(self.rows.push(SelectionRow::default()))
    }

    /// Remove a row and cancel its lookup. The last row stays.
    pub fn remove_row(&mut self, row: RowId) -> bool {
        if self.phase != WorkflowPhase::Selecting {
            return false;
        }
        let removed = self.rows.remove(row);
        if removed {
            self.lookups.cancel_row(row);
        }
        removed
    }

    /// Record a keystroke-level serial edit and debounce its lookup.
    ///
    /// Called outside a Tokio runtime, no lookup is scheduled and the row
    /// stays unresolved until [`Picker::resolve_row`].
    pub fn set_serial(&mut self, row: RowId, serial_id: &str) -> Result<(), HemoError> {
        self.ensure_selecting("edit a serial")?;
        let entry = self.rows.get_mut(row).ok_or_else(|| {
            HemoError::Validation(format!("unknown row {row}"))
        })?;
        entry.serial_id = serial_id.to_string();
        entry.lookup_error = None;
        entry.resolution = if serial_id.trim().is_empty() {
            Some(Resolution::Skipped)
        } else {
            None
        };
        self.lookups.schedule(row, serial_id, self.target, &self.token);
        Ok(())
    }

    /// Resolve a row now, bypassing the debounce (scanner input, blur).
    pub async fn resolve_row(&mut self, row: RowId) -> Result<Resolution, HemoError> {
        self.ensure_live()?;
        self.lookups.cancel_row(row);
        let serial_id = self
            .rows
            .get(row)
            .map(|r| r.serial_id.clone())
            .ok_or_else(|| HemoError::Validation(format!("unknown row {row}")))?;
        let result = self.engine.resolver().resolve(&serial_id, self.target).await;
        self.apply(RowLookup {
            row,
            serial_id,
            result,
        })
    }

    /// Apply lookup results that have already arrived. Returns how many.
    pub fn poll_lookups(&mut self) -> usize {
        let mut applied = 0;
        while let Some(lookup) = self.lookups.try_next() {
            let _ = self.apply(lookup);
            applied += 1;
        }
        applied
    }

    /// Wait for every pending lookup and apply the results.
    pub async fn settle(&mut self) {
        while let Some(lookup) = self.lookups.next().await {
            let _ = self.apply(lookup);
        }
    }

    fn apply(&mut self, lookup: RowLookup) -> Result<Resolution, HemoError> {
        let RowLookup {
            row,
            serial_id,
            result,
        } = lookup;
        let Some(entry) = self.rows.get_mut(row) else {
            return Err(HemoError::Validation(format!("unknown row {row}")));
        };
        if entry.serial_id.trim() != serial_id.trim() {
            debug!(row = %row, "stale lookup ignored");
            return Err(HemoError::Validation(format!("row {row} changed")));
        }
        match result {
            Ok(resolution) => {
                entry.resolution = Some(resolution.clone());
                entry.lookup_error = None;
                Ok(resolution)
            }
            Err(e) => {
                entry.resolution = None;
                entry.lookup_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = (RowId, &SelectionRow)> {
        self.rows.iter()
    }

    pub fn row(&self, row: RowId) -> Option<&SelectionRow> {
        self.rows.get(row)
    }

    pub fn first_row(&self) -> RowId {
        self.rows.first_id()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Units from found rows, first occurrence of each serial only.
    pub fn found_units(&self) -> Vec<BloodUnit> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|(_, row)| row.unit())
            .filter(|unit| seen.insert(unit.serial_id.clone()))
            .cloned()
            .collect()
    }

    /// Found units, or `Validation("no valid items")` when there are none.
    pub(crate) fn require_found(&mut self) -> Result<Vec<BloodUnit>, HemoError> {
        self.poll_lookups();
        let units = self.found_units();
        if units.is_empty() {
            return Err(HemoError::Validation("no valid items".into()));
        }
        Ok(units)
    }

    /// Abort pending lookups and return to `Idle`.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.lookups.cancel_all();
        self.phase = WorkflowPhase::Idle;
        debug!(component = %self.target.component, "workflow cancelled");
    }

    /// Run one registry commit through `Committing`.
    ///
    /// Fails with `Cancelled` before dispatch if the workflow was cancelled.
    /// Once dispatched the request runs to completion.
    pub(crate) async fn commit<T, F, Fut>(&mut self, run: F) -> Result<T, HemoError>
    where
        F: FnOnce(InventoryEngine) -> Fut,
        Fut: Future<Output = Result<T, HemoError>>,
    {
        self.ensure_live()?;
        self.step(PhaseEvent::Submit)?;
        let result = run(self.engine.clone()).await;
        let event = if result.is_ok() {
            PhaseEvent::Succeeded
        } else {
            PhaseEvent::Failed
        };
        self.step(event)?;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hemobank_core::{ComponentType, UnitStatus};

    use super::*;
    use crate::settings::WorkflowSettings;
    use crate::testing::{unit, RecordingLog, StubRegistry};

    fn picker(registry: StubRegistry) -> Picker {
        let engine = InventoryEngine::new(
            Arc::new(registry),
            Arc::new(RecordingLog::default()),
            WorkflowSettings::default(),
        );
        Picker::open(engine, LookupTarget::stored(ComponentType::Rbc))
    }

    #[test]
    fn set_serial_outside_a_runtime_leaves_the_row_unresolved() {
        let mut picker = picker(StubRegistry::with_units(vec![unit(
            "RBC001",
            ComponentType::Rbc,
            UnitStatus::Stored,
        )]));
        let row = picker.first_row();
        picker.set_serial(row, "RBC001").unwrap();
        assert!(picker.row(row).unwrap().resolution.is_none());
        assert_eq!(picker.poll_lookups(), 0);
    }

    #[tokio::test]
    async fn resolve_row_fills_the_preview() {
        let mut picker = picker(StubRegistry::with_units(vec![unit(
            "RBC001",
            ComponentType::Rbc,
            UnitStatus::Stored,
        )]));
        let row = picker.first_row();
        picker.set_serial(row, "RBC001").unwrap();
        picker.resolve_row(row).await.unwrap();
        assert!(picker.row(row).unwrap().is_found());
        assert_eq!(picker.row(row).unwrap().unit().unwrap().volume_ml, 450);
    }

    #[tokio::test]
    async fn duplicate_rows_collapse_in_found_units() {
        let mut picker = picker(StubRegistry::with_units(vec![unit(
            "RBC001",
            ComponentType::Rbc,
            UnitStatus::Stored,
        )]));
        let first = picker.first_row();
        let second = picker.add_row().unwrap();
        for row in [first, second] {
            picker.set_serial(row, "RBC001").unwrap();
            picker.resolve_row(row).await.unwrap();
        }
        assert_eq!(picker.found_units().len(), 1);
    }

    #[tokio::test]
    async fn unresolved_rows_yield_no_valid_items() {
        let mut picker = picker(StubRegistry::default());
        let row = picker.first_row();
        picker.set_serial(row, "GHOST").unwrap();
        assert_eq!(picker.resolve_row(row).await.unwrap(), Resolution::NotFound);
        let err = picker.require_found().unwrap_err();
        assert_eq!(err.to_string(), "no valid items");
    }

    #[tokio::test]
    async fn lookup_failure_is_flagged_on_the_row() {
        let mut picker = picker(StubRegistry::failing());
        let row = picker.first_row();
        picker.set_serial(row, "RBC001").unwrap();
        assert!(picker.resolve_row(row).await.is_err());
        let entry = picker.row(row).unwrap();
        assert!(entry.lookup_error.is_some());
        assert!(!entry.is_found());
    }

    #[tokio::test]
    async fn cancel_returns_to_idle_and_blocks_commits() {
        let mut picker = picker(StubRegistry::default());
        picker.cancel();
        assert_eq!(picker.phase(), WorkflowPhase::Idle);
        let err = picker
            .commit(|_| async { Ok::<_, HemoError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, HemoError::Cancelled));

        picker.reopen().unwrap();
        assert_eq!(picker.phase(), WorkflowPhase::Selecting);
        picker.commit(|_| async { Ok::<_, HemoError>(()) }).await.unwrap();
        assert_eq!(picker.phase(), WorkflowPhase::Done);
    }

    #[tokio::test]
    async fn failed_commit_can_be_retried() {
        let mut picker = picker(StubRegistry::default());
        let err = picker
            .commit(|_| async { Err::<(), _>(HemoError::Internal("boom".into())) })
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(picker.phase(), WorkflowPhase::Failed);
        picker.commit(|_| async { Ok::<_, HemoError>(()) }).await.unwrap();
        assert_eq!(picker.phase(), WorkflowPhase::Done);
    }

    #[tokio::test]
    async fn editing_after_done_is_refused() {
        let mut picker = picker(StubRegistry::default());
        picker.commit(|_| async { Ok::<_, HemoError>(()) }).await.unwrap();
        assert!(matches!(
            picker.add_row().unwrap_err(),
            HemoError::InvalidPhase { .. }
        ));
    }
}
