// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Returning released or quarantined units to storage.

use serde_json::json;
use tracing::info;

use hemobank_core::{ActionType, ActivityRecord, BloodUnit, ComponentType, HemoError, UnitStatus};

use crate::engine::{count_noun, InventoryEngine};
use crate::phase::{PhaseEvent, WorkflowPhase};
use crate::resolution::LookupTarget;
use crate::rows::RowId;
use crate::selection::{Picker, SelectionRow};
use crate::session::OperatorSession;

fn ensure_restorable(from: UnitStatus) -> Result<(), HemoError> {
    match from {
        UnitStatus::Released | UnitStatus::NonConforming => Ok(()),
        other => Err(HemoError::Validation(format!(
            "units cannot be restored from {other}"
        ))),
    }
}

impl InventoryEngine {
    /// `from -> Stored` for every serial, recorded as one `update` activity.
    pub async fn restore(
        &self,
        session: &OperatorSession,
        component: ComponentType,
        from: UnitStatus,
        serial_ids: &[String],
    ) -> Result<usize, HemoError> {
        ensure_restorable(from)?;
        let restored = self
            .bounded(self.registry().restore_units(component, from, serial_ids))
            .await?;
        info!(
            component = %component,
            from = %from,
            count = restored,
            user = session.user_name(),
            "units restored to storage"
        );

        let record = ActivityRecord::new(
            session.user_name(),
            ActionType::Update,
            format!("{}_stock", component.slug()),
            serial_ids.join(", "),
            format!(
                "Restored {} from {from} to stored",
                count_noun(restored, &format!("{component} unit"))
            ),
            json!({
                "serialNumbers": serial_ids,
                "from": from,
                "to": UnitStatus::Stored,
            }),
        );
        self.emit(record).await;
        Ok(restored)
    }
}

/// Single-step restore of units found in one source bucket.
pub struct RestoreWorkflow {
    picker: Picker,
    session: OperatorSession,
    from: UnitStatus,
}

impl RestoreWorkflow {
    pub fn new(
        engine: InventoryEngine,
        session: OperatorSession,
        component: ComponentType,
        from: UnitStatus,
    ) -> Result<Self, HemoError> {
        ensure_restorable(from)?;
        Ok(Self {
            picker: Picker::open(engine, LookupTarget::new(component, from)),
            session,
            from,
        })
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.picker.phase()
    }

    pub fn from_status(&self) -> UnitStatus {
        self.from
    }

    pub fn first_row(&self) -> RowId {
        self.picker.first_row()
    }

    pub fn rows(&self) -> impl Iterator<Item = (RowId, &SelectionRow)> {
        self.picker.rows()
    }

    pub fn add_row(&mut self) -> Result<RowId, HemoError> {
        self.picker.add_row()
    }

    pub fn remove_row(&mut self, row: RowId) -> bool {
        self.picker.remove_row(row)
    }

    pub fn set_serial(&mut self, row: RowId, serial_id: &str) -> Result<(), HemoError> {
        self.picker.set_serial(row, serial_id)
    }

    pub async fn resolve_row(&mut self, row: RowId) -> Result<BloodUnit, HemoError> {
        let resolution = self.picker.resolve_row(row).await?;
        let serial = self.picker.row(row).map(|r| r.serial_id.clone()).unwrap_or_default();
        resolution.into_unit(&serial, self.picker.target())
    }

    pub async fn settle(&mut self) {
        self.picker.settle().await;
    }

    pub async fn commit(&mut self) -> Result<usize, HemoError> {
        self.picker.ensure_live()?;
        let serials: Vec<String> = self
            .picker
            .require_found()?
            .into_iter()
            .map(|u| u.serial_id)
            .collect();
        let component = self.picker.target().component;
        let from = self.from;
        let session = self.session.clone();
        self.picker
            .commit(|engine| async move { engine.restore(&session, component, from, &serials).await })
            .await
    }

    /// Leave `Failed` for `Selecting` so the rows can be corrected.
    pub fn back(&mut self) -> Result<(), HemoError> {
        self.picker.step(PhaseEvent::Back)?;
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.picker.cancel();
    }

    pub fn reopen(&mut self) -> Result<(), HemoError> {
        self.picker.reopen()
    }
}
