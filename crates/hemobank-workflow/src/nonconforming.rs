// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quarantine transfer and permanent discard.

use serde_json::json;
use tracing::info;

use hemobank_core::{
    ActionType, ActivityRecord, BloodUnit, ComponentType, DiscardDetails, DiscardReceipt,
    HemoError, UnitStatus,
};

use crate::engine::{count_noun, InventoryEngine};
use crate::phase::{transition, PhaseEvent, WorkflowPhase};
use crate::resolution::LookupTarget;
use crate::rows::RowId;
use crate::selection::{Picker, SelectionRow};
use crate::session::OperatorSession;

fn non_conforming_entity(component: ComponentType) -> String {
    format!("non_conforming_{}", component.slug())
}

impl InventoryEngine {
    /// Move stored units into the non-conforming bucket.
    pub async fn transfer(
        &self,
        session: &OperatorSession,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<usize, HemoError> {
        let moved = self
            .bounded(self.registry().transfer_to_non_conforming(component, serial_ids))
            .await?;
        info!(
            component = %component,
            count = moved,
            user = session.user_name(),
            "units transferred to non-conforming"
        );

        let record = ActivityRecord::new(
            session.user_name(),
            ActionType::Add,
            non_conforming_entity(component),
            serial_ids.join(", "),
            format!(
                "Transferred {} to non-conforming",
                count_noun(moved, &format!("{component} unit"))
            ),
            json!({ "serialNumbers": serial_ids }),
        );
        self.emit(record).await;
        Ok(moved)
    }

    /// Discard non-conforming units with a disposal record. All seven
    /// disposal fields are required.
    pub async fn discard(
        &self,
        session: &OperatorSession,
        component: ComponentType,
        serial_ids: &[String],
        details: &DiscardDetails,
    ) -> Result<DiscardReceipt, HemoError> {
        let missing = details.missing_fields();
        if !missing.is_empty() {
            return Err(HemoError::Validation(format!(
                "Please fill in all required fields: {}",
                missing.join(", ")
            )));
        }
        let receipt = self
            .bounded(self.registry().discard_non_conforming(component, serial_ids, details))
            .await?;
        info!(
            component = %component,
            discard_id = %receipt.discard_id,
            count = receipt.discarded,
            user = session.user_name(),
            "units discarded"
        );

        let record = ActivityRecord::new(
            session.user_name(),
            ActionType::Discard,
            non_conforming_entity(component),
            receipt.discard_id.clone(),
            format!(
                "Discarded {}: {}",
                count_noun(receipt.discarded, &format!("{component} unit")),
                details.reason_for_discarding
            ),
            json!({
                "discardId": receipt.discard_id,
                "serialNumbers": serial_ids,
                "reasonForDiscarding": details.reason_for_discarding,
                "methodOfDisposal": details.method_of_disposal,
                "authorizedBy": details.authorized_by,
            }),
        );
        self.emit(record).await;
        Ok(receipt)
    }
}

/// Single-step transfer of stored units into quarantine.
pub struct TransferWorkflow {
    picker: Picker,
    session: OperatorSession,
}

impl TransferWorkflow {
    pub fn new(engine: InventoryEngine, session: OperatorSession, component: ComponentType) -> Self {
        Self {
            picker: Picker::open(engine, LookupTarget::stored(component)),
            session,
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.picker.phase()
    }

    pub fn picker_mut(&mut self) -> &mut Picker {
        &mut self.picker
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

    /// Transfer every found row. Unresolved rows are skipped.
    pub async fn commit(&mut self) -> Result<usize, HemoError> {
        self.picker.ensure_live()?;
        let serials: Vec<String> = self
            .picker
            .require_found()?
            .into_iter()
            .map(|u| u.serial_id)
            .collect();
        let component = self.picker.target().component;
        let session = self.session.clone();
        self.picker
            .commit(|engine| async move { engine.transfer(&session, component, &serials).await })
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

/// Two-step discard: pick non-conforming units, then fill the disposal record.
pub struct DiscardWorkflow {
    picker: Picker,
    session: OperatorSession,
    selected: Vec<BloodUnit>,
    details: DiscardDetails,
}

impl DiscardWorkflow {
    pub fn new(engine: InventoryEngine, session: OperatorSession, component: ComponentType) -> Self {
        Self {
            picker: Picker::open(engine, LookupTarget::new(component, UnitStatus::NonConforming)),
            session,
            selected: Vec::new(),
            details: DiscardDetails::default(),
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.picker.phase()
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

    pub fn proceed(&mut self) -> Result<&[BloodUnit], HemoError> {
        transition(self.picker.phase(), PhaseEvent::Proceed)?;
        let units = self.picker.require_found()?;
        self.picker.step(PhaseEvent::Proceed)?;
        self.selected = units;
        Ok(&self.selected)
    }

    pub fn selected(&self) -> &[BloodUnit] {
        &self.selected
    }

    pub fn back(&mut self) -> Result<(), HemoError> {
        self.picker.step(PhaseEvent::Back)?;
        self.selected.clear();
        Ok(())
    }

    pub fn details_mut(&mut self) -> &mut DiscardDetails {
        &mut self.details
    }

    pub fn set_details(&mut self, details: DiscardDetails) {
        self.details = details;
    }

    /// Discard the frozen selection. Every disposal field must be filled.
    pub async fn confirm_discard(&mut self) -> Result<DiscardReceipt, HemoError> {
        if !matches!(self.picker.phase(), WorkflowPhase::Detailing | WorkflowPhase::Failed) {
            return Err(HemoError::InvalidPhase {
                phase: self.picker.phase().to_string(),
                event: "confirm discard".into(),
            });
        }
        self.picker.ensure_live()?;
        let missing = self.details.missing_fields();
        if !missing.is_empty() {
            return Err(HemoError::Validation(format!(
                "Please fill in all required fields: {}",
                missing.join(", ")
            )));
        }
        let serials: Vec<String> = self.selected.iter().map(|u| u.serial_id.clone()).collect();
        let component = self.picker.target().component;
        let session = self.session.clone();
        let details = self.details.clone();
        self.picker
            .commit(|engine| async move {
                engine.discard(&session, component, &serials, &details).await
            })
            .await
    }

    pub fn cancel(&mut self) {
        self.picker.cancel();
        self.selected.clear();
    }

    pub fn reopen(&mut self) -> Result<(), HemoError> {
        self.picker.reopen()?;
        self.selected.clear();
        Ok(())
    }
}
