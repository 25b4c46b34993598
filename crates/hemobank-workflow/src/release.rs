// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase release: pick stored units, then enter the destination.

use serde_json::json;
use tracing::info;

use hemobank_core::{
    ActionType, ActivityRecord, BloodUnit, ComponentType, HemoError, ReleaseDetails,
    ReleaseReceipt,
};

use crate::engine::{count_noun, InventoryEngine};
use crate::phase::{transition, PhaseEvent, WorkflowPhase};
use crate::resolution::LookupTarget;
use crate::rows::RowId;
use crate::selection::{Picker, SelectionRow};
use crate::session::OperatorSession;

impl InventoryEngine {
    /// Reject destination details with blank required fields, when the
    /// settings ask for complete details.
    pub fn check_release_details(&self, details: &ReleaseDetails) -> Result<(), HemoError> {
        if !self.settings().require_release_details {
            return Ok(());
        }
        let missing = details.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HemoError::Validation(format!(
                "Please fill in all required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Release stored units under one invoice and record one `release`
    /// activity listing every serial.
    pub async fn release(
        &self,
        session: &OperatorSession,
        component: ComponentType,
        serial_ids: &[String],
        details: &ReleaseDetails,
    ) -> Result<ReleaseReceipt, HemoError> {
        self.check_release_details(details)?;
        let receipt = self
            .bounded(self.registry().release_units(component, serial_ids, details))
            .await?;
        info!(
            component = %component,
            invoice_id = %receipt.invoice_id,
            count = receipt.released.len(),
            user = session.user_name(),
            "units released"
        );

        let record = ActivityRecord::new(
            session.user_name(),
            ActionType::Release,
            format!("{}_stock", component.slug()),
            receipt.invoice_id.clone(),
            format!(
                "Released {} to {}",
                count_noun(receipt.released.len(), &format!("{component} unit")),
                details.receiving_facility
            ),
            json!({
                "invoiceId": receipt.invoice_id,
                "serialNumbers": receipt.released,
                "receivingFacility": details.receiving_facility,
                "dateOfRelease": details.date_of_release,
                "releasedBy": details.released_by,
            }),
        );
        self.emit(record).await;
        Ok(receipt)
    }
}

/// Release wizard for one component.
///
/// `Selecting` collects rows resolved against stored units. `proceed()`
/// freezes the found units and moves to `Detailing`; unresolved rows are
/// dropped there. `confirm_release()` commits.
pub struct ReleaseWorkflow {
    picker: Picker,
    session: OperatorSession,
    selected: Vec<BloodUnit>,
    details: ReleaseDetails,
}

impl ReleaseWorkflow {
    pub fn new(engine: InventoryEngine, session: OperatorSession, component: ComponentType) -> Self {
        let details = ReleaseDetails {
            released_by: session.user_name().to_string(),
            ..ReleaseDetails::default()
        };
        Self {
            picker: Picker::open(engine, LookupTarget::stored(component)),
            session,
            selected: Vec::new(),
            details,
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.picker.phase()
    }

    pub fn picker(&self) -> &Picker {
        &self.picker
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
        let serial = self
            .picker
            .row(row)
            .map(|r| r.serial_id.clone())
            .unwrap_or_default();
        resolution.into_unit(&serial, self.picker.target())
    }

    /// Wait for debounced lookups to land.
    pub async fn settle(&mut self) {
        self.picker.settle().await;
    }

    /// Freeze the found units and move to the destination step.
    pub fn proceed(&mut self) -> Result<&[BloodUnit], HemoError> {
        transition(self.picker.phase(), PhaseEvent::Proceed)?;
        let units = self.picker.require_found()?;
        self.picker.step(PhaseEvent::Proceed)?;
        self.selected = units;
        Ok(&self.selected)
    }

    /// Units frozen by `proceed()`.
    pub fn selected(&self) -> &[BloodUnit] {
        &self.selected
    }

    /// Back to row editing. Only from `Detailing` or `Failed`.
    pub fn back(&mut self) -> Result<(), HemoError> {
        self.picker.step(PhaseEvent::Back)?;
        self.selected.clear();
        Ok(())
    }

    pub fn details(&self) -> &ReleaseDetails {
        &self.details
    }

    pub fn details_mut(&mut self) -> &mut ReleaseDetails {
        &mut self.details
    }

    pub fn set_details(&mut self, details: ReleaseDetails) {
        self.details = details;
    }

    /// Release the frozen selection.
    pub async fn confirm_release(&mut self) -> Result<ReleaseReceipt, HemoError> {
        if !matches!(self.picker.phase(), WorkflowPhase::Detailing | WorkflowPhase::Failed) {
            return Err(HemoError::InvalidPhase {
                phase: self.picker.phase().to_string(),
                event: "confirm release".into(),
            });
        }
        self.picker.ensure_live()?;
        self.picker.engine().check_release_details(&self.details)?;
        let serials: Vec<String> = self.selected.iter().map(|u| u.serial_id.clone()).collect();
        let component = self.picker.target().component;
        let session = self.session.clone();
        let details = self.details.clone();
        self.picker
            .commit(|engine| async move {
                engine.release(&session, component, &serials, &details).await
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
