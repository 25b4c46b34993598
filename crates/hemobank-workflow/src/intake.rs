// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stock intake: draft rows in, stored units out.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use hemobank_core::{
    ActionType, ActivityRecord, BloodType, ComponentType, HemoError, NewUnit, RhFactor,
};

use crate::engine::InventoryEngine;
use crate::phase::{transition, PhaseEvent, WorkflowPhase};
use crate::rows::{RowId, RowList};
use crate::session::OperatorSession;

const REQUIRED_FIELDS: &str = "Please fill in all required fields for all items";

impl InventoryEngine {
    /// Insert a validated batch and record one `add` activity per unit.
    pub async fn intake(
        &self,
        session: &OperatorSession,
        component: ComponentType,
        units: &[NewUnit],
    ) -> Result<Vec<String>, HemoError> {
        if units.is_empty() {
            return Err(HemoError::Validation("no valid items".into()));
        }
        let inserted = self
            .bounded(self.registry().insert_units(component, units))
            .await?;
        info!(
            component = %component,
            count = inserted.len(),
            user = session.user_name(),
            "units added to storage"
        );

        let entity_type = format!("{}_stock", component.slug());
        for unit in units {
            let record = ActivityRecord::new(
                session.user_name(),
                ActionType::Add,
                entity_type.clone(),
                unit.serial_id(),
                format!("Added {component} unit {}", unit.serial_id()),
                json!({
                    "serialNumber": unit.serial_id(),
                    "bloodType": unit.blood_type(),
                    "rhFactor": unit.rh_factor(),
                    "volume": unit.volume_ml(),
                    "collectionDate": unit.collection_date(),
                    "expirationDate": unit.expiration_date(),
                }),
            );
            self.emit(record).await;
        }
        Ok(inserted)
    }
}

/// One intake form row.
///
/// The expiration date has no setter: it follows the collection date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftUnit {
    pub serial_id: String,
    pub blood_type: BloodType,
    pub rh_factor: RhFactor,
    pub volume_ml: u32,
    collection_date: Option<NaiveDate>,
    expiration_date: Option<NaiveDate>,
}

impl DraftUnit {
    fn with_volume(volume_ml: u32) -> Self {
        Self {
            serial_id: String::new(),
            blood_type: BloodType::O,
            rh_factor: RhFactor::Positive,
            volume_ml,
            collection_date: None,
            expiration_date: None,
        }
    }

    pub fn collection_date(&self) -> Option<NaiveDate> {
        self.collection_date
    }

    pub fn expiration_date(&self) -> Option<NaiveDate> {
        self.expiration_date
    }
}

/// Batch intake of new units for one component.
pub struct IntakeWorkflow {
    engine: InventoryEngine,
    session: OperatorSession,
    component: ComponentType,
    rows: RowList<DraftUnit>,
    phase: WorkflowPhase,
    token: CancellationToken,
}

impl IntakeWorkflow {
    /// Opens in `Selecting` with one default row.
    pub fn new(engine: InventoryEngine, session: OperatorSession, component: ComponentType) -> Self {
        let first = DraftUnit::with_volume(engine.settings().default_volume_ml);
        Self {
            engine,
            session,
            component,
            rows: RowList::new(first),
            phase: WorkflowPhase::Selecting,
            token: CancellationToken::new(),
        }
    }

    pub fn component(&self) -> ComponentType {
        self.component
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn rows(&self) -> impl Iterator<Item = (RowId, &DraftUnit)> {
        self.rows.iter()
    }

    pub fn row(&self, row: RowId) -> Option<&DraftUnit> {
        self.rows.get(row)
    }

    pub fn first_row(&self) -> RowId {
        self.rows.first_id()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn editable_row(&mut self, row: RowId) -> Result<&mut DraftUnit, HemoError> {
        if self.phase != WorkflowPhase::Selecting {
            return Err(HemoError::InvalidPhase {
                phase: self.phase.to_string(),
                event: "edit a row".into(),
            });
        }
        self.rows
            .get_mut(row)
            .ok_or_else(|| HemoError::Validation(format!("unknown row {row}")))
    }

    /// Append a row with the default blood group and volume.
    pub fn add_row(&mut self) -> Result<RowId, HemoError> {
        if self.phase != WorkflowPhase::Selecting {
            return Err(HemoError::InvalidPhase {
                phase: self.phase.to_string(),
                event: "add a row".into(),
            });
        }
        let row = DraftUnit::with_volume(self.engine.settings().default_volume_ml);
        Ok(self.rows.push(row))
    }

    /// No-op on the only remaining row.
    pub fn remove_row(&mut self, row: RowId) -> bool {
        self.phase == WorkflowPhase::Selecting && self.rows.remove(row)
    }

    pub fn set_serial(&mut self, row: RowId, serial_id: &str) -> Result<(), HemoError> {
        self.editable_row(row)?.serial_id = serial_id.to_string();
        Ok(())
    }

    pub fn set_blood_type(&mut self, row: RowId, blood_type: BloodType) -> Result<(), HemoError> {
        self.editable_row(row)?.blood_type = blood_type;
        Ok(())
    }

    pub fn set_rh_factor(&mut self, row: RowId, rh_factor: RhFactor) -> Result<(), HemoError> {
        self.editable_row(row)?.rh_factor = rh_factor;
        Ok(())
    }

    /// Zero is accepted here and rejected at commit.
    pub fn set_volume(&mut self, row: RowId, volume_ml: u32) -> Result<(), HemoError> {
        self.editable_row(row)?.volume_ml = volume_ml;
        Ok(())
    }

    /// Set the collection date and return the recomputed expiration date.
    pub fn set_collection_date(&mut self, row: RowId, date: NaiveDate) -> Result<NaiveDate, HemoError> {
        let expiration = self
            .engine
            .settings()
            .shelf_life
            .expiration_for(self.component, date)?;
        let entry = self.editable_row(row)?;
        entry.collection_date = Some(date);
        entry.expiration_date = Some(expiration);
        Ok(expiration)
    }

    /// Validate every row. Any failure rejects the whole batch.
    fn validated_units(&self) -> Result<Vec<NewUnit>, HemoError> {
        let policy = self.engine.settings().shelf_life;
        let mut seen = HashSet::new();
        let mut units = Vec::with_capacity(self.rows.len());
        for (_, row) in self.rows.iter() {
            let serial = row.serial_id.trim();
            let Some(collected) = row.collection_date else {
                return Err(HemoError::Validation(REQUIRED_FIELDS.into()));
            };
            if serial.is_empty() || row.volume_ml == 0 {
                return Err(HemoError::Validation(REQUIRED_FIELDS.into()));
            }
            if !seen.insert(serial.to_string()) {
                return Err(HemoError::Validation(format!(
                    "Duplicate serial ID in batch: {serial}"
                )));
            }
            units.push(NewUnit::new(
                &policy,
                self.component,
                serial,
                row.blood_type,
                row.rh_factor,
                row.volume_ml,
                collected,
            )?);
        }
        Ok(units)
    }

    /// Insert every row as a stored unit in one registry transaction.
    pub async fn commit(&mut self) -> Result<Vec<String>, HemoError> {
        if self.token.is_cancelled() {
            return Err(HemoError::Cancelled);
        }
        let units = self.validated_units()?;
        self.phase = transition(self.phase, PhaseEvent::Submit)?;
        let result = self.engine.intake(&self.session, self.component, &units).await;
        let event = if result.is_ok() {
            PhaseEvent::Succeeded
        } else {
            PhaseEvent::Failed
        };
        self.phase = transition(self.phase, event)?;
        result
    }

    /// Return to `Failed -> Selecting` to fix rows after a rejected commit.
    pub fn back(&mut self) -> Result<(), HemoError> {
        self.phase = transition(self.phase, PhaseEvent::Back)?;
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.token.cancel();
        self.phase = WorkflowPhase::Idle;
    }

    /// Start a new batch with one default row.
    pub fn reopen(&mut self) -> Result<(), HemoError> {
        self.phase = transition(self.phase, PhaseEvent::Open)?;
        self.token = CancellationToken::new();
        self.rows
            .reset(DraftUnit::with_volume(self.engine.settings().default_volume_ml));
        Ok(())
    }
}
