// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inventory search, edits, deletions, and record queries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use hemobank_core::lifecycle::ensure_in_storage;
use hemobank_core::{
    ActionType, ActivityRecord, BloodType, BloodUnit, ComponentType, DiscardRecord, HemoError,
    ReleaseRecord, RhFactor, UnitEdit, UnitPage, UnitQuery,
};

use crate::engine::{count_noun, InventoryEngine};
use crate::session::OperatorSession;

/// Operator-facing edit of a stored unit. The expiration date is derived
/// from `collection_date` by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitChanges {
    pub blood_type: Option<BloodType>,
    pub rh_factor: Option<RhFactor>,
    pub volume_ml: Option<u32>,
    pub collection_date: Option<NaiveDate>,
}

impl UnitChanges {
    pub fn is_empty(&self) -> bool {
        self.blood_type.is_none()
            && self.rh_factor.is_none()
            && self.volume_ml.is_none()
            && self.collection_date.is_none()
    }
}

impl InventoryEngine {
    pub async fn search(&self, query: &UnitQuery) -> Result<UnitPage, HemoError> {
        let page = self.bounded(self.registry().search_units(query)).await?;
        debug!(total = page.total, page = page.page, "inventory searched");
        Ok(page)
    }

    /// Raw lookup across every component and status.
    pub async fn lookup(&self, serial_id: &str) -> Result<Option<BloodUnit>, HemoError> {
        self.bounded(self.registry().lookup_by_serial(serial_id.trim())).await
    }

    /// Edit a stored unit, recomputing its expiration when the collection
    /// date changes.
    pub async fn edit_unit(
        &self,
        session: &OperatorSession,
        serial_id: &str,
        changes: &UnitChanges,
    ) -> Result<BloodUnit, HemoError> {
        let serial_id = serial_id.trim();
        if serial_id.is_empty() {
            return Err(HemoError::Validation("serial ID is required".into()));
        }
        if changes.is_empty() {
            return Err(HemoError::Validation("no changes supplied".into()));
        }
        let unit = self.lookup(serial_id).await?.ok_or_else(|| HemoError::NotFound {
            serial_id: serial_id.to_string(),
        })?;
        ensure_in_storage(serial_id, unit.status, "edit")?;

        let mut edit = UnitEdit::default();
        if let Some(blood_type) = changes.blood_type {
            edit = edit.blood_type(blood_type);
        }
        if let Some(rh) = changes.rh_factor {
            edit = edit.rh_factor(rh);
        }
        if let Some(volume) = changes.volume_ml {
            edit = edit.volume_ml(volume)?;
        }
        if let Some(date) = changes.collection_date {
            edit = edit.collection_date(&self.settings().shelf_life, unit.component, date)?;
        }

        let updated = self
            .bounded(self.registry().update_unit(unit.component, serial_id, &edit))
            .await?;
        info!(
            component = %updated.component,
            serial_id,
            user = session.user_name(),
            "unit edited"
        );

        let record = ActivityRecord::new(
            session.user_name(),
            ActionType::Update,
            format!("{}_stock", updated.component.slug()),
            serial_id,
            format!("Updated {} unit {serial_id}", updated.component),
            json!({
                "serialNumber": serial_id,
                "changes": changes,
                "expirationDate": updated.expiration_date,
            }),
        );
        self.emit(record).await;
        Ok(updated)
    }

    /// Delete stored units atomically.
    pub async fn delete_units(
        &self,
        session: &OperatorSession,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<usize, HemoError> {
        let deleted = self
            .bounded(self.registry().delete_units(component, serial_ids))
            .await?;
        info!(
            component = %component,
            count = deleted,
            user = session.user_name(),
            "units deleted"
        );

        let record = ActivityRecord::new(
            session.user_name(),
            ActionType::Delete,
            format!("{}_stock", component.slug()),
            serial_ids.join(", "),
            format!("Deleted {}", count_noun(deleted, &format!("{component} unit"))),
            json!({ "serialNumbers": serial_ids }),
        );
        self.emit(record).await;
        Ok(deleted)
    }

    pub async fn get_release(&self, invoice_id: &str) -> Result<Option<ReleaseRecord>, HemoError> {
        self.bounded(self.registry().get_release(invoice_id)).await
    }

    pub async fn list_releases(&self, component: ComponentType) -> Result<Vec<ReleaseRecord>, HemoError> {
        self.bounded(self.registry().list_releases(component)).await
    }

    pub async fn list_discards(&self, component: ComponentType) -> Result<Vec<DiscardRecord>, HemoError> {
        self.bounded(self.registry().list_discards(component)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hemobank_core::UnitStatus;

    use super::*;
    use crate::settings::WorkflowSettings;
    use crate::testing::{unit, RecordingLog, StubRegistry};

    fn engine(registry: StubRegistry) -> InventoryEngine {
        InventoryEngine::new(
            Arc::new(registry),
            Arc::new(RecordingLog::default()),
            WorkflowSettings::default(),
        )
    }

    fn volume(v: u32) -> UnitChanges {
        UnitChanges {
            volume_ml: Some(v),
            ..UnitChanges::default()
        }
    }

    #[tokio::test]
    async fn editing_an_unknown_serial_is_not_found() {
        let err = engine(StubRegistry::default())
            .edit_unit(&OperatorSession::new("tech"), "GHOST", &volume(200))
            .await
            .unwrap_err();
        assert!(matches!(err, HemoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn editing_a_released_unit_is_a_precondition_failure() {
        let registry = StubRegistry::with_units(vec![unit("R1", ComponentType::Rbc, UnitStatus::Released)]);
        let err = engine(registry)
            .edit_unit(&OperatorSession::new("tech"), "R1", &volume(200))
            .await
            .unwrap_err();
        assert!(matches!(err, HemoError::Precondition { status: UnitStatus::Released, .. }));
    }

    #[tokio::test]
    async fn zero_volume_and_empty_changes_are_validation_errors() {
        let registry = StubRegistry::with_units(vec![unit("R1", ComponentType::Rbc, UnitStatus::Stored)]);
        let engine = engine(registry);
        let session = OperatorSession::new("tech");
        assert!(matches!(
            engine.edit_unit(&session, "R1", &volume(0)).await.unwrap_err(),
            HemoError::Validation(_)
        ));
        assert!(matches!(
            engine.edit_unit(&session, "R1", &UnitChanges::default()).await.unwrap_err(),
            HemoError::Validation(_)
        ));
    }

    #[test]
    fn unit_changes_deserialize_from_camel_case() {
        let changes: UnitChanges =
            serde_json::from_str(r#"{"bloodType":"AB","volumeMl":250,"collectionDate":"2025-01-02"}"#).unwrap();
        assert_eq!(changes.blood_type, Some(BloodType::AB));
        assert_eq!(changes.volume_ml, Some(250));
        assert!(changes.rh_factor.is_none());
    }
}
