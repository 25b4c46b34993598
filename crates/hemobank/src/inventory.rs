// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inventory subcommands, each driven through the matching workflow.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use hemobank_config::HemobankConfig;
use hemobank_core::{
    ActivityLog, ActivityRecord, BloodUnit, ComponentType, DiscardReceipt, DiscardRecord,
    HemoError, ReleaseReceipt, ReleaseRecord, UnitPage, UnitRegistry, UnitStatus,
};
use hemobank_storage::SqliteRegistry;
use hemobank_workflow::{
    DiscardWorkflow, DraftUnit, IntakeWorkflow, InventoryEngine, OperatorSession,
    ReleaseWorkflow, RestoreWorkflow, TransferWorkflow, WorkflowSettings,
};

use crate::args::{DiscardArgs, EditArgs, ListArgs, ReleaseArgs, UnitSpec};

/// An open registry plus the engine and operator that act on it.
pub struct Inventory {
    registry: Arc<SqliteRegistry>,
    engine: InventoryEngine,
    session: OperatorSession,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Moved {
    pub component: ComponentType,
    pub count: usize,
    pub serial_ids: Vec<String>,
}

impl Inventory {
    pub async fn open(config: &HemobankConfig, operator: Option<&str>) -> Result<Self, HemoError> {
        let registry = Arc::new(SqliteRegistry::open(config.registry.clone()).await?);
        let activity: Arc<dyn ActivityLog> = registry.clone();
        let engine = InventoryEngine::new(
            registry.clone(),
            activity,
            WorkflowSettings::from_config(config),
        );
        let session = match operator {
            Some(name) => OperatorSession::new(name),
            None => OperatorSession::from_config(config),
        };
        Ok(Self {
            registry,
            engine,
            session,
        })
    }

    /// Checkpoint the WAL. Failures are logged, not returned.
    pub async fn close(self) {
        if let Err(e) = self.registry.close().await {
            warn!(error = %e, "registry close failed");
        }
    }

    pub async fn intake(
        &self,
        component: ComponentType,
        specs: &[UnitSpec],
    ) -> Result<Vec<DraftUnit>, HemoError> {
        let mut workflow =
            IntakeWorkflow::new(self.engine.clone(), self.session.clone(), component);
        for (i, spec) in specs.iter().enumerate() {
            let row = if i == 0 {
                workflow.first_row()
            } else {
                workflow.add_row()?
            };
            workflow.set_serial(row, &spec.serial_id)?;
            workflow.set_blood_type(row, spec.blood_type)?;
            workflow.set_rh_factor(row, spec.rh_factor)?;
            if let Some(volume) = spec.volume_ml {
                workflow.set_volume(row, volume)?;
            }
            workflow.set_collection_date(row, spec.collection_date)?;
        }
        workflow.commit().await?;
        Ok(workflow.rows().map(|(_, draft)| draft.clone()).collect())
    }

    pub async fn lookup(&self, serial_id: &str) -> Result<BloodUnit, HemoError> {
        self.engine
            .lookup(serial_id)
            .await?
            .ok_or_else(|| HemoError::NotFound {
                serial_id: serial_id.trim().to_string(),
            })
    }

    pub async fn list(&self, args: &ListArgs) -> Result<UnitPage, HemoError> {
        self.engine.search(&args.to_query()).await
    }

    pub async fn edit(&self, args: &EditArgs) -> Result<BloodUnit, HemoError> {
        self.engine
            .edit_unit(&self.session, &args.serial, &args.changes())
            .await
    }

    pub async fn delete(
        &self,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<Moved, HemoError> {
        let count = self
            .engine
            .delete_units(&self.session, component, serial_ids)
            .await?;
        Ok(Moved {
            component,
            count,
            serial_ids: serial_ids.to_vec(),
        })
    }

    pub async fn release(
        &self,
        component: ComponentType,
        serial_ids: &[String],
        args: ReleaseArgs,
    ) -> Result<ReleaseReceipt, HemoError> {
        let mut workflow =
            ReleaseWorkflow::new(self.engine.clone(), self.session.clone(), component);
        for (i, serial) in serial_ids.iter().enumerate() {
            let row = if i == 0 {
                workflow.first_row()
            } else {
                workflow.add_row()?
            };
            workflow.set_serial(row, serial)?;
            workflow.resolve_row(row).await?;
        }
        workflow.proceed()?;
        args.apply(workflow.details_mut());
        workflow.confirm_release().await
    }

    pub async fn transfer(
        &self,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<Moved, HemoError> {
        let mut workflow =
            TransferWorkflow::new(self.engine.clone(), self.session.clone(), component);
        for (i, serial) in serial_ids.iter().enumerate() {
            let row = if i == 0 {
                workflow.first_row()
            } else {
                workflow.add_row()?
            };
            workflow.set_serial(row, serial)?;
            workflow.resolve_row(row).await?;
        }
        let count = workflow.commit().await?;
        Ok(Moved {
            component,
            count,
            serial_ids: serial_ids.to_vec(),
        })
    }

    pub async fn discard(
        &self,
        component: ComponentType,
        serial_ids: &[String],
        args: DiscardArgs,
    ) -> Result<DiscardReceipt, HemoError> {
        let mut workflow =
            DiscardWorkflow::new(self.engine.clone(), self.session.clone(), component);
        for (i, serial) in serial_ids.iter().enumerate() {
            let row = if i == 0 {
                workflow.first_row()
            } else {
                workflow.add_row()?
            };
            workflow.set_serial(row, serial)?;
            workflow.resolve_row(row).await?;
        }
        workflow.proceed()?;
        workflow.set_details(args.into_details(self.session.user_name()));
        workflow.confirm_discard().await
    }

    pub async fn restore(
        &self,
        component: ComponentType,
        from: UnitStatus,
        serial_ids: &[String],
    ) -> Result<Moved, HemoError> {
        let mut workflow =
            RestoreWorkflow::new(self.engine.clone(), self.session.clone(), component, from)?;
        for (i, serial) in serial_ids.iter().enumerate() {
            let row = if i == 0 {
                workflow.first_row()
            } else {
                workflow.add_row()?
            };
            workflow.set_serial(row, serial)?;
            workflow.resolve_row(row).await?;
        }
        let count = workflow.commit().await?;
        Ok(Moved {
            component,
            count,
            serial_ids: serial_ids.to_vec(),
        })
    }

    pub async fn releases(&self, component: ComponentType) -> Result<Vec<ReleaseRecord>, HemoError> {
        self.engine.list_releases(component).await
    }

    pub async fn invoice(&self, invoice_id: &str) -> Result<ReleaseRecord, HemoError> {
        self.engine
            .get_release(invoice_id)
            .await?
            .ok_or_else(|| HemoError::Validation(format!("no release invoice {invoice_id}")))
    }

    pub async fn discards(&self, component: ComponentType) -> Result<Vec<DiscardRecord>, HemoError> {
        self.engine.list_discards(component).await
    }

    pub async fn activity(&self, limit: usize) -> Result<Vec<ActivityRecord>, HemoError> {
        self.engine.recent_activity(limit).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use hemobank_core::{BloodType, ErrorKind, RhFactor};

    use super::*;

    async fn inventory() -> (tempfile::TempDir, Inventory) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HemobankConfig::default();
        config.registry.database_path = dir
            .path()
            .join("hemobank.db")
            .to_string_lossy()
            .into_owned();
        let inventory = Inventory::open(&config, Some("tech.reyes")).await.unwrap();
        (dir, inventory)
    }

    fn spec(serial: &str) -> UnitSpec {
        UnitSpec {
            serial_id: serial.into(),
            blood_type: BloodType::A,
            rh_factor: RhFactor::Negative,
            collection_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            volume_ml: None,
        }
    }

    fn serials(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn intake_fills_default_volume() {
        let (_dir, inventory) = inventory().await;
        let drafts = inventory
            .intake(ComponentType::Plasma, &[spec("PLA001"), spec("PLA002")])
            .await
            .unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].volume_ml, 100);
        assert_eq!(
            drafts[0].expiration_date(),
            NaiveDate::from_ymd_opt(2026, 1, 1)
        );

        let unit = inventory.lookup("PLA002").await.unwrap();
        assert_eq!(unit.blood_group(), "A-");
        assert_eq!(unit.status, UnitStatus::Stored);
    }

    #[tokio::test]
    async fn release_with_missing_details_is_rejected() {
        let (_dir, inventory) = inventory().await;
        inventory.intake(ComponentType::Rbc, &[spec("RBC001")]).await.unwrap();

        let err = inventory
            .release(ComponentType::Rbc, &serials(&["RBC001"]), ReleaseArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("receivingFacility"));
        assert_eq!(
            inventory.lookup("RBC001").await.unwrap().status,
            UnitStatus::Stored
        );
    }

    #[tokio::test]
    async fn quarantine_then_restore() {
        let (_dir, inventory) = inventory().await;
        inventory.intake(ComponentType::Rbc, &[spec("RBC001")]).await.unwrap();

        let moved = inventory
            .transfer(ComponentType::Rbc, &serials(&["RBC001"]))
            .await
            .unwrap();
        assert_eq!(moved.count, 1);

        let restored = inventory
            .restore(ComponentType::Rbc, UnitStatus::NonConforming, &serials(&["RBC001"]))
            .await
            .unwrap();
        assert_eq!(restored.count, 1);
        assert_eq!(
            inventory.lookup("RBC001").await.unwrap().status,
            UnitStatus::Stored
        );

        let activity = inventory.activity(10).await.unwrap();
        assert_eq!(activity.len(), 3);
        assert!(activity.iter().all(|r| r.user_name == "tech.reyes"));
    }

    #[tokio::test]
    async fn unknown_serial_stops_the_batch() {
        let (_dir, inventory) = inventory().await;
        inventory.intake(ComponentType::Rbc, &[spec("RBC001")]).await.unwrap();

        let err = inventory
            .transfer(ComponentType::Rbc, &serials(&["RBC001", "NOPE"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            inventory.lookup("RBC001").await.unwrap().status,
            UnitStatus::Stored
        );
    }

    #[tokio::test]
    async fn missing_invoice_is_reported() {
        let (_dir, inventory) = inventory().await;
        let err = inventory.invoice("INV-404").await.unwrap_err();
        assert!(err.to_string().contains("INV-404"));
    }
}
