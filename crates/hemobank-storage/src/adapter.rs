// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `UnitRegistry` and `ActivityLog` traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use hemobank_config::model::RegistryConfig;
use hemobank_core::{
    ActivityLog, ActivityRecord, AdapterType, BloodUnit, ComponentType, DiscardDetails,
    DiscardReceipt, DiscardRecord, HealthStatus, HemoError, NewUnit, PluginAdapter,
    ReleaseDetails, ReleaseReceipt, ReleaseRecord, UnitEdit, UnitPage, UnitQuery, UnitRegistry,
    UnitStatus,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed unit registry and activity log.
///
/// Both traits share one [`Database`] handle, opened on the first call to
/// [`UnitRegistry::initialize`].
pub struct SqliteRegistry {
    config: RegistryConfig,
    db: OnceCell<Database>,
}

impl SqliteRegistry {
    /// The connection is not opened until [`UnitRegistry::initialize`] is called.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Construct and initialize in one step.
    pub async fn open(config: RegistryConfig) -> Result<Self, HemoError> {
        let registry = Self::new(config);
        registry.initialize().await?;
        Ok(registry)
    }

    pub fn database_path(&self) -> &str {
        &self.config.database_path
    }

    fn db(&self) -> Result<&Database, HemoError> {
        self.db.get().ok_or_else(|| HemoError::Storage {
            source: "registry not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteRegistry {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Registry
    }

    async fn health_check(&self) -> Result<HealthStatus, HemoError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("registry not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HemoError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl UnitRegistry for SqliteRegistry {
    async fn initialize(&self) -> Result<(), HemoError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| HemoError::Storage {
            source: "registry already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite registry initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), HemoError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn lookup_by_serial(&self, serial_id: &str) -> Result<Option<BloodUnit>, HemoError> {
        queries::units::lookup_by_serial(self.db()?, serial_id).await
    }

    async fn insert_units(
        &self,
        component: ComponentType,
        units: &[NewUnit],
    ) -> Result<Vec<String>, HemoError> {
        queries::units::insert_units(self.db()?, component, units).await
    }

    async fn update_unit(
        &self,
        component: ComponentType,
        serial_id: &str,
        edit: &UnitEdit,
    ) -> Result<BloodUnit, HemoError> {
        queries::units::update_unit(self.db()?, component, serial_id, edit).await
    }

    async fn delete_units(
        &self,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<usize, HemoError> {
        queries::units::delete_units(self.db()?, component, serial_ids).await
    }

    async fn search_units(&self, query: &UnitQuery) -> Result<UnitPage, HemoError> {
        queries::units::search_units(self.db()?, query).await
    }

    async fn release_units(
        &self,
        component: ComponentType,
        serial_ids: &[String],
        details: &ReleaseDetails,
    ) -> Result<ReleaseReceipt, HemoError> {
        queries::releases::release_units(self.db()?, component, serial_ids, details).await
    }

    async fn transfer_to_non_conforming(
        &self,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<usize, HemoError> {
        queries::units::transfer_to_non_conforming(self.db()?, component, serial_ids).await
    }

    async fn discard_non_conforming(
        &self,
        component: ComponentType,
        serial_ids: &[String],
        details: &DiscardDetails,
    ) -> Result<DiscardReceipt, HemoError> {
        queries::discards::discard_non_conforming(self.db()?, component, serial_ids, details).await
    }

    async fn restore_units(
        &self,
        component: ComponentType,
        from: UnitStatus,
        serial_ids: &[String],
    ) -> Result<usize, HemoError> {
        queries::units::restore_units(self.db()?, component, from, serial_ids).await
    }

    async fn get_release(&self, invoice_id: &str) -> Result<Option<ReleaseRecord>, HemoError> {
        queries::releases::get_release(self.db()?, invoice_id).await
    }

    async fn list_releases(&self, component: ComponentType) -> Result<Vec<ReleaseRecord>, HemoError> {
        queries::releases::list_releases(self.db()?, component).await
    }

    async fn list_discards(&self, component: ComponentType) -> Result<Vec<DiscardRecord>, HemoError> {
        queries::discards::list_discards(self.db()?, component).await
    }
}

#[async_trait]
impl ActivityLog for SqliteRegistry {
    async fn append(&self, record: &ActivityRecord) -> Result<(), HemoError> {
        queries::activity::append(self.db()?, record).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>, HemoError> {
        queries::activity::recent(self.db()?, limit).await
    }
}
