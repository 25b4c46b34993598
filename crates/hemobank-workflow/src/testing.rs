// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use hemobank_core::{
    ActivityLog, ActivityRecord, AdapterType, BloodType, BloodUnit, ComponentType, DiscardDetails,
    DiscardReceipt, DiscardRecord, HealthStatus, HemoError, NewUnit, PluginAdapter,
    ReleaseDetails, ReleaseReceipt, ReleaseRecord, RhFactor, Transition, UnitEdit, UnitPage,
    UnitQuery, UnitRegistry, UnitStatus,
};

pub(crate) fn unit(serial: &str, component: ComponentType, status: UnitStatus) -> BloodUnit {
    BloodUnit {
        serial_id: serial.to_string(),
        component,
        blood_type: BloodType::O,
        rh_factor: RhFactor::Positive,
        volume_ml: 450,
        collection_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
        expiration_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
        status,
        created_at: String::new(),
        modified_at: String::new(),
    }
}

fn offline() -> HemoError {
    HemoError::storage(std::io::Error::other("registry offline"))
}

fn unsupported() -> HemoError {
    HemoError::Internal("not supported by the stub registry".into())
}

/// Registry backed by a map. Supports lookups, transfers, and restores.
#[derive(Default)]
pub(crate) struct StubRegistry {
    units: Mutex<HashMap<String, BloodUnit>>,
    lookups: Arc<AtomicUsize>,
    failing: bool,
    lookup_delay: Option<Duration>,
}

impl StubRegistry {
    pub(crate) fn with_units(units: Vec<BloodUnit>) -> Self {
        let map = units.into_iter().map(|u| (u.serial_id.clone(), u)).collect();
        Self {
            units: Mutex::new(map),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(crate) fn slow(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub(crate) fn lookup_calls(&self) -> Arc<AtomicUsize> {
        self.lookups.clone()
    }

    pub(crate) fn status_of(&self, serial: &str) -> Option<UnitStatus> {
        self.units.lock().ok()?.get(serial).map(|u| u.status)
    }

    fn transition(
        &self,
        component: ComponentType,
        serial_ids: &[String],
        transition: Transition,
        required: Option<UnitStatus>,
    ) -> Result<usize, HemoError> {
        if self.failing {
            return Err(offline());
        }
        let mut units = self.units.lock().map_err(|_| unsupported())?;
        let mut targets = Vec::new();
        for serial in serial_ids {
            let unit = units.get(serial).ok_or_else(|| HemoError::NotFound {
                serial_id: serial.clone(),
            })?;
            if unit.component != component {
                return Err(HemoError::CategoryMismatch {
                    serial_id: serial.clone(),
                    expected: component,
                    actual: unit.component,
                });
            }
            if let Some(from) = required {
                if unit.status != from {
                    return Err(HemoError::Precondition {
                        serial_id: serial.clone(),
                        status: unit.status,
                        action: transition.to_string(),
                    });
                }
            }
            targets.push((serial.clone(), transition.check(serial, unit.status)?));
        }
        for (serial, status) in &targets {
            if let Some(unit) = units.get_mut(serial) {
                unit.status = *status;
            }
        }
        Ok(targets.len())
    }
}

#[async_trait]
impl PluginAdapter for StubRegistry {
    fn name(&self) -> &str {
        "stub"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 0, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Registry
    }

    async fn health_check(&self) -> Result<HealthStatus, HemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HemoError> {
        Ok(())
    }
}

#[async_trait]
impl UnitRegistry for StubRegistry {
    async fn initialize(&self) -> Result<(), HemoError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), HemoError> {
        Ok(())
    }

    async fn lookup_by_serial(&self, serial_id: &str) -> Result<Option<BloodUnit>, HemoError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(offline());
        }
        let units = self.units.lock().map_err(|_| unsupported())?;
        Ok(units.get(serial_id).cloned())
    }

    async fn insert_units(&self, _: ComponentType, _: &[NewUnit]) -> Result<Vec<String>, HemoError> {
        Err(unsupported())
    }

    async fn update_unit(&self, _: ComponentType, _: &str, _: &UnitEdit) -> Result<BloodUnit, HemoError> {
        Err(unsupported())
    }

    async fn delete_units(&self, _: ComponentType, _: &[String]) -> Result<usize, HemoError> {
        Err(unsupported())
    }

    async fn search_units(&self, _: &UnitQuery) -> Result<UnitPage, HemoError> {
        Err(unsupported())
    }

    async fn release_units(
        &self,
        _: ComponentType,
        _: &[String],
        _: &ReleaseDetails,
    ) -> Result<ReleaseReceipt, HemoError> {
        if self.failing {
            return Err(offline());
        }
        Err(unsupported())
    }

    async fn transfer_to_non_conforming(
        &self,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<usize, HemoError> {
        self.transition(component, serial_ids, Transition::Transfer, None)
    }

    async fn discard_non_conforming(
        &self,
        _: ComponentType,
        _: &[String],
        _: &DiscardDetails,
    ) -> Result<DiscardReceipt, HemoError> {
        Err(unsupported())
    }

    async fn restore_units(
        &self,
        component: ComponentType,
        from: UnitStatus,
        serial_ids: &[String],
    ) -> Result<usize, HemoError> {
        self.transition(component, serial_ids, Transition::Restore, Some(from))
    }

    async fn get_release(&self, _: &str) -> Result<Option<ReleaseRecord>, HemoError> {
        Ok(None)
    }

    async fn list_releases(&self, _: ComponentType) -> Result<Vec<ReleaseRecord>, HemoError> {
        Ok(Vec::new())
    }

    async fn list_discards(&self, _: ComponentType) -> Result<Vec<DiscardRecord>, HemoError> {
        Ok(Vec::new())
    }
}

/// Activity sink that keeps records in memory, or rejects every append.
#[derive(Default)]
pub(crate) struct RecordingLog {
    records: Mutex<Vec<ActivityRecord>>,
    failing: bool,
}

impl RecordingLog {
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(crate) fn records(&self) -> Vec<ActivityRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PluginAdapter for RecordingLog {
    fn name(&self) -> &str {
        "recording"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 0, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ActivityLog
    }

    async fn health_check(&self) -> Result<HealthStatus, HemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HemoError> {
        Ok(())
    }
}

#[async_trait]
impl ActivityLog for RecordingLog {
    async fn append(&self, record: &ActivityRecord) -> Result<(), HemoError> {
        if self.failing {
            return Err(offline());
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>, HemoError> {
        let mut records = self.records();
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}
