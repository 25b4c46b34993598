// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared workflow context: collaborators, settings, deadlines, and activity
//! emission.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use hemobank_core::{ActivityLog, ActivityRecord, HemoError, UnitRegistry};

use crate::resolution::SerialResolver;
use crate::settings::WorkflowSettings;

/// Run `fut` under `limit`, mapping expiry to [`HemoError::Timeout`].
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, HemoError>
where
    F: Future<Output = Result<T, HemoError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_elapsed) => {
            warn!(timeout_ms = limit.as_millis() as u64, "registry request timed out");
            Err(HemoError::Timeout { duration: limit })
        }
    }
}

/// The inventory engine: one registry, one activity sink, one settings table,
/// shared by every workflow.
///
/// Cheap to clone; workflows hold their own copy.
#[derive(Clone)]
pub struct InventoryEngine {
    registry: Arc<dyn UnitRegistry>,
    activity: Arc<dyn ActivityLog>,
    settings: WorkflowSettings,
}

impl InventoryEngine {
    pub fn new(
        registry: Arc<dyn UnitRegistry>,
        activity: Arc<dyn ActivityLog>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            registry,
            activity,
            settings,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<dyn UnitRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> SerialResolver {
        SerialResolver::new(self.registry.clone(), self.settings.request_timeout)
    }

    /// Bound a registry call by the configured request timeout.
    pub(crate) async fn bounded<T, F>(&self, fut: F) -> Result<T, HemoError>
    where
        F: Future<Output = Result<T, HemoError>>,
    {
        with_deadline(self.settings.request_timeout, fut).await
    }

    /// Append an activity record for a mutation that already committed.
    ///
    /// A sink failure is logged and swallowed: the registry change stands.
    pub(crate) async fn emit(&self, record: ActivityRecord) {
        let action = record.action_type;
        let entity_id = record.entity_id.clone();
        match self.bounded(self.activity.append(&record)).await {
            Ok(()) => debug!(action = %action, entity_id = %entity_id, "activity recorded"),
            Err(e) => warn!(
                action = %action,
                entity_id = %entity_id,
                error = %e,
                "activity record not written"
            ),
        }
    }

    /// Most recent activity records first.
    pub async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>, HemoError> {
        self.bounded(self.activity.recent(limit)).await
    }
}

/// `"{n} {noun}"` with a naive plural.
pub(crate) fn count_noun(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
