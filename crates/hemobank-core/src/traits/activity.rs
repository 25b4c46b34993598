// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activity log sink.

use async_trait::async_trait;

use crate::error::HemoError;
use crate::records::ActivityRecord;
use crate::traits::adapter::PluginAdapter;

/// Append-only audit trail of state-changing operations.
#[async_trait]
pub trait ActivityLog: PluginAdapter {
    async fn append(&self, record: &ActivityRecord) -> Result<(), HemoError>;

    /// Most recent records first.
    async fn recent(&self, limit: usize) -> Result<Vec<ActivityRecord>, HemoError>;
}
