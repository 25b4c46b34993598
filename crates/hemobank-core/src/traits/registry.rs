// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Unit Registry contract.

use async_trait::async_trait;

use crate::error::HemoError;
use crate::query::{UnitPage, UnitQuery};
use crate::records::{DiscardDetails, DiscardReceipt, DiscardRecord, ReleaseDetails, ReleaseReceipt, ReleaseRecord};
use crate::traits::adapter::PluginAdapter;
use crate::types::{ComponentType, UnitStatus};
use crate::unit::{BloodUnit, NewUnit, UnitEdit};

/// Durable store of blood units.
///
/// Every batch mutation is all-or-nothing: if any serial in the batch is
/// missing, belongs to another component, or is in the wrong status, the
/// call fails and no unit changes. Implementations report those rejections
/// as [`HemoError::NotFound`], [`HemoError::CategoryMismatch`], and
/// [`HemoError::Precondition`] respectively.
#[async_trait]
pub trait UnitRegistry: PluginAdapter {
    /// Opens the backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), HemoError>;

    /// Flushes pending writes and releases the backend.
    async fn close(&self) -> Result<(), HemoError>;

    /// Finds a unit by serial across every component and status.
    async fn lookup_by_serial(&self, serial_id: &str) -> Result<Option<BloodUnit>, HemoError>;

    /// Inserts a batch of new `Stored` units. Returns their serials in order.
    async fn insert_units(
        &self,
        component: ComponentType,
        units: &[NewUnit],
    ) -> Result<Vec<String>, HemoError>;

    /// Applies an edit to a `Stored` unit and returns the updated record.
    async fn update_unit(
        &self,
        component: ComponentType,
        serial_id: &str,
        edit: &UnitEdit,
    ) -> Result<BloodUnit, HemoError>;

    /// Removes `Stored` units. Returns the number deleted.
    async fn delete_units(
        &self,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<usize, HemoError>;

    async fn search_units(&self, query: &UnitQuery) -> Result<UnitPage, HemoError>;

    /// `Stored -> Released` plus one invoice referencing every serial.
    async fn release_units(
        &self,
        component: ComponentType,
        serial_ids: &[String],
        details: &ReleaseDetails,
    ) -> Result<ReleaseReceipt, HemoError>;

    /// `Stored -> NonConforming`. Returns the number transferred.
    async fn transfer_to_non_conforming(
        &self,
        component: ComponentType,
        serial_ids: &[String],
    ) -> Result<usize, HemoError>;

    /// `NonConforming -> Discarded` plus one disposal record.
    async fn discard_non_conforming(
        &self,
        component: ComponentType,
        serial_ids: &[String],
        details: &DiscardDetails,
    ) -> Result<DiscardReceipt, HemoError>;

    /// `from -> Stored`, where `from` is `Released` or `NonConforming`.
    async fn restore_units(
        &self,
        component: ComponentType,
        from: UnitStatus,
        serial_ids: &[String],
    ) -> Result<usize, HemoError>;

    async fn get_release(&self, invoice_id: &str) -> Result<Option<ReleaseRecord>, HemoError>;

    /// Invoices for a component, newest first.
    async fn list_releases(&self, component: ComponentType) -> Result<Vec<ReleaseRecord>, HemoError>;

    /// Disposal records for a component, newest first.
    async fn list_discards(&self, component: ComponentType) -> Result<Vec<DiscardRecord>, HemoError>;
}
