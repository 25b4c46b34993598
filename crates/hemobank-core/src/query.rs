// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inventory search filters and paging.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{BloodType, ComponentType, RhFactor, UnitStatus};
use crate::unit::BloodUnit;

/// Column to order search results by.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    SerialId,
    CollectionDate,
    ExpirationDate,
    Volume,
}

/// Filter, sort, and page selection for [`crate::UnitRegistry::search_units`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitQuery {
    pub component: Option<ComponentType>,
    pub status: Option<UnitStatus>,
    pub blood_type: Option<BloodType>,
    pub rh_factor: Option<RhFactor>,
    /// Case-insensitive substring match on the serial ID.
    pub serial_contains: Option<String>,
    /// Only units expiring strictly before this date.
    pub expiring_before: Option<NaiveDate>,
    pub sort: SortKey,
    pub descending: bool,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for UnitQuery {
    fn default() -> Self {
        Self {
            component: None,
            status: None,
            blood_type: None,
            rh_factor: None,
            serial_contains: None,
            expiring_before: None,
            sort: SortKey::default(),
            descending: false,
            page: 1,
            page_size: 25,
        }
    }
}

impl UnitQuery {
    pub fn for_component(component: ComponentType) -> Self {
        Self {
            component: Some(component),
            ..Self::default()
        }
    }

    /// Row offset of the first result on the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size.max(1))
    }
}

/// One page of search results plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPage {
    pub units: Vec<BloodUnit>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl UnitPage {
    pub fn total_pages(&self) -> u64 {
        let size = u64::from(self.page_size.max(1));
        self.total.div_ceil(size)
    }
}
