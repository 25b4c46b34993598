// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Hemobank inventory engine.
//!
//! Domain types for blood units and their records, the per-unit lifecycle
//! state machine, the shared error type, and the traits that storage
//! backends implement.

pub mod error;
pub mod lifecycle;
pub mod query;
pub mod records;
pub mod traits;
pub mod types;
pub mod unit;

pub use error::{ErrorKind, HemoError};
pub use lifecycle::Transition;
pub use query::{SortKey, UnitPage, UnitQuery};
pub use records::{
    ActivityRecord, DiscardDetails, DiscardReceipt, DiscardRecord, ReleaseDetails,
    ReleaseReceipt, ReleaseRecord,
};
pub use traits::{ActivityLog, PluginAdapter, UnitRegistry};
pub use types::{ActionType, AdapterType, BloodType, ComponentType, HealthStatus, RhFactor, UnitStatus};
pub use unit::{BloodUnit, NewUnit, ShelfLifePolicy, UnitEdit};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_unit_registry<T: UnitRegistry>() {}
        fn _assert_activity_log<T: ActivityLog>() {}
    }

    #[test]
    fn adapter_type_display_round_trips() {
        use std::str::FromStr;

        for variant in [AdapterType::Registry, AdapterType::ActivityLog] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        assert_eq!(HealthStatus::Healthy, HealthStatus::Healthy);
        assert_ne!(HealthStatus::Degraded("slow".into()), HealthStatus::Healthy);
    }
}
