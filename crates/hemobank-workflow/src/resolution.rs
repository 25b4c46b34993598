// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serial resolution against a component and lifecycle bucket.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use hemobank_core::{BloodUnit, ComponentType, HemoError, UnitRegistry, UnitStatus};

use crate::engine::with_deadline;

/// What a lookup is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupTarget {
    pub component: ComponentType,
    pub required_status: UnitStatus,
}

impl LookupTarget {
    pub fn new(component: ComponentType, required_status: UnitStatus) -> Self {
        Self {
            component,
            required_status,
        }
    }

    /// Units still in storage, as release and transfer need.
    pub fn stored(component: ComponentType) -> Self {
        Self::new(component, UnitStatus::Stored)
    }
}

/// Outcome of resolving one serial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
    /// Blank input. No lookup was made.
    Skipped,
    Found(BloodUnit),
    /// The serial exists under another component.
    FoundWrongCategory {
        serial_id: String,
        actual: ComponentType,
    },
    /// Right component, wrong lifecycle bucket.
    WrongStatus(BloodUnit),
    NotFound,
}

impl Resolution {
    /// Classify a registry hit (or miss) against `target`.
    pub fn classify(serial_id: &str, found: Option<BloodUnit>, target: LookupTarget) -> Self {
        match found {
            None => Resolution::NotFound,
            Some(unit) if unit.component != target.component => Resolution::FoundWrongCategory {
                serial_id: serial_id.to_string(),
                actual: unit.component,
            },
            Some(unit) if unit.status != target.required_status => Resolution::WrongStatus(unit),
            Some(unit) => Resolution::Found(unit),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    /// The resolved unit, only when it is usable for the target.
    pub fn unit(&self) -> Option<&BloodUnit> {
        match self {
            Resolution::Found(unit) => Some(unit),
            _ => None,
        }
    }

    /// The error a caller sees for an unusable resolution, or `None` for
    /// `Found`.
    pub fn to_error(&self, serial_id: &str, target: LookupTarget) -> Option<HemoError> {
        match self {
            Resolution::Found(_) => None,
            Resolution::Skipped => Some(HemoError::Validation("serial ID is required".into())),
            Resolution::FoundWrongCategory { serial_id, actual } => Some(HemoError::CategoryMismatch {
                serial_id: serial_id.clone(),
                expected: target.component,
                actual: *actual,
            }),
            Resolution::WrongStatus(unit) => Some(HemoError::Precondition {
                serial_id: unit.serial_id.clone(),
                status: unit.status,
                action: "select".into(),
            }),
            Resolution::NotFound => Some(HemoError::NotFound {
                serial_id: serial_id.to_string(),
            }),
        }
    }

    /// Convert into the usable unit or the matching error.
    pub fn into_unit(self, serial_id: &str, target: LookupTarget) -> Result<BloodUnit, HemoError> {
        match self.to_error(serial_id, target) {
            Some(err) => Err(err),
            None => match self {
                Resolution::Found(unit) => Ok(unit),
                _ => Err(HemoError::Internal("unresolved serial".into())),
            },
        }
    }
}

/// Resolves serials through the registry under a deadline.
#[derive(Clone)]
pub struct SerialResolver {
    registry: Arc<dyn UnitRegistry>,
    timeout: Duration,
}

impl SerialResolver {
    pub fn new(registry: Arc<dyn UnitRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Pure read. Registry failures and timeouts are returned as errors and
    /// never reported as `NotFound`.
    pub async fn resolve(&self, serial_id: &str, target: LookupTarget) -> Result<Resolution, HemoError> {
        let serial_id = serial_id.trim();
        if serial_id.is_empty() {
            return Ok(Resolution::Skipped);
        }
        let found = with_deadline(self.timeout, self.registry.lookup_by_serial(serial_id)).await?;
        let resolution = Resolution::classify(serial_id, found, target);
        debug!(
            serial_id,
            component = %target.component,
            found = resolution.is_found(),
            "serial resolved"
        );
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::testing::{unit, StubRegistry};

    fn resolver(registry: StubRegistry) -> SerialResolver {
        SerialResolver::new(Arc::new(registry), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn blank_input_skips_the_lookup() {
        let registry = StubRegistry::default();
        let calls = registry.lookup_calls();
        let r = resolver(registry)
            .resolve("   ", LookupTarget::stored(ComponentType::Rbc))
            .await
            .unwrap();
        assert_eq!(r, Resolution::Skipped);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plasma_serial_looked_up_as_platelet_is_wrong_category() {
        let registry = StubRegistry::with_units(vec![unit("PLASMA01", ComponentType::Plasma, UnitStatus::Stored)]);
        let target = LookupTarget::stored(ComponentType::Platelet);
        let r = resolver(registry).resolve("PLASMA01", target).await.unwrap();
        assert_eq!(
            r,
            Resolution::FoundWrongCategory {
                serial_id: "PLASMA01".into(),
                actual: ComponentType::Plasma
            }
        );
        let err = r.into_unit("PLASMA01", target).unwrap_err();
        assert_eq!(err.kind(), hemobank_core::ErrorKind::CategoryMismatch);
        assert_eq!(err.to_string(), "No Platelet stock found with serial ID: PLASMA01");
    }

    #[tokio::test]
    async fn stored_unit_looked_up_for_discard_is_wrong_status() {
        let registry = StubRegistry::with_units(vec![unit("RBC001", ComponentType::Rbc, UnitStatus::Stored)]);
        let target = LookupTarget::new(ComponentType::Rbc, UnitStatus::NonConforming);
        let r = resolver(registry).resolve(" RBC001 ", target).await.unwrap();
        assert!(matches!(r, Resolution::WrongStatus(_)));
        assert!(matches!(
            r.to_error("RBC001", target),
            Some(HemoError::Precondition { status: UnitStatus::Stored, .. })
        ));
    }

    #[tokio::test]
    async fn registry_failure_is_not_not_found() {
        let registry = StubRegistry::failing();
        let err = resolver(registry)
            .resolve("RBC001", LookupTarget::stored(ComponentType::Rbc))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), hemobank_core::ErrorKind::Registry);
    }

    proptest! {
        #[test]
        fn absent_serials_never_resolve_as_found(serial in "[A-Z0-9]{1,12}") {
            let registry = StubRegistry::with_units(vec![unit("KNOWN-1", ComponentType::Rbc, UnitStatus::Stored)]);
            prop_assume!(serial != "KNOWN-1");
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let r = rt
                .block_on(resolver(registry).resolve(&serial, LookupTarget::stored(ComponentType::Rbc)))
                .unwrap();
            prop_assert_eq!(r, Resolution::NotFound);
        }
    }
}
