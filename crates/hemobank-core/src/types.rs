// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common enums and identity types used across the registry and workflows.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Blood component category. One generic engine serves all three.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum ComponentType {
    #[strum(serialize = "RBC")]
    #[serde(rename = "RBC")]
    Rbc,
    Plasma,
    Platelet,
}

impl ComponentType {
    /// Lowercase identifier used in entity types and storage columns.
    pub fn slug(self) -> &'static str {
        match self {
            ComponentType::Rbc => "rbc",
            ComponentType::Plasma => "plasma",
            ComponentType::Platelet => "platelet",
        }
    }
}

/// ABO blood group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum BloodType {
    O,
    A,
    B,
    AB,
}

/// Rh(D) factor, written as `+` or `-`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum RhFactor {
    #[strum(to_string = "+", serialize = "pos", serialize = "positive")]
    #[serde(rename = "+")]
    Positive,
    #[strum(to_string = "-", serialize = "neg", serialize = "negative")]
    #[serde(rename = "-")]
    Negative,
}

/// Lifecycle status of a single unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Stored,
    NonConforming,
    Released,
    Discarded,
}

/// Kind of state-changing operation recorded in the activity log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Add,
    Update,
    Delete,
    Release,
    Discard,
    Approve,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Registry,
    ActivityLog,
}
