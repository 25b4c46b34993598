// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blood unit read and write models.
//!
//! `BloodUnit` is what the registry hands back. `NewUnit` and `UnitEdit` are
//! the only ways to write one, and both derive the expiration date from a
//! [`ShelfLifePolicy`]; there is no setter for it.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::HemoError;
use crate::types::{BloodType, ComponentType, RhFactor, UnitStatus};

/// A unit as persisted in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodUnit {
    pub serial_id: String,
    pub component: ComponentType,
    pub blood_type: BloodType,
    pub rh_factor: RhFactor,
    pub volume_ml: u32,
    pub collection_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub status: UnitStatus,
    pub created_at: String,
    pub modified_at: String,
}

impl BloodUnit {
    /// ABO group with Rh suffix, e.g. `AB-`.
    pub fn blood_group(&self) -> String {
        format!("{}{}", self.blood_type, self.rh_factor)
    }

    /// Whether the unit has expired as of `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date < today
    }
}

/// Shelf life in days per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfLifePolicy {
    pub rbc_days: u32,
    pub plasma_days: u32,
    pub platelet_days: u32,
}

impl Default for ShelfLifePolicy {
    fn default() -> Self {
        Self {
            rbc_days: 365,
            plasma_days: 365,
            platelet_days: 5,
        }
    }
}

impl ShelfLifePolicy {
    pub fn shelf_life_days(&self, component: ComponentType) -> u32 {
        match component {
            ComponentType::Rbc => self.rbc_days,
            ComponentType::Plasma => self.plasma_days,
            ComponentType::Platelet => self.platelet_days,
        }
    }

    /// `collection_date + shelf_life_days(component)`.
    pub fn expiration_for(
        &self,
        component: ComponentType,
        collection_date: NaiveDate,
    ) -> Result<NaiveDate, HemoError> {
        let days = u64::from(self.shelf_life_days(component));
        collection_date
            .checked_add_days(Days::new(days))
            .ok_or_else(|| {
                HemoError::Validation(format!(
                    "collection date {collection_date} is out of range"
                ))
            })
    }
}

/// A validated unit ready for insertion. Status is always `Stored`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnit {
    serial_id: String,
    blood_type: BloodType,
    rh_factor: RhFactor,
    volume_ml: u32,
    collection_date: NaiveDate,
    expiration_date: NaiveDate,
}

impl NewUnit {
    pub fn new(
        policy: &ShelfLifePolicy,
        component: ComponentType,
        serial_id: &str,
        blood_type: BloodType,
        rh_factor: RhFactor,
        volume_ml: u32,
        collection_date: NaiveDate,
    ) -> Result<Self, HemoError> {
        let serial_id = serial_id.trim();
        if serial_id.is_empty() {
            return Err(HemoError::Validation("serial ID is required".into()));
        }
        if volume_ml == 0 {
            return Err(HemoError::Validation(format!(
                "volume for {serial_id} must be greater than zero"
            )));
        }
        Ok(Self {
            serial_id: serial_id.to_string(),
            blood_type,
            rh_factor,
            volume_ml,
            collection_date,
            expiration_date: policy.expiration_for(component, collection_date)?,
        })
    }

    pub fn serial_id(&self) -> &str {
        &self.serial_id
    }

    pub fn blood_type(&self) -> BloodType {
        self.blood_type
    }

    pub fn rh_factor(&self) -> RhFactor {
        self.rh_factor
    }

    pub fn volume_ml(&self) -> u32 {
        self.volume_ml
    }

    pub fn collection_date(&self) -> NaiveDate {
        self.collection_date
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }
}

/// A partial update to a stored unit.
///
/// Changing the collection date goes through [`UnitEdit::collection_date`],
/// which recomputes the expiration date in the same step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitEdit {
    blood_type: Option<BloodType>,
    rh_factor: Option<RhFactor>,
    volume_ml: Option<u32>,
    dates: Option<(NaiveDate, NaiveDate)>,
}

impl UnitEdit {
    pub fn blood_type(mut self, blood_type: BloodType) -> Self {
        self.blood_type = Some(blood_type);
        self
    }

    pub fn rh_factor(mut self, rh_factor: RhFactor) -> Self {
        self.rh_factor = Some(rh_factor);
        self
    }

    pub fn volume_ml(mut self, volume_ml: u32) -> Result<Self, HemoError> {
        if volume_ml == 0 {
            return Err(HemoError::Validation(
                "volume must be greater than zero".into(),
            ));
        }
        self.volume_ml = Some(volume_ml);
        Ok(self)
    }

    pub fn collection_date(
        mut self,
        policy: &ShelfLifePolicy,
        component: ComponentType,
        collection_date: NaiveDate,
    ) -> Result<Self, HemoError> {
        let expiration = policy.expiration_for(component, collection_date)?;
        self.dates = Some((collection_date, expiration));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.blood_type.is_none()
            && self.rh_factor.is_none()
            && self.volume_ml.is_none()
            && self.dates.is_none()
    }

    pub fn new_blood_type(&self) -> Option<BloodType> {
        self.blood_type
    }

    pub fn new_rh_factor(&self) -> Option<RhFactor> {
        self.rh_factor
    }

    pub fn new_volume_ml(&self) -> Option<u32> {
        self.volume_ml
    }

    /// New `(collection_date, expiration_date)` pair, if the date changed.
    pub fn new_dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.dates
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn rbc_collected_new_year_expires_next_new_year() {
        let policy = ShelfLifePolicy::default();
        let unit = NewUnit::new(
            &policy,
            ComponentType::Rbc,
            " RBC001 ",
            BloodType::O,
            RhFactor::Positive,
            450,
            date("2025-01-01"),
        )
        .unwrap();
        assert_eq!(unit.serial_id(), "RBC001");
        assert_eq!(unit.expiration_date(), date("2026-01-01"));
    }

    #[test]
    fn platelet_uses_its_own_shelf_life() {
        let policy = ShelfLifePolicy::default();
        let exp = policy
            .expiration_for(ComponentType::Platelet, date("2025-03-01"))
            .unwrap();
        assert_eq!(exp, date("2025-03-06"));
    }

    #[test]
    fn empty_serial_is_rejected() {
        let err = NewUnit::new(
            &ShelfLifePolicy::default(),
            ComponentType::Plasma,
            "   ",
            BloodType::A,
            RhFactor::Negative,
            200,
            date("2025-01-01"),
        )
        .unwrap_err();
        assert!(matches!(err, HemoError::Validation(_)));
    }

    #[test]
    fn zero_volume_is_rejected() {
        let err = NewUnit::new(
            &ShelfLifePolicy::default(),
            ComponentType::Plasma,
            "P1",
            BloodType::A,
            RhFactor::Negative,
            0,
            date("2025-01-01"),
        )
        .unwrap_err();
        assert!(matches!(err, HemoError::Validation(_)));
    }

    #[test]
    fn edit_recomputes_expiration_with_collection_date() {
        let policy = ShelfLifePolicy::default();
        let edit = UnitEdit::default()
            .collection_date(&policy, ComponentType::Plasma, date("2024-02-29"))
            .unwrap();
        assert_eq!(
            edit.new_dates(),
            Some((date("2024-02-29"), date("2025-02-28")))
        );
        assert!(!edit.is_empty());
        assert!(UnitEdit::default().is_empty());
    }

    #[test]
    fn blood_group_formats_type_and_rh() {
        let unit = BloodUnit {
            serial_id: "X".into(),
            component: ComponentType::Rbc,
            blood_type: BloodType::AB,
            rh_factor: RhFactor::Negative,
            volume_ml: 300,
            collection_date: date("2025-01-01"),
            expiration_date: date("2026-01-01"),
            status: UnitStatus::Stored,
            created_at: String::new(),
            modified_at: String::new(),
        };
        assert_eq!(unit.blood_group(), "AB-");
        assert!(unit.is_expired(date("2026-01-02")));
        assert!(!unit.is_expired(date("2026-01-01")));
    }

    proptest! {
        #[test]
        fn expiration_is_collection_plus_shelf_life(
            offset in 0i64..40_000,
            rbc in 1u32..1000,
            plasma in 1u32..1000,
            platelet in 1u32..30,
            which in 0usize..3,
        ) {
            let policy = ShelfLifePolicy { rbc_days: rbc, plasma_days: plasma, platelet_days: platelet };
            let component = [ComponentType::Rbc, ComponentType::Plasma, ComponentType::Platelet][which];
            let collected = date("1990-01-01") + chrono::Duration::days(offset);
            let unit = NewUnit::new(&policy, component, "S", BloodType::B, RhFactor::Positive, 1, collected).unwrap();
            let expected = collected + chrono::Duration::days(i64::from(policy.shelf_life_days(component)));
            prop_assert_eq!(unit.expiration_date(), expected);
        }
    }
}
