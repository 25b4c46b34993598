// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line argument types that do not map onto a single domain value.

use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveTime};
use clap::Args;

use hemobank_core::{
    BloodType, ComponentType, DiscardDetails, ReleaseDetails, RhFactor, SortKey, UnitQuery,
    UnitStatus,
};
use hemobank_workflow::UnitChanges;

/// One unit to receive, written `SERIAL:GROUP:COLLECTED[:VOLUME]`,
/// e.g. `RBC001:O+:2025-01-01:450`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub serial_id: String,
    pub blood_type: BloodType,
    pub rh_factor: RhFactor,
    pub collection_date: NaiveDate,
    /// Falls back to the configured default volume.
    pub volume_ml: Option<u32>,
}

impl FromStr for UnitSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(format!(
                "expected SERIAL:GROUP:COLLECTED[:VOLUME], got `{s}`"
            ));
        }
        let serial_id = parts[0];
        if serial_id.is_empty() {
            return Err("serial ID is required".into());
        }
        let (blood_type, rh_factor) = parse_group(parts[1])?;
        let collection_date = NaiveDate::parse_from_str(parts[2], "%Y-%m-%d")
            .map_err(|e| format!("invalid collection date `{}`: {e}", parts[2]))?;
        let volume_ml = match parts.get(3) {
            Some(v) if !v.is_empty() => Some(
                v.parse::<u32>()
                    .map_err(|e| format!("invalid volume `{v}`: {e}"))?,
            ),
            _ => None,
        };
        Ok(Self {
            serial_id: serial_id.to_string(),
            blood_type,
            rh_factor,
            collection_date,
            volume_ml,
        })
    }
}

/// Split `AB-` into its ABO group and Rh factor.
fn parse_group(group: &str) -> Result<(BloodType, RhFactor), String> {
    let rh = match group.chars().last() {
        Some('+') => RhFactor::Positive,
        Some('-') => RhFactor::Negative,
        _ => return Err(format!("blood group `{group}` must end in + or -")),
    };
    let abo = &group[..group.len() - 1];
    let blood_type =
        BloodType::from_str(abo).map_err(|_| format!("unknown ABO group `{abo}`"))?;
    Ok((blood_type, rh))
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub component: Option<ComponentType>,
    #[arg(long)]
    pub status: Option<UnitStatus>,
    #[arg(long)]
    pub blood_type: Option<BloodType>,
    #[arg(long)]
    pub rh: Option<RhFactor>,
    /// Substring of the serial ID.
    #[arg(long)]
    pub serial: Option<String>,
    /// Only units expiring strictly before this date.
    #[arg(long)]
    pub expiring_before: Option<NaiveDate>,
    /// serial_id, collection_date, expiration_date, or volume.
    #[arg(long, default_value = "serial_id")]
    pub sort: SortKey,
    #[arg(long)]
    pub desc: bool,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 25)]
    pub page_size: u32,
}

impl ListArgs {
    pub fn to_query(&self) -> UnitQuery {
        UnitQuery {
            component: self.component,
            status: self.status,
            blood_type: self.blood_type,
            rh_factor: self.rh,
            serial_contains: self.serial.clone(),
            expiring_before: self.expiring_before,
            sort: self.sort,
            descending: self.desc,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub serial: String,
    #[arg(long)]
    pub blood_type: Option<BloodType>,
    #[arg(long)]
    pub rh: Option<RhFactor>,
    #[arg(long)]
    pub volume: Option<u32>,
    /// New collection date. The expiration date is recomputed.
    #[arg(long)]
    pub collected: Option<NaiveDate>,
}

impl EditArgs {
    pub fn changes(&self) -> UnitChanges {
        UnitChanges {
            blood_type: self.blood_type,
            rh_factor: self.rh,
            volume_ml: self.volume,
            collection_date: self.collected,
        }
    }
}

/// Destination of a release.
#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    #[arg(long)]
    pub facility: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    /// Facility classification, e.g. Hospital.
    #[arg(long)]
    pub classification: Option<String>,
    #[arg(long)]
    pub recipient: Option<String>,
    #[arg(long)]
    pub designation: Option<String>,
    /// Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub condition: Option<String>,
    #[arg(long)]
    pub reference: Option<String>,
    /// Defaults to the operator.
    #[arg(long)]
    pub released_by: Option<String>,
}

impl ReleaseArgs {
    /// Overlay the supplied flags on `details`.
    pub fn apply(self, details: &mut ReleaseDetails) {
        overlay(&mut details.receiving_facility, self.facility);
        overlay(&mut details.address, self.address);
        overlay(&mut details.contact_number, self.contact);
        overlay(&mut details.classification, self.classification);
        overlay(&mut details.authorized_recipient, self.recipient);
        overlay(&mut details.recipient_designation, self.designation);
        overlay(&mut details.condition_upon_release, self.condition);
        overlay(&mut details.released_by, self.released_by);
        details.date_of_release = Some(self.date.unwrap_or_else(|| Local::now().date_naive()));
        if self.reference.is_some() {
            details.request_reference = self.reference;
        }
    }
}

/// Disposal record for a discard.
#[derive(Args, Debug, Default)]
pub struct DiscardArgs {
    /// Defaults to the operator.
    #[arg(long)]
    pub personnel: Option<String>,
    #[arg(long)]
    pub reason: Option<String>,
    #[arg(long)]
    pub authorized_by: Option<String>,
    /// Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// HH:MM:SS, defaults to now.
    #[arg(long)]
    pub time: Option<NaiveTime>,
    #[arg(long)]
    pub method: Option<String>,
    #[arg(long)]
    pub remarks: Option<String>,
}

impl DiscardArgs {
    pub fn into_details(self, operator: &str) -> DiscardDetails {
        let now = Local::now();
        DiscardDetails {
            responsible_personnel: self.personnel.unwrap_or_else(|| operator.to_string()),
            reason_for_discarding: self.reason.unwrap_or_default(),
            authorized_by: self.authorized_by.unwrap_or_default(),
            date_of_discard: Some(self.date.unwrap_or_else(|| now.date_naive())),
            time_of_discard: Some(self.time.unwrap_or_else(|| now.time())),
            method_of_disposal: self.method.unwrap_or_default(),
            remarks: self.remarks.unwrap_or_default(),
        }
    }
}

fn overlay(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_spec_with_volume() {
        let spec: UnitSpec = "RBC001:O+:2025-01-01:450".parse().unwrap();
        assert_eq!(spec.serial_id, "RBC001");
        assert_eq!(spec.blood_type, BloodType::O);
        assert_eq!(spec.rh_factor, RhFactor::Positive);
        assert_eq!(spec.collection_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(spec.volume_ml, Some(450));
    }

    #[test]
    fn unit_spec_without_volume_uses_default_later() {
        let spec: UnitSpec = "PLT9:AB-:2025-03-15".parse().unwrap();
        assert_eq!(spec.blood_type, BloodType::AB);
        assert_eq!(spec.rh_factor, RhFactor::Negative);
        assert_eq!(spec.volume_ml, None);
    }

    #[test]
    fn unit_spec_rejects_missing_rh() {
        let err = "RBC001:O:2025-01-01".parse::<UnitSpec>().unwrap_err();
        assert!(err.contains("must end in + or -"));
    }

    #[test]
    fn unit_spec_rejects_bad_date() {
        let err = "RBC001:A+:2025-13-01".parse::<UnitSpec>().unwrap_err();
        assert!(err.contains("invalid collection date"));
    }

    #[test]
    fn unit_spec_rejects_wrong_arity() {
        assert!("RBC001".parse::<UnitSpec>().is_err());
        assert!("A:B+:2025-01-01:1:2".parse::<UnitSpec>().is_err());
    }

    #[test]
    fn release_flags_overlay_defaults() {
        let mut details = ReleaseDetails {
            released_by: "operator".into(),
            ..ReleaseDetails::default()
        };
        ReleaseArgs {
            facility: Some("General Hospital".into()),
            date: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..ReleaseArgs::default()
        }
        .apply(&mut details);
        assert_eq!(details.receiving_facility, "General Hospital");
        assert_eq!(details.released_by, "operator");
        assert_eq!(details.date_of_release, NaiveDate::from_ymd_opt(2025, 2, 1));
        assert!(details.request_reference.is_none());
    }

    #[test]
    fn discard_flags_default_personnel_to_operator() {
        let details = DiscardArgs {
            reason: Some("Expired".into()),
            ..DiscardArgs::default()
        }
        .into_details("tech.reyes");
        assert_eq!(details.responsible_personnel, "tech.reyes");
        assert!(details.date_of_discard.is_some());
        assert!(details.time_of_discard.is_some());
        assert!(details.missing_fields().contains(&"authorizedBy"));
    }

    #[test]
    fn list_args_build_query() {
        let query = ListArgs {
            component: Some(ComponentType::Plasma),
            status: Some(UnitStatus::Stored),
            page: 2,
            page_size: 10,
            ..ListArgs::default()
        }
        .to_query();
        assert_eq!(query.component, Some(ComponentType::Plasma));
        assert_eq!(query.offset(), 10);
    }
}
