// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Release invoices, discard records, and activity log entries.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::types::{ActionType, ComponentType};

/// Destination metadata collected in the second phase of a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDetails {
    pub receiving_facility: String,
    pub address: String,
    pub contact_number: String,
    pub classification: String,
    pub authorized_recipient: String,
    pub recipient_designation: String,
    pub date_of_release: Option<NaiveDate>,
    pub condition_upon_release: String,
    /// Optional request or requisition number from the receiving facility.
    pub request_reference: Option<String>,
    pub released_by: String,
}

impl ReleaseDetails {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let text = [
            ("receivingFacility", &self.receiving_facility),
            ("address", &self.address),
            ("contactNumber", &self.contact_number),
            ("classification", &self.classification),
            ("authorizedRecipient", &self.authorized_recipient),
            ("recipientDesignation", &self.recipient_designation),
            ("conditionUponRelease", &self.condition_upon_release),
            ("releasedBy", &self.released_by),
        ];
        let mut missing: Vec<_> = text
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k)
            .collect();
        if self.date_of_release.is_none() {
            missing.push("dateOfRelease");
        }
        missing
    }
}

/// Disposal metadata. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardDetails {
    pub responsible_personnel: String,
    pub reason_for_discarding: String,
    pub authorized_by: String,
    pub date_of_discard: Option<NaiveDate>,
    pub time_of_discard: Option<NaiveTime>,
    pub method_of_disposal: String,
    pub remarks: String,
}

impl DiscardDetails {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.responsible_personnel.trim().is_empty() {
            missing.push("responsiblePersonnel");
        }
        if self.reason_for_discarding.trim().is_empty() {
            missing.push("reasonForDiscarding");
        }
        if self.authorized_by.trim().is_empty() {
            missing.push("authorizedBy");
        }
        if self.date_of_discard.is_none() {
            missing.push("dateOfDiscard");
        }
        if self.time_of_discard.is_none() {
            missing.push("timeOfDiscard");
        }
        if self.method_of_disposal.trim().is_empty() {
            missing.push("methodOfDisposal");
        }
        if self.remarks.trim().is_empty() {
            missing.push("remarks");
        }
        missing
    }
}

/// A persisted release invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    pub invoice_id: String,
    pub component: ComponentType,
    pub serial_ids: Vec<String>,
    pub details: ReleaseDetails,
    pub created_at: String,
}

/// What the registry reports back after a committed release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReceipt {
    pub invoice_id: String,
    pub released: Vec<String>,
}

/// A persisted disposal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardRecord {
    pub discard_id: String,
    pub component: ComponentType,
    pub serial_ids: Vec<String>,
    pub details: DiscardDetails,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardReceipt {
    pub discard_id: String,
    pub discarded: usize,
}

/// One append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Unique record identifier (UUID v4).
    pub id: String,
    pub user_name: String,
    pub action_type: ActionType,
    pub entity_type: String,
    pub entity_id: String,
    pub description: String,
    pub details: serde_json::Value,
    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl ActivityRecord {
    pub fn new(
        user_name: impl Into<String>,
        action_type: ActionType,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        description: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_name: user_name.into(),
            action_type,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            description: description.into(),
            details,
            timestamp: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_release_details_list_every_required_field() {
        let missing = ReleaseDetails::default().missing_fields();
        assert_eq!(missing.len(), 9);
        assert!(missing.contains(&"dateOfRelease"));
        assert!(!missing.contains(&"requestReference"));
    }

    #[test]
    fn whitespace_counts_as_missing() {
        let details = DiscardDetails {
            responsible_personnel: "  ".into(),
            reason_for_discarding: "hemolysis".into(),
            authorized_by: "Dr. Reyes".into(),
            date_of_discard: NaiveDate::from_ymd_opt(2025, 5, 1),
            time_of_discard: NaiveTime::from_hms_opt(9, 30, 0),
            method_of_disposal: "incineration".into(),
            remarks: "n/a".into(),
        };
        assert_eq!(details.missing_fields(), vec!["responsiblePersonnel"]);
    }

    #[test]
    fn activity_record_gets_id_and_timestamp() {
        let rec = ActivityRecord::new(
            "nurse.ana",
            ActionType::Release,
            "rbc_stock",
            "inv-1",
            "Released 1 RBC unit",
            serde_json::json!({ "serialNumbers": ["RBC001"] }),
        );
        assert!(!rec.id.is_empty());
        assert!(rec.timestamp.ends_with('Z'));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["actionType"], "release");
        assert_eq!(json["details"]["serialNumbers"][0], "RBC001");
    }
}
