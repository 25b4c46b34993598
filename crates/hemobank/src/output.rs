// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human and `--json` rendering of command results.

use colored::Colorize;
use serde::Serialize;

use hemobank_core::{
    ActivityRecord, BloodUnit, DiscardRecord, HemoError, ReleaseRecord, UnitPage,
};
use hemobank_workflow::{DraftUnit, Outcome};

/// Print `result` and report whether it succeeded.
///
/// In JSON mode the [`Outcome`] envelope goes to stdout for both success and
/// failure. Otherwise `human` renders a success and errors go to stderr.
pub fn emit<T: Serialize>(
    json: bool,
    result: Result<T, HemoError>,
    human: impl FnOnce(&T),
) -> bool {
    if json {
        let outcome = Outcome::from(result);
        let ok = outcome.is_ok();
        match serde_json::to_string_pretty(&outcome) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("error: failed to encode result: {e}"),
        }
        return ok;
    }
    match result {
        Ok(data) => {
            human(&data);
            true
        }
        Err(e) => {
            eprintln!("{} [{}] {e}", "error:".red().bold(), e.kind());
            false
        }
    }
}

const UNIT_HEADER: &str = "SERIAL        COMPONENT  GROUP  VOLUME  COLLECTED   EXPIRES     STATUS";

pub fn unit_line(unit: &BloodUnit) -> String {
    format!(
        "{:<13} {:<10} {:<6} {:>6}  {}  {}  {}",
        unit.serial_id,
        unit.component.to_string(),
        unit.blood_group(),
        format!("{}ml", unit.volume_ml),
        unit.collection_date,
        unit.expiration_date,
        unit.status
    )
}

pub fn print_unit(unit: &BloodUnit) {
    println!("{}", UNIT_HEADER.bold());
    println!("{}", unit_line(unit));
}

pub fn print_page(page: &UnitPage) {
    if page.units.is_empty() {
        println!("No units match.");
        return;
    }
    println!("{}", UNIT_HEADER.bold());
    for unit in &page.units {
        println!("{}", unit_line(unit));
    }
    println!(
        "page {} of {} ({} units)",
        page.page,
        page.total_pages(),
        page.total
    );
}

pub fn print_intake(drafts: &[DraftUnit]) {
    for draft in drafts {
        let expires = draft
            .expiration_date()
            .map(|d| d.to_string())
            .unwrap_or_default();
        println!(
            "{} {}{} {}ml, expires {expires}",
            "stored".green(),
            draft.serial_id,
            format!(" {}{}", draft.blood_type, draft.rh_factor).dimmed(),
            draft.volume_ml
        );
    }
}

pub fn print_release(record: &ReleaseRecord) {
    println!(
        "{} {} to {} ({})",
        record.invoice_id.bold(),
        record.component,
        record.details.receiving_facility,
        record.created_at
    );
    println!("  units: {}", record.serial_ids.join(", "));
}

pub fn print_discard(record: &DiscardRecord) {
    println!(
        "{} {} by {} ({})",
        record.discard_id.bold(),
        record.component,
        record.details.method_of_disposal,
        record.created_at
    );
    println!("  units: {}", record.serial_ids.join(", "));
    println!("  reason: {}", record.details.reason_for_discarding);
}

pub fn print_activity(record: &ActivityRecord) {
    println!(
        "{}  {:<8} {:<22} {}",
        record.timestamp.dimmed(),
        record.action_type.to_string(),
        record.entity_type,
        record.description
    );
}
