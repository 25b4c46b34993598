// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hemobank doctor`: environment diagnostics.
//!
//! Quick checks cover configuration, the registry file, and its schema.
//! `--deep` adds an SQLite integrity check, stock expiry, file size, and the
//! allocator baseline.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Local;
use serde::{Serialize, Serializer};

use hemobank_config::HemobankConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(rename = "durationMs", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Times one check from construction to `finish`.
struct Check {
    name: &'static str,
    start: Instant,
}

impl Check {
    fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    fn finish(self, status: CheckStatus, message: impl Into<String>) -> CheckResult {
        CheckResult {
            name: self.name.to_string(),
            status,
            message: message.into(),
            duration: self.start.elapsed(),
        }
    }
}

/// Run the quick checks, plus the deep ones when `deep` is set.
pub async fn run_doctor(config: &HemobankConfig, deep: bool) -> Vec<CheckResult> {
    let db_path = config.registry.database_path.as_str();
    let mut results = vec![
        check_config(config),
        check_database(db_path).await,
        check_schema(db_path).await,
    ];
    if deep {
        results.push(check_db_integrity(db_path).await);
        results.push(check_expired_stock(db_path).await);
        results.push(check_db_size(db_path));
        results.push(check_memory_baseline());
    }
    results
}

/// Print results as a checklist.
pub fn print_report(results: &[CheckResult], deep: bool, plain: bool) {
    use colored::Colorize;

    let use_color = !plain && std::io::stdout().is_terminal();

    println!();
    println!("  hemobank doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in results {
        let ms = result.duration.as_millis();
        let (tag, message) = match result.status {
            CheckStatus::Pass if use_color => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn if use_color => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail if use_color => ("✗".red().to_string(), result.message.red()),
            CheckStatus::Pass => ("[OK]  ".to_string(), result.message.normal()),
            CheckStatus::Warn => ("[WARN]".to_string(), result.message.normal()),
            CheckStatus::Fail => ("[FAIL]".to_string(), result.message.normal()),
        };
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("    {tag} {:<20} {message} ({ms}ms)", result.name);
    }

    println!();
    if issues > 0 {
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }
    println!();
}

fn check_config(config: &HemobankConfig) -> CheckResult {
    let check = Check::start("Configuration");
    let lifecycle = &config.lifecycle;
    check.finish(
        CheckStatus::Pass,
        format!(
            "valid (shelf life RBC {}d, plasma {}d, platelet {}d)",
            lifecycle.rbc_shelf_life_days,
            lifecycle.plasma_shelf_life_days,
            lifecycle.platelet_shelf_life_days
        ),
    )
}

async fn query_registry<T, F>(db_path: &str, query: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
{
    let conn = tokio_rusqlite::Connection::open(db_path)
        .await
        .map_err(|e| format!("open failed: {e}"))?;
    conn.call(move |conn| query(conn))
        .await
        .map_err(|e| format!("query failed: {e}"))
}

async fn check_database(db_path: &str) -> CheckResult {
    let check = Check::start("Registry");
    if !Path::new(db_path).exists() {
        return check.finish(
            CheckStatus::Warn,
            format!("not found: {db_path} (created on first use)"),
        );
    }
    match query_registry(db_path, |conn| conn.execute_batch("SELECT 1")).await {
        Ok(()) => check.finish(CheckStatus::Pass, "connected"),
        Err(e) => check.finish(CheckStatus::Fail, e),
    }
}

async fn check_schema(db_path: &str) -> CheckResult {
    let check = Check::start("Schema");
    if !Path::new(db_path).exists() {
        return check.finish(CheckStatus::Warn, "registry not created yet (skipped)");
    }
    let version = query_registry(db_path, |conn| {
        conn.query_row(
            "SELECT MAX(version) FROM refinery_schema_history",
            [],
            |row| row.get::<_, Option<i64>>(0),
        )
    })
    .await;
    match version {
        Ok(Some(v)) => check.finish(CheckStatus::Pass, format!("migration V{v}")),
        Ok(None) => check.finish(CheckStatus::Warn, "no migrations applied"),
        Err(e) => check.finish(CheckStatus::Fail, e),
    }
}

async fn check_db_integrity(db_path: &str) -> CheckResult {
    let check = Check::start("Integrity");
    if !Path::new(db_path).exists() {
        return check.finish(CheckStatus::Warn, "registry not found (skipped)");
    }
    let rows = query_registry(db_path, |conn| {
        let mut stmt = conn.prepare("PRAGMA integrity_check")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
    .await;
    match rows {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => check.finish(CheckStatus::Pass, "ok"),
        Ok(rows) => check.finish(CheckStatus::Fail, format!("{} issue(s) found", rows.len())),
        Err(e) => check.finish(CheckStatus::Fail, e),
    }
}

/// Stored units whose expiration date has passed.
async fn check_expired_stock(db_path: &str) -> CheckResult {
    let check = Check::start("Expired stock");
    if !Path::new(db_path).exists() {
        return check.finish(CheckStatus::Warn, "registry not found (skipped)");
    }
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let expired = query_registry(db_path, move |conn| {
        conn.query_row(
            "SELECT COUNT(*) FROM blood_units WHERE status = 'stored' AND expiration_date < ?1",
            [today],
            |row| row.get::<_, i64>(0),
        )
    })
    .await;
    match expired {
        Ok(0) => check.finish(CheckStatus::Pass, "no stored unit past expiration"),
        Ok(n) => check.finish(
            CheckStatus::Warn,
            format!("{n} stored unit(s) past expiration"),
        ),
        Err(e) => check.finish(CheckStatus::Fail, e),
    }
}

fn check_db_size(db_path: &str) -> CheckResult {
    let check = Check::start("Registry size");
    match std::fs::metadata(db_path) {
        Ok(meta) => {
            let size_mb = meta.len() as f64 / (1024.0 * 1024.0);
            check.finish(CheckStatus::Pass, format!("{size_mb:.1} MB"))
        }
        Err(e) => check.finish(CheckStatus::Warn, format!("cannot stat: {e}")),
    }
}

fn check_memory_baseline() -> CheckResult {
    let check = Check::start("Memory baseline");

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let mb = |b: usize| b as f64 / (1024.0 * 1024.0);
        check.finish(
            CheckStatus::Pass,
            format!("heap: {:.1} MB, resident: {:.1} MB", mb(allocated), mb(resident)),
        )
    }

    #[cfg(target_env = "msvc")]
    {
        check.finish(CheckStatus::Warn, "jemalloc not available on MSVC")
    }
}
