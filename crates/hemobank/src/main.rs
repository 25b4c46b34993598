// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hemobank - blood bank inventory lifecycle engine.
//!
//! Binary entry point. Every subcommand accepts `--json` and then prints a
//! `{ "ok": ... }` envelope instead of human output.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod args;
mod backup;
mod doctor;
mod inventory;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use hemobank_config::HemobankConfig;
use hemobank_core::{ComponentType, UnitStatus};

use crate::args::{DiscardArgs, EditArgs, ListArgs, ReleaseArgs, UnitSpec};
use crate::inventory::{Inventory, Moved};

/// Hemobank - blood bank inventory lifecycle engine.
#[derive(Parser, Debug)]
#[command(name = "hemobank", version, about, long_about = None)]
struct Cli {
    /// Load this configuration file instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Operator recorded in the activity log. Defaults to `app.operator`.
    #[arg(long, global = true)]
    operator: Option<String>,

    /// Print an `{ "ok": ... }` JSON envelope.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Receive units into storage. Each unit is SERIAL:GROUP:COLLECTED[:VOLUME].
    Intake {
        component: ComponentType,
        #[arg(required = true)]
        units: Vec<UnitSpec>,
    },
    /// Show one unit, whatever its component or status.
    Lookup { serial: String },
    /// Search the inventory.
    List(ListArgs),
    /// Edit a stored unit.
    Edit(EditArgs),
    /// Delete stored units.
    Delete {
        component: ComponentType,
        #[arg(required = true)]
        serials: Vec<String>,
    },
    /// Release stored units to a receiving facility under one invoice.
    Release {
        component: ComponentType,
        #[arg(required = true)]
        serials: Vec<String>,
        #[command(flatten)]
        details: ReleaseArgs,
    },
    /// Move stored units to non-conforming quarantine.
    Transfer {
        component: ComponentType,
        #[arg(required = true)]
        serials: Vec<String>,
    },
    /// Dispose of non-conforming units.
    Discard {
        component: ComponentType,
        #[arg(required = true)]
        serials: Vec<String>,
        #[command(flatten)]
        details: DiscardArgs,
    },
    /// Return released or non-conforming units to storage.
    Restore {
        component: ComponentType,
        /// released or non_conforming.
        #[arg(long, default_value = "released")]
        from: UnitStatus,
        #[arg(required = true)]
        serials: Vec<String>,
    },
    /// List release invoices, newest first, or show one.
    Releases {
        component: ComponentType,
        #[arg(long)]
        invoice: Option<String>,
    },
    /// List disposal records, newest first.
    Discards { component: ComponentType },
    /// Show recent activity records.
    Activity {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Run diagnostics.
    Doctor {
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Snapshot the registry database.
    Backup { path: String },
    /// Replace the registry database with a snapshot.
    RestoreDb { path: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => hemobank_config::load_and_validate_path(path),
        None => hemobank_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            hemobank_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);
    debug!(database = %config.registry.database_path, "configuration loaded");

    if !run(cli, &config).await {
        std::process::exit(1);
    }
}

/// Dispatch one subcommand. Returns false when it failed.
async fn run(cli: Cli, config: &HemobankConfig) -> bool {
    let json = cli.json;
    let db_path = config.registry.database_path.as_str();

    match &cli.command {
        Commands::Doctor { deep, plain } => {
            let (deep, plain) = (*deep, *plain);
            let results = doctor::run_doctor(config, deep).await;
            return output::emit(json, Ok(results), |r| doctor::print_report(r, deep, plain));
        }
        Commands::Backup { path } => {
            return output::emit(json, backup::run_backup(db_path, path), |r| {
                println!(
                    "Backup complete: {:.1} MB written to {}",
                    r.size_mb(),
                    r.destination
                );
            });
        }
        Commands::RestoreDb { path } => {
            return output::emit(json, backup::run_restore(db_path, path), |r| {
                if let Some(copy) = &r.safety_copy {
                    println!("Safety copy: {copy}");
                }
                println!(
                    "Restore complete: {:.1} MB restored from {}",
                    r.size_mb(),
                    r.source
                );
            });
        }
        _ => {}
    }

    let inventory = match Inventory::open(config, cli.operator.as_deref()).await {
        Ok(inventory) => inventory,
        Err(e) => return output::emit(json, Err::<(), _>(e), |_| {}),
    };
    let ok = run_inventory(&inventory, cli.command, json).await;
    inventory.close().await;
    ok
}

async fn run_inventory(inventory: &Inventory, command: Commands, json: bool) -> bool {
    match command {
        Commands::Intake { component, units } => output::emit(
            json,
            inventory.intake(component, &units).await,
            |drafts| output::print_intake(drafts),
        ),
        Commands::Lookup { serial } => {
            output::emit(json, inventory.lookup(&serial).await, output::print_unit)
        }
        Commands::List(args) => output::emit(json, inventory.list(&args).await, output::print_page),
        Commands::Edit(args) => output::emit(json, inventory.edit(&args).await, |unit| {
            println!("{}", "updated".green());
            output::print_unit(unit);
        }),
        Commands::Delete { component, serials } => output::emit(
            json,
            inventory.delete(component, &serials).await,
            |m| print_moved("deleted", m),
        ),
        Commands::Release {
            component,
            serials,
            details,
        } => output::emit(
            json,
            inventory.release(component, &serials, details).await,
            |receipt| {
                println!(
                    "{} {} under invoice {}",
                    "released".green(),
                    receipt.released.join(", "),
                    receipt.invoice_id.bold()
                );
            },
        ),
        Commands::Transfer { component, serials } => output::emit(
            json,
            inventory.transfer(component, &serials).await,
            |m| print_moved("moved to non-conforming", m),
        ),
        Commands::Discard {
            component,
            serials,
            details,
        } => output::emit(
            json,
            inventory.discard(component, &serials, details).await,
            |receipt| {
                println!(
                    "{} {} unit(s) under disposal record {}",
                    "discarded".green(),
                    receipt.discarded,
                    receipt.discard_id.bold()
                );
            },
        ),
        Commands::Restore {
            component,
            from,
            serials,
        } => output::emit(
            json,
            inventory.restore(component, from, &serials).await,
            |m| print_moved("restored to storage", m),
        ),
        Commands::Releases {
            component,
            invoice: Some(invoice),
        } => {
            let result = inventory.invoice(&invoice).await.and_then(|record| {
                if record.component == component {
                    Ok(record)
                } else {
                    Err(hemobank_core::HemoError::Validation(format!(
                        "invoice {invoice} belongs to {}",
                        record.component
                    )))
                }
            });
            output::emit(json, result, output::print_release)
        }
        Commands::Releases {
            component,
            invoice: None,
        } => output::emit(json, inventory.releases(component).await, |records| {
            if records.is_empty() {
                println!("No {component} releases.");
            }
            records.iter().for_each(output::print_release);
        }),
        Commands::Discards { component } => {
            output::emit(json, inventory.discards(component).await, |records| {
                if records.is_empty() {
                    println!("No {component} discards.");
                }
                records.iter().for_each(output::print_discard);
            })
        }
        Commands::Activity { limit } => {
            output::emit(json, inventory.activity(limit).await, |records| {
                records.iter().for_each(output::print_activity);
            })
        }
        Commands::Doctor { .. } | Commands::Backup { .. } | Commands::RestoreDb { .. } => true,
    }
}

fn print_moved(verb: &str, moved: &Moved) {
    println!(
        "{} {} {} unit(s): {}",
        verb.green(),
        moved.count,
        moved.component,
        moved.serial_ids.join(", ")
    );
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hemobank={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use serial_test::serial;

    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn release_flags_parse() {
        let cli = Cli::try_parse_from([
            "hemobank",
            "--json",
            "release",
            "rbc",
            "RBC001",
            "RBC002",
            "--facility",
            "General Hospital",
            "--date",
            "2025-02-01",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Release {
                component,
                serials,
                details,
            } => {
                assert_eq!(component, ComponentType::Rbc);
                assert_eq!(serials, vec!["RBC001", "RBC002"]);
                assert_eq!(details.facility.as_deref(), Some("General Hospital"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn restore_defaults_to_released() {
        let cli = Cli::try_parse_from(["hemobank", "restore", "plasma", "PLA001"]).unwrap();
        match cli.command {
            Commands::Restore { from, .. } => assert_eq!(from, UnitStatus::Released),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn intake_rejects_malformed_unit() {
        assert!(Cli::try_parse_from(["hemobank", "intake", "rbc", "RBC001:O"]).is_err());
    }

    #[test]
    #[serial]
    fn binary_loads_config_defaults() {
        let config = hemobank_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.lifecycle.platelet_shelf_life_days, 5);
        assert!(config.workflow.require_release_details);
    }
}
