// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Hemobank inventory engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and all-or-nothing batch mutations
//! for the blood unit lifecycle.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteRegistry;
pub use database::Database;
