// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits implemented by storage backends.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod activity;
pub mod adapter;
pub mod registry;

pub use activity::ActivityLog;
pub use adapter::PluginAdapter;
pub use registry::UnitRegistry;
