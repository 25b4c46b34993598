// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serializable result envelope for callers outside Rust.
//!
//! ```json
//! { "ok": true, "data": ... }
//! { "ok": false, "errorKind": "not_found", "message": "..." }
//! ```

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use hemobank_core::{ErrorKind, HemoError};

#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    Err { kind: ErrorKind, message: String },
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Err { kind, .. } => Some(*kind),
        }
    }
}

impl<T> From<Result<T, HemoError>> for Outcome<T> {
    fn from(result: Result<T, HemoError>) -> Self {
        match result {
            Ok(data) => Outcome::Ok(data),
            Err(e) => Outcome::Err {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Ok(data) => {
                let mut s = serializer.serialize_struct("Outcome", 2)?;
                s.serialize_field("ok", &true)?;
                s.serialize_field("data", data)?;
                s.end()
            }
            Outcome::Err { kind, message } => {
                let mut s = serializer.serialize_struct("Outcome", 3)?;
                s.serialize_field("ok", &false)?;
                s.serialize_field("errorKind", kind)?;
                s.serialize_field("message", message)?;
                s.end()
            }
        }
    }
}
