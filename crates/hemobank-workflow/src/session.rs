// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator identity attached to every activity record.

use hemobank_config::HemobankConfig;

/// The operator performing a workflow. Passed explicitly into every
/// state-changing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSession {
    user_name: String,
}

impl OperatorSession {
    pub fn new(user_name: impl Into<String>) -> Self {
        let user_name = user_name.into();
        let trimmed = user_name.trim();
        Self {
            user_name: if trimmed.is_empty() {
                "operator".to_string()
            } else {
                trimmed.to_string()
            },
        }
    }

    /// Session for the operator named in `[app] operator`.
    pub fn from_config(config: &HemobankConfig) -> Self {
        Self::new(config.app.operator.clone())
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_fall_back_to_operator() {
        assert_eq!(OperatorSession::new("  ").user_name(), "operator");
        assert_eq!(OperatorSession::new(" nurse.ana ").user_name(), "nurse.ana");
    }

    #[test]
    fn from_config_uses_app_operator() {
        let mut config = HemobankConfig::default();
        config.app.operator = "tech-7".into();
        assert_eq!(OperatorSession::from_config(&config).user_name(), "tech-7");
    }
}
