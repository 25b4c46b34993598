// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workflow phase machine.
//!
//! ```text
//! Idle --open--> Selecting --proceed--> Detailing --submit--> Committing
//!                Selecting --submit---------------------->  Committing
//!                Detailing --back--> Selecting
//! Committing --succeeded--> Done      Committing --failed--> Failed
//! Failed --submit--> Committing       Failed --back--> Selecting
//! Done --open--> Selecting            any --close--> Idle
//! ```
//!
//! Single-step workflows (intake, transfer, restore) submit straight from
//! `Selecting`. Two-step workflows gate their confirm call on `Detailing`.

use serde::{Deserialize, Serialize};
use strum::Display;

use hemobank_core::HemoError;

/// Where a workflow is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    #[default]
    Idle,
    /// Rows are being filled and resolved.
    Selecting,
    /// Selection is frozen; destination or disposal details are being entered.
    Detailing,
    /// A registry request is in flight.
    Committing,
    Done,
    Failed,
}

/// Inputs that drive [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    Open,
    Proceed,
    Back,
    Submit,
    Succeeded,
    Failed,
    Close,
}

/// Next phase for `event`, or `InvalidPhase` if the step is not allowed.
pub fn transition(phase: WorkflowPhase, event: PhaseEvent) -> Result<WorkflowPhase, HemoError> {
    use PhaseEvent as E;
    use WorkflowPhase as P;
    let next = match (phase, event) {
        (_, E::Close) => P::Idle,
        (P::Idle | P::Done, E::Open) => P::Selecting,
        (P::Selecting, E::Proceed) => P::Detailing,
        (P::Detailing, E::Back) | (P::Failed, E::Back) => P::Selecting,
        (P::Selecting | P::Detailing | P::Failed, E::Submit) => P::Committing,
        (P::Committing, E::Succeeded) => P::Done,
        (P::Committing, E::Failed) => P::Failed,
        (phase, event) => {
            return Err(HemoError::InvalidPhase {
                phase: phase.to_string(),
                event: event.to_string(),
            });
        }
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use hemobank_core::ErrorKind;

    use super::*;

    #[test]
    fn two_step_happy_path() {
        let mut phase = WorkflowPhase::Idle;
        for event in [PhaseEvent::Open, PhaseEvent::Proceed, PhaseEvent::Submit, PhaseEvent::Succeeded] {
            phase = transition(phase, event).unwrap();
        }
        assert_eq!(phase, WorkflowPhase::Done);
    }

    #[test]
    fn single_step_submits_from_selecting() {
        let phase = transition(WorkflowPhase::Selecting, PhaseEvent::Submit).unwrap();
        assert_eq!(phase, WorkflowPhase::Committing);
    }

    #[test]
    fn committing_refuses_a_second_submit() {
        let err = transition(WorkflowPhase::Committing, PhaseEvent::Submit).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(err.to_string(), "cannot submit while workflow is committing");
    }

    #[test]
    fn failed_allows_retry_or_back() {
        assert_eq!(
            transition(WorkflowPhase::Failed, PhaseEvent::Submit).unwrap(),
            WorkflowPhase::Committing
        );
        assert_eq!(
            transition(WorkflowPhase::Failed, PhaseEvent::Back).unwrap(),
            WorkflowPhase::Selecting
        );
    }

    #[test]
    fn close_always_returns_to_idle() {
        for phase in [
            WorkflowPhase::Idle,
            WorkflowPhase::Selecting,
            WorkflowPhase::Detailing,
            WorkflowPhase::Committing,
            WorkflowPhase::Done,
            WorkflowPhase::Failed,
        ] {
            assert_eq!(transition(phase, PhaseEvent::Close).unwrap(), WorkflowPhase::Idle);
        }
    }

    #[test]
    fn cannot_proceed_from_idle_or_detailing() {
        assert!(transition(WorkflowPhase::Idle, PhaseEvent::Proceed).is_err());
        assert!(transition(WorkflowPhase::Detailing, PhaseEvent::Proceed).is_err());
        assert!(transition(WorkflowPhase::Idle, PhaseEvent::Submit).is_err());
        assert!(transition(WorkflowPhase::Done, PhaseEvent::Submit).is_err());
    }
}
