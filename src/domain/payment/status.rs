//! Payment intent status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of a payment intent.
///
/// `Pending` is the only non-terminal state. The first terminal status
/// written wins; nothing ever leaves `Completed`, `Cancelled` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created and handed to the gateway, no outcome yet.
    Pending,
    /// Gateway confirmed the money was taken.
    Completed,
    /// User abandoned or cancelled at the gateway.
    Cancelled,
    /// Gateway declined or errored.
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Cancelled) | (Pending, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Completed, Cancelled, Failed],
            Completed | Cancelled | Failed => vec![],
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "payment_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Cancelled,
        PaymentStatus::Failed,
    ];

    #[test]
    fn pending_can_reach_every_terminal_state() {
        for target in [
            PaymentStatus::Completed,
            PaymentStatus::Cancelled,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::Pending.transition_to(target), Ok(target));
        }
    }

    #[test]
    fn terminal_states_are_sticky() {
        for from in [
            PaymentStatus::Completed,
            PaymentStatus::Cancelled,
            PaymentStatus::Failed,
        ] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(from.transition_to(to).is_err(), "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn pending_is_not_terminal_and_cannot_loop() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(!PaymentStatus::Pending.can_transition_to(&PaymentStatus::Pending));
    }

    #[test]
    fn can_transition_to_agrees_with_valid_transitions() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to)
                );
            }
        }
    }

    #[test]
    fn parses_its_own_string_form() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
