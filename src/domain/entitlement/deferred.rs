//! Side effects that failed after settlement and wait for another attempt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::foundation::{PaymentIntentId, Timestamp, ValidationError};

/// Which post-settlement step a task re-runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Entitlement,
    Invoice,
    Referral,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Entitlement => "entitlement",
            TaskKind::Invoice => "invoice",
            TaskKind::Referral => "referral",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entitlement" => Ok(TaskKind::Entitlement),
            "invoice" => Ok(TaskKind::Invoice),
            "referral" => Ok(TaskKind::Referral),
            other => Err(ValidationError::invalid_format(
                "task_kind",
                format!("unknown kind '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting for `next_attempt_at`.
    Scheduled,
    /// Gave up after the maximum number of attempts; needs an operator.
    Exhausted,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Scheduled => "scheduled",
            TaskState::Exhausted => "exhausted",
        }
    }
}

impl FromStr for TaskState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(TaskState::Scheduled),
            "exhausted" => Ok(TaskState::Exhausted),
            other => Err(ValidationError::invalid_format(
                "task_state",
                format!("unknown state '{}'", other),
            )),
        }
    }
}

/// Retry record keyed by `(payment_intent_id, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredTask {
    pub payment_intent_id: PaymentIntentId,
    pub kind: TaskKind,
    pub state: TaskState,
    pub attempts: u32,
    pub last_error: String,
    pub next_attempt_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DeferredTask {
    /// First failure; the inline attempt counts as attempt one.
    pub fn first_failure(
        payment_intent_id: PaymentIntentId,
        kind: TaskKind,
        error: impl Into<String>,
        policy: &RetryPolicy,
        now: Timestamp,
    ) -> Self {
        Self {
            payment_intent_id,
            kind,
            state: TaskState::Scheduled,
            attempts: 1,
            last_error: error.into(),
            next_attempt_at: now.plus(policy.delay_after(1)),
            created_at: now,
            updated_at: now,
        }
    }

    /// Records another failed attempt and either reschedules or gives up.
    pub fn record_failure(&mut self, error: impl Into<String>, policy: &RetryPolicy, now: Timestamp) {
        self.attempts += 1;
        self.last_error = error.into();
        self.updated_at = now;
        if self.attempts >= policy.max_attempts {
            self.state = TaskState::Exhausted;
        } else {
            self.next_attempt_at = now.plus(policy.delay_after(self.attempts));
        }
    }

    pub fn is_due(&self, now: &Timestamp) -> bool {
        self.state == TaskState::Scheduled && !now.is_before(&self.next_attempt_at)
    }
}

/// Exponential backoff schedule for deferred tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Delay before the attempt following `attempts` failures.
    pub fn delay_after(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(3_600),
            max_attempts: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
            max_attempts: 3,
        }
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let p = policy();
        assert_eq!(p.delay_after(1), Duration::from_secs(10));
        assert_eq!(p.delay_after(2), Duration::from_secs(20));
        assert_eq!(p.delay_after(3), Duration::from_secs(40));
        assert_eq!(p.delay_after(4), Duration::from_secs(60));
        assert_eq!(p.delay_after(40), Duration::from_secs(60));
    }

    #[test]
    fn first_failure_is_due_after_base_delay() {
        let now = Timestamp::now();
        let task = DeferredTask::first_failure(
            PaymentIntentId::new(),
            TaskKind::Invoice,
            "timeout",
            &policy(),
            now,
        );
        assert_eq!(task.attempts, 1);
        assert!(!task.is_due(&now));
        assert!(task.is_due(&now.plus(Duration::from_secs(10))));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let now = Timestamp::now();
        let mut task = DeferredTask::first_failure(
            PaymentIntentId::new(),
            TaskKind::Referral,
            "db down",
            &policy(),
            now,
        );
        task.record_failure("db down", &policy(), now);
        assert_eq!(task.state, TaskState::Scheduled);
        task.record_failure("still down", &policy(), now);
        assert_eq!(task.state, TaskState::Exhausted);
        assert_eq!(task.last_error, "still down");
        assert!(!task.is_due(&now.add_days(1)));
    }

    #[test]
    fn kinds_parse() {
        for kind in [TaskKind::Entitlement, TaskKind::Invoice, TaskKind::Referral] {
            assert_eq!(kind.as_str().parse::<TaskKind>().unwrap(), kind);
        }
    }
}
