//! Timelock schedule for a swap escrow.
//!
//! Stages unlock in a fixed order:
//!
//! ```text
//!  created_at ──▶ withdrawal_at ──▶ public_withdrawal_at ──▶ cancellation_at ──▶ +emergency_offset
//!   PENDING       WITHDRAWAL        PUBLIC_WITHDRAWAL          CANCELLATION        EMERGENCY
//! ```
//!
//! All deadlines are absolute UNIX seconds and strictly increasing. The
//! public stage is optional; without it the schedule goes straight from
//! withdrawal to cancellation. Every query takes `now` explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Clock, CrosslockError, Result, Timestamp, TimelockPolicy, constants};

/// A gated stage of the escrow lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelockStage {
    /// Secret holder (maker) may withdraw.
    Withdrawal,
    /// Anyone holding the secret may withdraw.
    PublicWithdrawal,
    /// Anyone may trigger the refund to the depositor.
    Cancellation,
    /// Depositor may force a refund.
    Emergency,
}

impl fmt::Display for TimelockStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Withdrawal => write!(f, "WITHDRAWAL"),
            Self::PublicWithdrawal => write!(f, "PUBLIC_WITHDRAWAL"),
            Self::Cancellation => write!(f, "CANCELLATION"),
            Self::Emergency => write!(f, "EMERGENCY"),
        }
    }
}

/// Which window `now` falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelockStatus {
    Pending,
    WithdrawalAllowed,
    PublicWithdrawalAllowed,
    CancellationAllowed,
}

impl fmt::Display for TimelockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::WithdrawalAllowed => write!(f, "withdrawal_allowed"),
            Self::PublicWithdrawalAllowed => write!(f, "public_withdrawal_allowed"),
            Self::CancellationAllowed => write!(f, "cancellation_allowed"),
        }
    }
}

/// Result of [`TimelockSchedule::time_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Countdown {
    /// The stage is already open.
    Available,
    /// Seconds until the stage opens (always > 0).
    Remaining(u64),
    /// The schedule has no such stage.
    Unscheduled,
}

/// Validated, write-once set of deadlines.
///
/// Deserialization re-checks ordering and overflow; policy bounds are checked
/// by whoever adopts the schedule (see [`TimelockSchedule::conforms_to`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimelockSchedule")]
pub struct TimelockSchedule {
    withdrawal_at: Timestamp,
    public_withdrawal_at: Option<Timestamp>,
    cancellation_at: Timestamp,
    created_at: Timestamp,
    emergency_offset: u64,
}

impl TimelockSchedule {
    /// Validate and build a schedule created at `now`.
    ///
    /// # Errors
    /// - `Configuration` if the policy itself is invalid
    /// - `TimelockOrdering` if the deadlines are not strictly increasing,
    ///   `withdrawal_at` is sooner than `now + min_withdrawal_delay`, or the
    ///   cancellation deadline exceeds the policy window
    /// - `ArithmeticOverflow` if the emergency deadline does not fit
    pub fn new(
        withdrawal_at: Timestamp,
        public_withdrawal_at: Option<Timestamp>,
        cancellation_at: Timestamp,
        now: Timestamp,
        policy: &TimelockPolicy,
    ) -> Result<Self> {
        policy.validate()?;
        let schedule = Self::from_deadlines(
            withdrawal_at,
            public_withdrawal_at,
            cancellation_at,
            now,
            policy.emergency_offset,
        )?;
        schedule.conforms_to(policy)?;
        Ok(schedule)
    }

    /// Ordering and overflow checks that hold for every schedule, whatever
    /// policy built it. Also the deserialization path.
    fn from_deadlines(
        withdrawal_at: Timestamp,
        public_withdrawal_at: Option<Timestamp>,
        cancellation_at: Timestamp,
        created_at: Timestamp,
        emergency_offset: u64,
    ) -> Result<Self> {
        if emergency_offset == 0 {
            return Err(CrosslockError::Configuration(
                "emergency_offset must be > 0".to_string(),
            ));
        }
        if withdrawal_at <= created_at {
            return Err(ordering(format!(
                "withdrawal_at {withdrawal_at} must be after created_at {created_at}"
            )));
        }

        match public_withdrawal_at {
            Some(public_at) => {
                if public_at <= withdrawal_at {
                    return Err(ordering(format!(
                        "public_withdrawal_at {public_at} must be after withdrawal_at {withdrawal_at}"
                    )));
                }
                if cancellation_at <= public_at {
                    return Err(ordering(format!(
                        "cancellation_at {cancellation_at} must be after public_withdrawal_at {public_at}"
                    )));
                }
            }
            None => {
                if cancellation_at <= withdrawal_at {
                    return Err(ordering(format!(
                        "cancellation_at {cancellation_at} must be after withdrawal_at {withdrawal_at}"
                    )));
                }
            }
        }

        if cancellation_at.checked_add(emergency_offset).is_none() {
            return Err(CrosslockError::ArithmeticOverflow {
                operation: "cancellation_at + emergency_offset",
            });
        }

        Ok(Self {
            withdrawal_at,
            public_withdrawal_at,
            cancellation_at,
            created_at,
            emergency_offset,
        })
    }

    /// Check this schedule against a policy's bounds.
    ///
    /// # Errors
    /// - `Configuration` if the emergency offset differs from the policy's
    /// - `TimelockOrdering` if withdrawal opens sooner than
    ///   `min_withdrawal_delay` after creation, or cancellation sits more than
    ///   `max_timelock_period` after it
    pub fn conforms_to(&self, policy: &TimelockPolicy) -> Result<()> {
        if self.emergency_offset != policy.emergency_offset {
            return Err(CrosslockError::Configuration(format!(
                "schedule emergency_offset {} does not match policy {}",
                self.emergency_offset, policy.emergency_offset
            )));
        }

        let delay = self.withdrawal_at.saturating_sub(self.created_at);
        if delay < policy.min_withdrawal_delay {
            return Err(ordering(format!(
                "withdrawal_at {} is {delay}s after creation, minimum is {}s",
                self.withdrawal_at, policy.min_withdrawal_delay
            )));
        }

        if let Some(max) = policy.max_timelock_period {
            let window = self.cancellation_at.saturating_sub(self.created_at);
            if window > max {
                return Err(ordering(format!(
                    "cancellation_at {} is more than {max}s after creation",
                    self.cancellation_at
                )));
            }
        }
        Ok(())
    }

    /// Build a schedule from delays relative to the clock's current time.
    ///
    /// # Errors
    /// Same as [`TimelockSchedule::new`]; overflowing delays are rejected as
    /// `TimelockOrdering`.
    pub fn with_delays(
        clock: &impl Clock,
        withdrawal_delay: u64,
        public_withdrawal_delay: Option<u64>,
        cancellation_delay: u64,
        policy: &TimelockPolicy,
    ) -> Result<Self> {
        let now = clock.now();
        let at = |delay: u64| {
            now.checked_add(delay)
                .ok_or_else(|| ordering(format!("delay {delay}s overflows the clock")))
        };
        let public_at = public_withdrawal_delay.map(at).transpose()?;
        Self::new(
            at(withdrawal_delay)?,
            public_at,
            at(cancellation_delay)?,
            now,
            policy,
        )
    }

    /// One hour until withdrawal, 24 hours until cancellation, standard policy.
    ///
    /// # Errors
    /// Only on clock overflow.
    pub fn standard(clock: &impl Clock) -> Result<Self> {
        Self::with_delays(
            clock,
            constants::STANDARD_WITHDRAWAL_DELAY_SECS,
            None,
            constants::STANDARD_CANCELLATION_DELAY_SECS,
            &TimelockPolicy::standard(),
        )
    }

    // -----------------------------------------------------------------
    // Deadlines
    // -----------------------------------------------------------------

    #[must_use]
    pub fn withdrawal_at(&self) -> Timestamp {
        self.withdrawal_at
    }

    #[must_use]
    pub fn public_withdrawal_at(&self) -> Option<Timestamp> {
        self.public_withdrawal_at
    }

    #[must_use]
    pub fn cancellation_at(&self) -> Timestamp {
        self.cancellation_at
    }

    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[must_use]
    pub fn emergency_offset(&self) -> u64 {
        self.emergency_offset
    }

    /// `cancellation_at + emergency_offset` (checked at construction).
    #[must_use]
    pub fn emergency_at(&self) -> Timestamp {
        self.cancellation_at.saturating_add(self.emergency_offset)
    }

    /// Absolute deadline of a stage, `None` if it is not scheduled.
    #[must_use]
    pub fn deadline(&self, stage: TimelockStage) -> Option<Timestamp> {
        match stage {
            TimelockStage::Withdrawal => Some(self.withdrawal_at),
            TimelockStage::PublicWithdrawal => self.public_withdrawal_at,
            TimelockStage::Cancellation => Some(self.cancellation_at),
            TimelockStage::Emergency => Some(self.emergency_at()),
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    #[must_use]
    pub fn can_withdraw(&self, now: Timestamp) -> bool {
        self.is_open(TimelockStage::Withdrawal, now)
    }

    /// Always `false` when the public stage is not scheduled.
    #[must_use]
    pub fn can_public_withdraw(&self, now: Timestamp) -> bool {
        self.is_open(TimelockStage::PublicWithdrawal, now)
    }

    #[must_use]
    pub fn can_cancel(&self, now: Timestamp) -> bool {
        self.is_open(TimelockStage::Cancellation, now)
    }

    #[must_use]
    pub fn can_emergency(&self, now: Timestamp) -> bool {
        self.is_open(TimelockStage::Emergency, now)
    }

    #[must_use]
    pub fn is_open(&self, stage: TimelockStage, now: Timestamp) -> bool {
        self.deadline(stage).is_some_and(|at| now >= at)
    }

    /// Guard for a stage-gated action.
    ///
    /// # Errors
    /// `StageNotScheduled` or `TimelockNotReached`.
    pub fn check(&self, stage: TimelockStage, now: Timestamp) -> Result<()> {
        let available_at = self
            .deadline(stage)
            .ok_or(CrosslockError::StageNotScheduled { stage })?;
        if now >= available_at {
            Ok(())
        } else {
            Err(CrosslockError::TimelockNotReached {
                stage,
                available_at,
                now,
            })
        }
    }

    /// The window `now` falls into. The emergency offset does not change it.
    #[must_use]
    pub fn status(&self, now: Timestamp) -> TimelockStatus {
        if now < self.withdrawal_at {
            TimelockStatus::Pending
        } else if now >= self.cancellation_at {
            TimelockStatus::CancellationAllowed
        } else if self.can_public_withdraw(now) {
            TimelockStatus::PublicWithdrawalAllowed
        } else {
            TimelockStatus::WithdrawalAllowed
        }
    }

    #[must_use]
    pub fn time_until(&self, stage: TimelockStage, now: Timestamp) -> Countdown {
        match self.deadline(stage) {
            None => Countdown::Unscheduled,
            Some(at) if now >= at => Countdown::Available,
            Some(at) => Countdown::Remaining(at - now),
        }
    }
}

/// Wire form of [`TimelockSchedule`] before validation.
#[derive(Deserialize)]
struct RawTimelockSchedule {
    withdrawal_at: Timestamp,
    public_withdrawal_at: Option<Timestamp>,
    cancellation_at: Timestamp,
    created_at: Timestamp,
    emergency_offset: u64,
}

impl TryFrom<RawTimelockSchedule> for TimelockSchedule {
    type Error = CrosslockError;

    fn try_from(raw: RawTimelockSchedule) -> Result<Self> {
        Self::from_deadlines(
            raw.withdrawal_at,
            raw.public_withdrawal_at,
            raw.cancellation_at,
            raw.created_at,
            raw.emergency_offset,
        )
    }
}

fn ordering(reason: String) -> CrosslockError {
    CrosslockError::TimelockOrdering { reason }
}
