//! Configuration types for escrow timelocks and withdrawal policy.
//!
//! Two policies are observed in deployed escrows: a **standard** one (1 hour
//! minimum withdrawal delay, 30 day window, 24 hour emergency offset) and a
//! **simplified** one (no minimum delay, 7 day window, 7000 s emergency
//! offset). Callers pick one explicitly.

use serde::{Deserialize, Serialize};

use crate::{CrosslockError, Result, constants};

/// Bounds applied when building a [`crate::TimelockSchedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockPolicy {
    /// Minimum seconds between creation and the withdrawal stage.
    pub min_withdrawal_delay: u64,
    /// Maximum seconds between creation and the cancellation stage.
    pub max_timelock_period: Option<u64>,
    /// Seconds after cancellation before the depositor may force a refund.
    pub emergency_offset: u64,
}

impl TimelockPolicy {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            min_withdrawal_delay: constants::DEFAULT_MIN_WITHDRAWAL_DELAY_SECS,
            max_timelock_period: Some(constants::DEFAULT_MAX_TIMELOCK_PERIOD_SECS),
            emergency_offset: constants::EMERGENCY_OFFSET_STANDARD_SECS,
        }
    }

    #[must_use]
    pub fn simplified() -> Self {
        Self {
            min_withdrawal_delay: 0,
            max_timelock_period: Some(constants::SIMPLIFIED_MAX_TIMELOCK_PERIOD_SECS),
            emergency_offset: constants::EMERGENCY_OFFSET_SIMPLIFIED_SECS,
        }
    }

    /// # Errors
    /// Returns `Configuration` if the emergency offset is zero or the window
    /// cannot fit the minimum withdrawal delay.
    pub fn validate(&self) -> Result<()> {
        if self.emergency_offset == 0 {
            return Err(CrosslockError::Configuration(
                "emergency_offset must be > 0".to_string(),
            ));
        }
        if let Some(max) = self.max_timelock_period {
            // withdrawal and cancellation both need a slot after the minimum delay
            if max <= self.min_withdrawal_delay {
                return Err(CrosslockError::Configuration(format!(
                    "max_timelock_period {max} must exceed min_withdrawal_delay {}",
                    self.min_withdrawal_delay
                )));
            }
        }
        Ok(())
    }
}

impl Default for TimelockPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Escrow-wide configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Timelock bounds for new schedules.
    pub timelocks: TimelockPolicy,
    /// Restrict `withdraw` (the private stage) to the maker.
    pub private_withdrawal_requires_maker: bool,
}

impl EscrowConfig {
    /// Fully guarded escrow with the standard timelock policy.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            timelocks: TimelockPolicy::standard(),
            private_withdrawal_requires_maker: true,
        }
    }

    /// Short-offset policy. Still maker-gated on private withdrawal.
    #[must_use]
    pub fn simplified() -> Self {
        Self {
            timelocks: TimelockPolicy::simplified(),
            private_withdrawal_requires_maker: true,
        }
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `Configuration` for bad values.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// See [`TimelockPolicy::validate`].
    pub fn validate(&self) -> Result<()> {
        self.timelocks.validate()
    }
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self::standard()
    }
}
