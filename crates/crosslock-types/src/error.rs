//! Error types for Crosslock.
//!
//! All errors use the `CL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Construction / validation errors
//! - 2xx: Timelock errors
//! - 3xx: Escrow state-machine errors
//! - 4xx: Transfer errors
//! - 5xx: Pricing / fill errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, Amount, Timestamp, TimelockStage};

/// Central error enum for all Crosslock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrosslockError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A hash, address, or account field is malformed.
    #[error("CL_ERR_100: Invalid format for {field}: {reason}")]
    InvalidFormat { field: &'static str, reason: String },

    /// An amount violates its bounds (e.g. zero principal).
    #[error("CL_ERR_101: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// A pricing order violates `filled_amount <= making_amount`.
    #[error("CL_ERR_102: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    // =================================================================
    // Timelock Errors (2xx)
    // =================================================================
    /// Deadlines are not strictly increasing or violate the policy bounds.
    #[error("CL_ERR_200: Timelock ordering violated: {reason}")]
    TimelockOrdering { reason: String },

    /// A timelock-gated action was attempted before its deadline.
    #[error("CL_ERR_201: {stage} timelock not reached: available at {available_at}, now {now}")]
    TimelockNotReached {
        stage: TimelockStage,
        available_at: Timestamp,
        now: Timestamp,
    },

    /// The schedule has no deadline for this stage.
    #[error("CL_ERR_202: {stage} stage is not scheduled")]
    StageNotScheduled { stage: TimelockStage },

    // =================================================================
    // Escrow Errors (3xx)
    // =================================================================
    /// The escrow has not received its parameters and funding yet.
    #[error("CL_ERR_300: Escrow not initialized")]
    NotInitialized,

    /// `initialize` was called on an escrow that already holds parameters.
    #[error("CL_ERR_301: Escrow already initialized")]
    AlreadyInitialized,

    /// The escrow already released funds to the maker.
    #[error("CL_ERR_302: Escrow already withdrawn")]
    AlreadyWithdrawn,

    /// The escrow already refunded the depositor.
    #[error("CL_ERR_303: Escrow already cancelled")]
    AlreadyCancelled,

    /// The supplied secret does not hash to the stored hashlock.
    #[error("CL_ERR_304: Invalid secret")]
    InvalidSecret,

    /// The caller is not allowed to perform this action.
    #[error("CL_ERR_305: Unauthorized caller {caller}, expected {expected}")]
    Unauthorized {
        caller: AccountId,
        expected: AccountId,
    },

    /// Supplied funds are below the required total.
    #[error("CL_ERR_306: Insufficient funds: need {needed}, supplied {supplied}")]
    InsufficientFunds { needed: Amount, supplied: Amount },

    // =================================================================
    // Transfer Errors (4xx)
    // =================================================================
    /// The value-transfer primitive rejected the payout batch.
    #[error("CL_ERR_400: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    // =================================================================
    // Pricing Errors (5xx)
    // =================================================================
    /// Integer arithmetic would overflow.
    #[error("CL_ERR_500: Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: &'static str },

    /// A division by a non-positive span or price was refused.
    #[error("CL_ERR_501: Division guard: {reason}")]
    DivisionGuard { reason: String },

    /// A recorded fill would push the cumulative total past the order size.
    #[error("CL_ERR_502: Fill exceeds available: filled {filled} + fill {fill} > making {making}")]
    FillExceedsAvailable {
        filled: Amount,
        fill: Amount,
        making: Amount,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("CL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("CL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid values, inconsistent periods).
    #[error("CL_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl CrosslockError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Timelock guards clear as time advances and a transfer sink may
    /// recover; everything else needs different input or is terminal.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TimelockNotReached { .. } | Self::TransferFailed { .. }
        )
    }

    /// Whether this error was raised while constructing a record.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidOrder { .. }
                | Self::TimelockOrdering { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CrosslockError>;

impl From<serde_json::Error> for CrosslockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
