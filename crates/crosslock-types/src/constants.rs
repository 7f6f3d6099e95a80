//! Protocol-wide constants for Crosslock.

/// Byte length of an order hash.
pub const ORDER_HASH_LEN: usize = 32;

/// Byte length of a hashlock commitment.
pub const HASHLOCK_LEN: usize = 32;

/// Byte length of a foreign (EVM-style) taker address.
pub const TAKER_ADDRESS_LEN: usize = 20;

/// Minimum delay between schedule creation and the withdrawal stage (1 hour).
pub const DEFAULT_MIN_WITHDRAWAL_DELAY_SECS: u64 = 3_600;

/// Upper bound on how far the cancellation stage may sit from creation (30 days).
pub const DEFAULT_MAX_TIMELOCK_PERIOD_SECS: u64 = 30 * 86_400;

/// Emergency refund offset past cancellation in the standard policy (24 hours).
pub const EMERGENCY_OFFSET_STANDARD_SECS: u64 = 86_400;

/// Emergency refund offset past cancellation in the simplified policy.
pub const EMERGENCY_OFFSET_SIMPLIFIED_SECS: u64 = 7_000;

/// Upper bound on the timelock window in the simplified policy (7 days).
pub const SIMPLIFIED_MAX_TIMELOCK_PERIOD_SECS: u64 = 7 * 86_400;

/// Withdrawal delay used by [`crate::TimelockSchedule::standard`].
pub const STANDARD_WITHDRAWAL_DELAY_SECS: u64 = 3_600;

/// Cancellation delay used by [`crate::TimelockSchedule::standard`].
pub const STANDARD_CANCELLATION_DELAY_SECS: u64 = 86_400;

/// Domain separator for order hashing.
pub const ORDER_HASH_DOMAIN: &[u8] = b"crosslock:order:v1:";

