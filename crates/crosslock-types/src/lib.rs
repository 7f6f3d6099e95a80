//! # crosslock-types
//!
//! Shared types, errors, and configuration for **Crosslock**, a
//! hashlock/timelock swap escrow with a Dutch-auction fill calculator.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderHash`], [`Hashlock`], [`TakerAddress`], [`AccountId`], [`Secret`]
//! - **Swap parameters**: [`ImmutableSwapParams`]
//! - **Timelocks**: [`TimelockSchedule`], [`TimelockStage`], [`TimelockStatus`], [`Countdown`]
//! - **Pricing order model**: [`Order`]
//! - **Time source**: [`Clock`], [`SystemClock`], [`FixedClock`]
//! - **Configuration**: [`EscrowConfig`], [`TimelockPolicy`]
//! - **Errors**: [`CrosslockError`] with `CL_ERR_` prefix codes
//! - **Constants**: protocol limits and default delays

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod immutables;
pub mod order;
pub mod timelock;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use immutables::*;
pub use order::*;
pub use timelock::*;

/// Amounts in the smallest indivisible currency unit.
pub type Amount = u128;

/// Seconds since the UNIX epoch, always supplied by the caller.
pub type Timestamp = u64;

// Constants are accessed via `crosslock_types::constants::FOO`
// (not re-exported to avoid name collisions).
