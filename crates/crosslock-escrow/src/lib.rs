//! # crosslock-escrow
//!
//! **Escrow plane**: holds one side of a cross-chain swap until either the
//! secret is revealed or the timelock expires.
//!
//! ## Architecture
//!
//! 1. **SwapEscrow**: the state machine (`UNINITIALIZED → INITIALIZED →
//!    WITHDRAWN | CANCELLED`) guarding release with a SHA-256 hashlock and a
//!    [`crosslock_types::TimelockSchedule`]
//! 2. **FundsTransfer**: the all-or-nothing payout seam a host plugs in
//! 3. **CustodyLedger**: in-memory [`FundsTransfer`] used by hosts and tests
//!
//! ## Resolution Flow
//!
//! ```text
//! initialize(params, schedule, funding) → [deposit]* →
//!     withdraw(secret) | public_withdraw(secret) → WITHDRAWN
//!     cancel()         | emergency_refund()       → CANCELLED
//! ```
//!
//! Exactly one resolution succeeds per escrow.

pub mod escrow;
pub mod transfer;

pub use escrow::{EscrowState, SwapEscrow};
pub use transfer::{CustodyLedger, FundsTransfer, Payout, PayoutKind};
