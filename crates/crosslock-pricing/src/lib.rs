//! # crosslock-pricing
//!
//! **Pricing plane**: pure integer arithmetic for Dutch-auction orders.
//!
//! - [`calc_price`]: linear price between two points in time, clamped
//! - [`resolve_fill`]: how much of a partially filled order a counter
//!   amount buys at the current price, never more than what remains
//! - [`DutchAuction`]: auction window plus prices, bundled
//! - [`FilledAmountLedger`]: cumulative fills keyed by order hash
//!
//! ```text
//! ledger.apply_to(order) → auction.making_amount(order, counter, now)
//!     → settle fill → ledger.record_fill(hash, fill, making)
//! ```
//!
//! Nothing here touches a clock or mutates an order on its own; time and
//! fill state are always inputs.

pub mod dutch_auction;
pub mod ledger;

pub use dutch_auction::{AuctionWindow, DutchAuction, calc_price, remaining, resolve_fill};
pub use ledger::FilledAmountLedger;
