//! Dutch-auction price curve and partial-fill sizing.
//!
//! ## Price
//!
//! ```text
//!  price
//!    │ start ────╮
//!    │            ╲
//!    │             ╲
//!    │              ╰──── end
//!    └──────┬────────┬──────▶ now
//!         start     end
//! ```
//!
//! Clamped to `start_price` before the window and `end_price` after it.
//! Rising curves (`end_price > start_price`) are interpolated the same way.
//!
//! ## Fill
//!
//! `fill = min(available * counter / price, available)` with truncating
//! division, where `available = making_amount - filled_amount`.

use crosslock_types::{Amount, CrosslockError, Order, Result, Timestamp};
use serde::{Deserialize, Serialize};

/// Price at `now` on the line from `(start_time, start_price)` to
/// `(end_time, end_price)`.
///
/// `now` is clamped first: `start_price` at or before `start_time`,
/// `end_price` at or after `end_time`. An empty or inverted span that gets
/// past the clamps yields `end_price`, so the division never sees a
/// non-positive denominator.
///
/// # Errors
/// `ArithmeticOverflow` if `price_delta * elapsed` does not fit in a `u128`.
pub fn calc_price(
    start_time: Timestamp,
    end_time: Timestamp,
    start_price: Amount,
    end_price: Amount,
    now: Timestamp,
) -> Result<Amount> {
    if now <= start_time {
        return Ok(start_price);
    }
    if now >= end_time || end_time <= start_time {
        return Ok(end_price);
    }

    let span = Amount::from(end_time - start_time);
    let elapsed = Amount::from(now - start_time);

    let price = if start_price >= end_price {
        let drop = (start_price - end_price)
            .checked_mul(elapsed)
            .ok_or(CrosslockError::ArithmeticOverflow {
                operation: "price_range * elapsed",
            })?
            / span;
        start_price - drop
    } else {
        let rise = (end_price - start_price)
            .checked_mul(elapsed)
            .ok_or(CrosslockError::ArithmeticOverflow {
                operation: "price_range * elapsed",
            })?
            / span;
        start_price + rise
    };

    tracing::debug!(start_time, end_time, start_price, end_price, now, price, "Auction price");
    Ok(price)
}

/// Unfilled portion of `order`.
///
/// # Errors
/// `InvalidOrder` if `filled_amount > making_amount`.
pub fn remaining(order: &Order) -> Result<Amount> {
    order.available()
}

/// Making amount a taker receives for `counter_amount` at `current_price`.
///
/// A zero price fills nothing. The result never exceeds what is left of
/// the order.
///
/// # Errors
/// - `InvalidOrder` if the order is overfilled
/// - `ArithmeticOverflow` if the product cannot be evaluated in `u128`
pub fn resolve_fill(order: &Order, current_price: Amount, counter_amount: Amount) -> Result<Amount> {
    let available = order.available()?;
    if current_price == 0 || available == 0 {
        return Ok(0);
    }

    // available * counter / price >= available
    if counter_amount >= current_price {
        return Ok(available);
    }

    let requested = match available.checked_mul(counter_amount) {
        Some(product) => product / current_price,
        None => {
            // (q*p + r) * c / p == q*c + r*c/p, and q*c < available since c < p
            let q = available / current_price;
            let r = available % current_price;
            let tail = r
                .checked_mul(counter_amount)
                .ok_or(CrosslockError::ArithmeticOverflow {
                    operation: "available * counter_amount",
                })?
                / current_price;
            q * counter_amount + tail
        }
    };

    let fill = requested.min(available);
    tracing::debug!(
        available,
        current_price,
        counter_amount,
        fill,
        "Resolved partial fill"
    );
    Ok(fill)
}

// ---------------------------------------------------------------------------
// AuctionWindow
// ---------------------------------------------------------------------------

/// Start and end of the price decay, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuctionWindow {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl AuctionWindow {
    #[must_use]
    pub fn new(start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Unpack `start << 64 | end`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_packed(times: u128) -> Self {
        Self {
            start_time: (times >> 64) as u64,
            end_time: times as u64,
        }
    }

    /// Pack into `start << 64 | end`.
    #[must_use]
    pub fn packed(&self) -> u128 {
        (u128::from(self.start_time) << 64) | u128::from(self.end_time)
    }

    #[must_use]
    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    #[must_use]
    pub fn contains(&self, now: Timestamp) -> bool {
        (self.start_time..self.end_time).contains(&now)
    }
}

// ---------------------------------------------------------------------------
// DutchAuction
// ---------------------------------------------------------------------------

/// A single auction's price curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutchAuction {
    window: AuctionWindow,
    start_price: Amount,
    end_price: Amount,
}

impl DutchAuction {
    /// # Errors
    /// `DivisionGuard` if the window ends before it starts.
    pub fn new(window: AuctionWindow, start_price: Amount, end_price: Amount) -> Result<Self> {
        if window.start_time > window.end_time {
            return Err(CrosslockError::DivisionGuard {
                reason: format!(
                    "auction ends at {} before it starts at {}",
                    window.end_time, window.start_time
                ),
            });
        }
        Ok(Self {
            window,
            start_price,
            end_price,
        })
    }

    /// Build from the packed `times` word.
    ///
    /// # Errors
    /// See [`DutchAuction::new`].
    pub fn from_packed(times: u128, start_price: Amount, end_price: Amount) -> Result<Self> {
        Self::new(AuctionWindow::from_packed(times), start_price, end_price)
    }

    /// # Errors
    /// `ArithmeticOverflow`, see [`calc_price`].
    pub fn price_at(&self, now: Timestamp) -> Result<Amount> {
        calc_price(
            self.window.start_time,
            self.window.end_time,
            self.start_price,
            self.end_price,
            now,
        )
    }

    /// Fill for `counter_amount` against `order` at time `now`.
    ///
    /// # Errors
    /// See [`calc_price`] and [`resolve_fill`].
    pub fn making_amount(
        &self,
        order: &Order,
        counter_amount: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        let price = self.price_at(now)?;
        resolve_fill(order, price, counter_amount)
    }

    #[must_use]
    pub fn window(&self) -> AuctionWindow {
        self.window
    }

    #[must_use]
    pub fn start_price(&self) -> Amount {
        self.start_price
    }

    #[must_use]
    pub fn end_price(&self) -> Amount {
        self.end_price
    }
}
