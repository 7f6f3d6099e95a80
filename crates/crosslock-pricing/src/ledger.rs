//! Cumulative fill bookkeeping for orders that live outside an escrow.
//!
//! Keys are opaque order-hash strings (normally [`OrderHash::to_hex`]).
//! Entries are created on first write and never removed.
//!
//! [`OrderHash::to_hex`]: crosslock_types::OrderHash::to_hex

use std::collections::BTreeMap;

use crosslock_types::{Amount, CrosslockError, Order, Result};
use serde::{Deserialize, Serialize};

/// Side table of filled amounts per order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilledAmountLedger {
    /// Order hash → cumulative filled amount.
    filled: BTreeMap<String, Amount>,
}

impl FilledAmountLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filled amount for `order_hash`, 0 if never recorded.
    #[must_use]
    pub fn get(&self, order_hash: &str) -> Amount {
        self.filled.get(order_hash).copied().unwrap_or(0)
    }

    /// Overwrite the filled amount. No monotonicity check; use
    /// [`FilledAmountLedger::record_fill`] for settlement updates.
    pub fn set(&mut self, order_hash: impl Into<String>, amount: Amount) {
        let order_hash = order_hash.into();
        tracing::debug!(order_hash = %order_hash, amount, "Filled amount set");
        self.filled.insert(order_hash, amount);
    }

    /// Add `fill` to the cumulative total and return the new total.
    ///
    /// # Errors
    /// - `ArithmeticOverflow` if the sum does not fit
    /// - `FillExceedsAvailable` if the total would exceed `making_amount`
    pub fn record_fill(
        &mut self,
        order_hash: &str,
        fill: Amount,
        making_amount: Amount,
    ) -> Result<Amount> {
        let filled = self.get(order_hash);
        let total = filled
            .checked_add(fill)
            .ok_or(CrosslockError::ArithmeticOverflow {
                operation: "filled_amount + fill",
            })?;
        if total > making_amount {
            return Err(CrosslockError::FillExceedsAvailable {
                filled,
                fill,
                making: making_amount,
            });
        }

        self.filled.insert(order_hash.to_string(), total);
        tracing::debug!(order_hash, fill, total, making_amount, "Fill recorded");
        Ok(total)
    }

    /// Load the ledger's filled amount into `order`.
    ///
    /// # Errors
    /// `InvalidOrder` if the recorded amount exceeds the order size; the
    /// order is left untouched.
    pub fn apply_to(&self, order: &mut Order) -> Result<()> {
        let filled = self.get(&order.order_hash().to_hex());
        if filled > order.making_amount {
            return Err(CrosslockError::InvalidOrder {
                reason: format!(
                    "ledger fill {filled} exceeds making_amount {}",
                    order.making_amount
                ),
            });
        }
        order.filled_amount = filled;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.filled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filled.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> {
        self.filled.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// # Errors
    /// `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    /// `Serialization` for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
