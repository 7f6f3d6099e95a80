//! Partially fillable order as seen by the Dutch-auction pricer.
//!
//! The pricer only ever reads `filled_amount`; the settlement layer owns it
//! and bumps it after every partial execution.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, Amount, CrosslockError, OrderHash, Result, constants};

/// A maker order with its cumulative fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub salt: u64,
    pub maker: AccountId,
    pub receiver: AccountId,
    /// Native asset symbol or token contract identifier.
    pub asset_identifier: String,
    pub making_amount: Amount,
    pub filled_amount: Amount,
}

impl Order {
    /// # Errors
    /// `InvalidOrder` if `filled_amount > making_amount`.
    pub fn new(
        salt: u64,
        maker: AccountId,
        receiver: AccountId,
        asset_identifier: impl Into<String>,
        making_amount: Amount,
        filled_amount: Amount,
    ) -> Result<Self> {
        let order = Self {
            salt,
            maker,
            receiver,
            asset_identifier: asset_identifier.into(),
            making_amount,
            filled_amount,
        };
        order.validate()?;
        Ok(order)
    }

    /// Check `filled_amount <= making_amount`.
    ///
    /// # Errors
    /// `InvalidOrder` on violation.
    pub fn validate(&self) -> Result<()> {
        if self.filled_amount > self.making_amount {
            return Err(CrosslockError::InvalidOrder {
                reason: format!(
                    "filled_amount {} exceeds making_amount {}",
                    self.filled_amount, self.making_amount
                ),
            });
        }
        Ok(())
    }

    /// Unfilled portion, `making_amount - filled_amount`.
    ///
    /// # Errors
    /// `InvalidOrder` if the fill invariant is broken.
    pub fn available(&self) -> Result<Amount> {
        self.making_amount
            .checked_sub(self.filled_amount)
            .ok_or_else(|| CrosslockError::InvalidOrder {
                reason: format!(
                    "filled_amount {} exceeds making_amount {}",
                    self.filled_amount, self.making_amount
                ),
            })
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.filled_amount >= self.making_amount
    }

    /// Deterministic identifier over the order's immutable fields.
    ///
    /// `filled_amount` is excluded so the hash stays stable across fills.
    #[must_use]
    pub fn order_hash(&self) -> OrderHash {
        let mut hasher = Sha256::new();
        hasher.update(constants::ORDER_HASH_DOMAIN);
        hasher.update(self.salt.to_le_bytes());
        // length-prefix variable fields so concatenations can't collide
        for field in [
            self.maker.as_str(),
            self.receiver.as_str(),
            self.asset_identifier.as_str(),
        ] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.update(self.making_amount.to_le_bytes());
        OrderHash(hasher.finalize().into())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(making_amount: Amount, filled_amount: Amount) -> Self {
        Self {
            salt: rand::random(),
            maker: AccountId::dummy("maker.near"),
            receiver: AccountId::dummy("receiver.near"),
            asset_identifier: "NEAR".to_string(),
            making_amount,
            filled_amount,
        }
    }
}
