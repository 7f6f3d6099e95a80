//! Immutable swap parameters.
//!
//! An [`ImmutableSwapParams`] is validated once and never changes. It names
//! the order being settled, the hashlock guarding release, both parties, and
//! the amounts held by the escrow.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, CrosslockError, Hashlock, OrderHash, Result, TakerAddress};

/// Write-once description of a single swap.
///
/// Deserialization re-runs [`ImmutableSwapParams::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSwapParams")]
pub struct ImmutableSwapParams {
    order_hash: OrderHash,
    hashlock: Hashlock,
    maker: AccountId,
    taker_address: TakerAddress,
    amount: Amount,
    safety_deposit: Amount,
}

impl ImmutableSwapParams {
    /// Build from already-typed fields.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero
    /// - `ArithmeticOverflow` if `amount + safety_deposit` does not fit
    pub fn new(
        order_hash: OrderHash,
        hashlock: Hashlock,
        maker: AccountId,
        taker_address: TakerAddress,
        amount: Amount,
        safety_deposit: Amount,
    ) -> Result<Self> {
        if amount == 0 {
            return Err(CrosslockError::InvalidAmount {
                reason: "amount must be greater than 0".to_string(),
            });
        }
        if amount.checked_add(safety_deposit).is_none() {
            return Err(CrosslockError::ArithmeticOverflow {
                operation: "amount + safety_deposit",
            });
        }

        Ok(Self {
            order_hash,
            hashlock,
            maker,
            taker_address,
            amount,
            safety_deposit,
        })
    }

    /// Build from raw hex / string inputs as received at the boundary.
    ///
    /// # Errors
    /// `InvalidFormat` for malformed hashes, addresses or accounts, plus
    /// everything [`ImmutableSwapParams::new`] rejects.
    pub fn parse(
        order_hash: &str,
        hashlock: &str,
        maker: &str,
        taker_address: &str,
        amount: Amount,
        safety_deposit: Amount,
    ) -> Result<Self> {
        Self::new(
            order_hash.parse()?,
            hashlock.parse()?,
            AccountId::new(maker)?,
            taker_address.parse()?,
            amount,
            safety_deposit,
        )
    }

    /// Principal plus safety deposit: the minimum the escrow must hold.
    #[must_use]
    pub fn total_required(&self) -> Amount {
        // Checked at construction.
        self.amount.saturating_add(self.safety_deposit)
    }

    /// Does `candidate` hash (SHA-256) to the stored hashlock?
    #[must_use]
    pub fn verify_secret(&self, candidate: &[u8]) -> bool {
        self.hashlock.matches(candidate)
    }

    #[must_use]
    pub fn order_hash(&self) -> OrderHash {
        self.order_hash
    }

    #[must_use]
    pub fn hashlock(&self) -> Hashlock {
        self.hashlock
    }

    #[must_use]
    pub fn maker(&self) -> &AccountId {
        &self.maker
    }

    #[must_use]
    pub fn taker_address(&self) -> TakerAddress {
        self.taker_address
    }

    #[must_use]
    pub fn amount(&self) -> Amount {
        self.amount
    }

    #[must_use]
    pub fn safety_deposit(&self) -> Amount {
        self.safety_deposit
    }
}

/// Wire form of [`ImmutableSwapParams`] before validation.
#[derive(Deserialize)]
struct RawSwapParams {
    order_hash: OrderHash,
    hashlock: Hashlock,
    maker: AccountId,
    taker_address: TakerAddress,
    amount: Amount,
    safety_deposit: Amount,
}

impl TryFrom<RawSwapParams> for ImmutableSwapParams {
    type Error = CrosslockError;

    fn try_from(raw: RawSwapParams) -> Result<Self> {
        Self::new(
            raw.order_hash,
            raw.hashlock,
            raw.maker,
            raw.taker_address,
            raw.amount,
            raw.safety_deposit,
        )
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl ImmutableSwapParams {
    /// Params locked to `secret`, with a random order hash and a fixed taker.
    pub fn dummy(
        secret: &crate::Secret,
        maker: &str,
        amount: Amount,
        safety_deposit: Amount,
    ) -> Self {
        Self {
            order_hash: OrderHash::random(),
            hashlock: secret.hashlock(),
            maker: AccountId::dummy(maker),
            taker_address: TakerAddress([0x6f; 20]),
            amount,
            safety_deposit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Secret;

    const ORDER_HASH: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
    const TAKER: &str = "0x6F1859694601891B7ED021c3Fefd390AB776d5C0";

    fn hashlock_hex(secret: &str) -> String {
        Secret::from(secret).hashlock().to_string()
    }

    #[test]
    fn parse_valid_params() {
        let params = ImmutableSwapParams::parse(
            ORDER_HASH,
            &hashlock_hex("s3cret"),
            "alice.near",
            TAKER,
            1_000,
            100,
        )
        .unwrap();
        assert_eq!(params.total_required(), 1_100);
        assert_eq!(params.order_hash().to_string(), ORDER_HASH);
        assert_eq!(
            params.taker_address().to_string(),
            "0x6f1859694601891b7ed021c3fefd390ab776d5c0"
        );
        assert_eq!(params.maker().as_str(), "alice.near");
    }

    #[test]
    fn zero_amount_rejected() {
        let err =
            ImmutableSwapParams::parse(ORDER_HASH, &hashlock_hex("x"), "alice", TAKER, 0, 10)
                .unwrap_err();
        assert!(matches!(err, CrosslockError::InvalidAmount { .. }));
    }

    #[test]
    fn zero_safety_deposit_allowed() {
        let params =
            ImmutableSwapParams::parse(ORDER_HASH, &hashlock_hex("x"), "alice", TAKER, 5, 0)
                .unwrap();
        assert_eq!(params.total_required(), 5);
    }

    #[test]
    fn overflowing_total_rejected() {
        let err = ImmutableSwapParams::parse(
            ORDER_HASH,
            &hashlock_hex("x"),
            "alice",
            TAKER,
            Amount::MAX,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, CrosslockError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn malformed_fields_rejected() {
        let short_taker = "0x6F1859694601891B7ED021c3Fefd390AB776d5";
        let err = ImmutableSwapParams::parse(
            ORDER_HASH,
            &hashlock_hex("x"),
            "alice",
            short_taker,
            1,
            0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::InvalidFormat {
                field: "taker_address",
                ..
            }
        ));

        let err = ImmutableSwapParams::parse(ORDER_HASH, "0xnothex", "alice", TAKER, 1, 0)
            .unwrap_err();
        assert!(err.is_validation());

        let err =
            ImmutableSwapParams::parse(ORDER_HASH, &hashlock_hex("x"), "", TAKER, 1, 0)
                .unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::InvalidFormat {
                field: "account_id",
                ..
            }
        ));
    }

    #[test]
    fn verify_secret_exact_match_only() {
        let secret = Secret::from("my_secret_123");
        let params = ImmutableSwapParams::dummy(&secret, "alice", 10, 1);
        assert!(params.verify_secret(secret.as_bytes()));
        assert!(!params.verify_secret(b"my_secret_12"));
        assert!(!params.verify_secret(b"MY_SECRET_123"));
    }

    #[test]
    fn serde_roundtrip() {
        let params = ImmutableSwapParams::dummy(&Secret::random(), "alice", 10, 1);
        let json = serde_json::to_string(&params).unwrap();
        let back: ImmutableSwapParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn tampered_json_rejected() {
        let params = ImmutableSwapParams::dummy(&Secret::random(), "alice", 10, 1);
        let valid = serde_json::to_value(&params).unwrap();

        let mut zero_amount = valid.clone();
        zero_amount["amount"] = serde_json::json!(0);
        let err = serde_json::from_value::<ImmutableSwapParams>(zero_amount).unwrap_err();
        assert!(err.to_string().contains("CL_ERR_101"), "Got: {err}");

        let mut empty_maker = valid;
        empty_maker["maker"] = serde_json::json!("");
        let err = serde_json::from_value::<ImmutableSwapParams>(empty_maker).unwrap_err();
        assert!(err.to_string().contains("CL_ERR_100"), "Got: {err}");

        let overflowing = serde_json::to_string(&params)
            .unwrap()
            .replace(r#""amount":10"#, &format!(r#""amount":{}"#, Amount::MAX));
        let err = serde_json::from_str::<ImmutableSwapParams>(&overflowing).unwrap_err();
        assert!(err.to_string().contains("CL_ERR_500"), "Got: {err}");
    }
}
