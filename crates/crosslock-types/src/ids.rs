//! Identifiers and fixed-length byte fields used throughout Crosslock.
//!
//! Hash and address fields are stored as raw byte arrays. They parse from
//! hex with or without a `0x` prefix (case-insensitive) and always display
//! in the normalized `0x`-prefixed lowercase form.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{CrosslockError, Result, constants};

/// Decode a fixed-length hex field, accepting an optional `0x` / `0X` prefix.
fn parse_fixed_hex<const N: usize>(field: &'static str, input: &str) -> Result<[u8; N]> {
    if input.is_empty() {
        return Err(CrosslockError::InvalidFormat {
            field,
            reason: "cannot be empty".to_string(),
        });
    }

    let cleaned = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if cleaned.len() != N * 2 {
        return Err(CrosslockError::InvalidFormat {
            field,
            reason: format!(
                "must be {N} bytes ({} hex characters), got {} characters",
                N * 2,
                cleaned.len()
            ),
        });
    }

    let mut out = [0u8; N];
    hex::decode_to_slice(cleaned, &mut out).map_err(|err| CrosslockError::InvalidFormat {
        field,
        reason: format!("must contain only hex characters ({err})"),
    })?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// OrderHash
// ---------------------------------------------------------------------------

/// 32-byte identifier of the order a swap settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderHash(pub [u8; constants::ORDER_HASH_LEN]);

impl OrderHash {
    #[must_use]
    pub fn from_bytes(bytes: [u8; constants::ORDER_HASH_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; constants::ORDER_HASH_LEN] {
        &self.0
    }

    /// Normalized `0x…` hex form, used as the fill-ledger key.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for OrderHash {
    type Err = CrosslockError;

    fn from_str(s: &str) -> Result<Self> {
        parse_fixed_hex("order_hash", s).map(Self)
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Hashlock
// ---------------------------------------------------------------------------

/// SHA-256 commitment to a swap secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hashlock(pub [u8; constants::HASHLOCK_LEN]);

impl Hashlock {
    #[must_use]
    pub fn from_bytes(bytes: [u8; constants::HASHLOCK_LEN]) -> Self {
        Self(bytes)
    }

    /// Commit to a secret. The same function backs [`Hashlock::matches`].
    #[must_use]
    pub fn from_secret(secret: &[u8]) -> Self {
        Self(Sha256::digest(secret).into())
    }

    /// Does `candidate` hash to this commitment?
    #[must_use]
    pub fn matches(&self, candidate: &[u8]) -> bool {
        Self::from_secret(candidate) == *self
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; constants::HASHLOCK_LEN] {
        &self.0
    }
}

impl FromStr for Hashlock {
    type Err = CrosslockError;

    fn from_str(s: &str) -> Result<Self> {
        parse_fixed_hex("hashlock", s).map(Self)
    }
}

impl fmt::Display for Hashlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// TakerAddress
// ---------------------------------------------------------------------------

/// 20-byte counterparty address on the foreign chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TakerAddress(pub [u8; constants::TAKER_ADDRESS_LEN]);

impl TakerAddress {
    #[must_use]
    pub fn from_bytes(bytes: [u8; constants::TAKER_ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; constants::TAKER_ADDRESS_LEN] {
        &self.0
    }
}

impl FromStr for TakerAddress {
    type Err = CrosslockError;

    fn from_str(s: &str) -> Result<Self> {
        parse_fixed_hex("taker_address", s).map(Self)
    }
}

impl fmt::Display for TakerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of a local party (maker, depositor, caller).
///
/// Deserialization goes through [`AccountId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// # Errors
    /// Returns `InvalidFormat` if the identifier is empty or blank.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CrosslockError::InvalidFormat {
                field: "account_id",
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = CrosslockError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = CrosslockError;

    fn try_from(id: String) -> Result<Self> {
        Self::new(id)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// Preimage of a [`Hashlock`]. Arbitrary bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(Vec<u8>);

impl Secret {
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn hashlock(&self) -> Hashlock {
        Hashlock::from_secret(&self.0)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Secret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// The preimage must not reach logs before it is revealed on-chain.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({} bytes)", self.0.len())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Secret {
    /// Random 32-byte secret.
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>().to_vec())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl OrderHash {
    pub fn random() -> Self {
        Self(rand::random())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    /// Infallible constructor for test fixtures.
    pub fn dummy(name: &str) -> Self {
        Self(name.to_string())
    }
}
