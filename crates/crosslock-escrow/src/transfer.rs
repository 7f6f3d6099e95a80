//! Value-transfer primitive used by the escrow.
//!
//! A terminal transition hands its complete payout batch to a
//! [`FundsTransfer`] in one call. Implementations must be all-or-nothing:
//! either every payout lands or none does, so the escrow can abort the
//! transition without leaving funds half moved.

use std::collections::{HashMap, HashSet};

use crosslock_types::{AccountId, Amount, CrosslockError, Result};
use serde::{Deserialize, Serialize};

/// Why a payout is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutKind {
    /// Swap principal released to the maker.
    Principal,
    /// Safety deposit bond returned to the depositor.
    SafetyDeposit,
    /// Principal plus bond returned to the depositor on cancellation.
    Refund,
    /// Custody above the required total, returned to the depositor.
    Surplus,
}

impl std::fmt::Display for PayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Principal => write!(f, "PRINCIPAL"),
            Self::SafetyDeposit => write!(f, "SAFETY_DEPOSIT"),
            Self::Refund => write!(f, "REFUND"),
            Self::Surplus => write!(f, "SURPLUS"),
        }
    }
}

/// A single outgoing transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub recipient: AccountId,
    pub amount: Amount,
    pub kind: PayoutKind,
}

impl Payout {
    #[must_use]
    pub fn new(recipient: AccountId, amount: Amount, kind: PayoutKind) -> Self {
        Self {
            recipient,
            amount,
            kind,
        }
    }
}

/// Atomic transfer of a payout batch out of escrow custody.
pub trait FundsTransfer {
    /// Execute every payout or none of them.
    ///
    /// # Errors
    /// Any error means nothing was transferred.
    fn transfer(&mut self, payouts: &[Payout]) -> Result<()>;
}

/// In-memory transfer sink that credits recipients.
///
/// Recipients can be blocked to simulate a rejected transfer; a batch
/// touching a blocked recipient fails as a whole.
#[derive(Debug, Default)]
pub struct CustodyLedger {
    /// Amount received per account.
    credited: HashMap<AccountId, Amount>,
    /// Accounts whose incoming transfers are rejected.
    blocked: HashSet<AccountId>,
    /// Every payout applied, in order.
    history: Vec<Payout>,
}

impl CustodyLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject all future transfers to `account`.
    pub fn block(&mut self, account: AccountId) {
        self.blocked.insert(account);
    }

    pub fn unblock(&mut self, account: &AccountId) {
        self.blocked.remove(account);
    }

    /// Total credited to `account` so far.
    #[must_use]
    pub fn balance(&self, account: &AccountId) -> Amount {
        self.credited.get(account).copied().unwrap_or(0)
    }

    /// Sum of all applied payouts.
    #[must_use]
    pub fn total_paid(&self) -> Amount {
        self.history
            .iter()
            .fold(0, |acc: Amount, p| acc.saturating_add(p.amount))
    }

    #[must_use]
    pub fn history(&self) -> &[Payout] {
        &self.history
    }
}

impl FundsTransfer for CustodyLedger {
    fn transfer(&mut self, payouts: &[Payout]) -> Result<()> {
        // Validate the whole batch before touching any balance.
        let mut staged: HashMap<&AccountId, Amount> = HashMap::new();
        for payout in payouts {
            if self.blocked.contains(&payout.recipient) {
                return Err(CrosslockError::TransferFailed {
                    reason: format!("recipient {} rejects transfers", payout.recipient),
                });
            }
            let current = staged
                .get(&payout.recipient)
                .copied()
                .unwrap_or_else(|| self.balance(&payout.recipient));
            let next = current.checked_add(payout.amount).ok_or_else(|| {
                CrosslockError::TransferFailed {
                    reason: format!("balance overflow for {}", payout.recipient),
                }
            })?;
            staged.insert(&payout.recipient, next);
        }

        for (account, balance) in staged {
            self.credited.insert(account.clone(), balance);
        }
        self.history.extend_from_slice(payouts);
        Ok(())
    }
}
