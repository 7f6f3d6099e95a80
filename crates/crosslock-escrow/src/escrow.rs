//! # SwapEscrow: hashlock/timelock escrow state machine
//!
//! ```text
//!   ┌───────────────┐ initialize ┌─────────────┐  withdraw / public_withdraw  ┌───────────┐
//!   │ UNINITIALIZED ├───────────▶│ INITIALIZED ├─────────────────────────────▶│ WITHDRAWN │
//!   └───────────────┘            └──────┬──────┘                              └───────────┘
//!                                       │ cancel / emergency_refund
//!                                       ▼
//!                                 ┌───────────┐
//!                                 │ CANCELLED │
//!                                 └───────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Terminal first**: every transition checks WITHDRAWN / CANCELLED before
//!   anything else, so a racing second resolution fails instead of paying twice
//! - **Atomic**: guards run, then the payout batch is handed to the
//!   [`FundsTransfer`] sink, and state changes only after the sink succeeds
//! - **Bond returned**: the safety deposit and any surplus go back to the
//!   depositor on every resolution path

use crosslock_types::{
    AccountId, Amount, CrosslockError, EscrowConfig, Hashlock, ImmutableSwapParams, OrderHash,
    Result, Secret, TakerAddress, TimelockSchedule, TimelockStage, TimelockStatus, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::transfer::{FundsTransfer, Payout, PayoutKind};

/// Lifecycle state of a [`SwapEscrow`].
///
/// Transitions are **monotonic**:
/// - `Uninitialized → Initialized`
/// - `Initialized → Withdrawn | Cancelled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowState {
    Uninitialized,
    Initialized,
    /// Principal released to the maker. **Terminal.**
    Withdrawn,
    /// Funds refunded to the depositor. **Terminal.**
    Cancelled,
}

impl EscrowState {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Uninitialized, Self::Initialized)
                | (Self::Initialized, Self::Withdrawn | Self::Cancelled)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Withdrawn | Self::Cancelled)
    }
}

impl std::fmt::Display for EscrowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Initialized => write!(f, "INITIALIZED"),
            Self::Withdrawn => write!(f, "WITHDRAWN"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Everything fixed at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EscrowTerms {
    params: ImmutableSwapParams,
    schedule: TimelockSchedule,
    depositor: AccountId,
}

/// One swap's escrow. Owned by its host and mutated only through the
/// transition methods below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEscrow {
    config: EscrowConfig,
    state: EscrowState,
    terms: Option<EscrowTerms>,
    /// Total ever paid in (initial funding plus later deposits).
    deposited_amount: Amount,
    /// Currently held; drops to zero on resolution.
    custody: Amount,
    revealed_secret: Option<Secret>,
}

impl SwapEscrow {
    /// Create an uninitialized escrow.
    #[must_use]
    pub fn new(config: EscrowConfig) -> Self {
        Self {
            config,
            state: EscrowState::Uninitialized,
            terms: None,
            deposited_amount: 0,
            custody: 0,
            revealed_secret: None,
        }
    }

    /// Create and initialize in one step.
    ///
    /// # Errors
    /// See [`SwapEscrow::initialize`].
    pub fn open(
        config: EscrowConfig,
        params: ImmutableSwapParams,
        schedule: TimelockSchedule,
        funding_amount: Amount,
        depositor: AccountId,
    ) -> Result<Self> {
        let mut escrow = Self::new(config);
        escrow.initialize(params, schedule, funding_amount, depositor)?;
        Ok(escrow)
    }

    // =================================================================
    // Transitions
    // =================================================================

    /// Store the swap terms and record the initial funding.
    ///
    /// # Errors
    /// - `AlreadyWithdrawn` / `AlreadyCancelled` / `AlreadyInitialized`
    /// - `Configuration` / `TimelockOrdering` if `schedule` falls outside the
    ///   configured [`crosslock_types::TimelockPolicy`]
    /// - `InsufficientFunds` if `funding_amount < params.total_required()`
    pub fn initialize(
        &mut self,
        params: ImmutableSwapParams,
        schedule: TimelockSchedule,
        funding_amount: Amount,
        depositor: AccountId,
    ) -> Result<()> {
        self.ensure_not_terminal()?;
        if self.state != EscrowState::Uninitialized {
            return Err(CrosslockError::AlreadyInitialized);
        }

        if let Err(err) = schedule.conforms_to(&self.config.timelocks) {
            tracing::warn!(
                order_hash = %params.order_hash(),
                error = %err,
                "Schedule rejected by escrow timelock policy"
            );
            return Err(err);
        }

        let needed = params.total_required();
        if funding_amount < needed {
            return Err(CrosslockError::InsufficientFunds {
                needed,
                supplied: funding_amount,
            });
        }

        tracing::info!(
            order_hash = %params.order_hash(),
            maker = %params.maker(),
            depositor = %depositor,
            amount = params.amount(),
            safety_deposit = params.safety_deposit(),
            funding = funding_amount,
            withdrawal_at = schedule.withdrawal_at(),
            cancellation_at = schedule.cancellation_at(),
            "Escrow initialized"
        );

        self.terms = Some(EscrowTerms {
            params,
            schedule,
            depositor,
        });
        self.deposited_amount = funding_amount;
        self.custody = funding_amount;
        self.state = EscrowState::Initialized;
        Ok(())
    }

    /// Accept additional funds into custody.
    ///
    /// A single deposit must cover the full required total; smaller amounts
    /// are refused rather than accumulated towards it.
    ///
    /// # Errors
    /// - terminal / `NotInitialized` guards
    /// - `InsufficientFunds` if `amount < total_required()`
    /// - `ArithmeticOverflow` if custody would overflow
    pub fn deposit(&mut self, amount: Amount) -> Result<()> {
        let terms = self.active_terms()?;
        let needed = terms.params.total_required();
        if amount < needed {
            return Err(CrosslockError::InsufficientFunds {
                needed,
                supplied: amount,
            });
        }

        let custody = self
            .custody
            .checked_add(amount)
            .ok_or(CrosslockError::ArithmeticOverflow {
                operation: "custody + deposit",
            })?;
        let deposited =
            self.deposited_amount
                .checked_add(amount)
                .ok_or(CrosslockError::ArithmeticOverflow {
                    operation: "deposited_amount + deposit",
                })?;

        tracing::info!(
            order_hash = %terms.params.order_hash(),
            amount,
            custody,
            "Escrow deposit recorded"
        );

        self.custody = custody;
        self.deposited_amount = deposited;
        Ok(())
    }

    /// Private-stage withdrawal: reveal the secret and release the principal
    /// to the maker.
    ///
    /// # Errors
    /// - terminal / `NotInitialized` guards
    /// - `InvalidSecret` if `secret` does not hash to the hashlock
    /// - `TimelockNotReached` before `withdrawal_at`
    /// - `Unauthorized` if the policy restricts this stage to the maker
    /// - `TransferFailed` if the sink rejects the payouts
    pub fn withdraw(
        &mut self,
        secret: &Secret,
        now: Timestamp,
        caller: &AccountId,
        sink: &mut impl FundsTransfer,
    ) -> Result<()> {
        let terms = self.active_terms()?;
        Self::verify_secret(terms, secret)?;
        terms.schedule.check(TimelockStage::Withdrawal, now)?;

        if self.config.private_withdrawal_requires_maker && caller != terms.params.maker() {
            tracing::warn!(
                order_hash = %terms.params.order_hash(),
                caller = %caller,
                maker = %terms.params.maker(),
                "Private withdrawal by non-maker rejected"
            );
            return Err(CrosslockError::Unauthorized {
                caller: caller.clone(),
                expected: terms.params.maker().clone(),
            });
        }

        self.release(secret, sink, TimelockStage::Withdrawal)
    }

    /// Public-stage withdrawal: anyone holding the secret may release the
    /// principal to the maker.
    ///
    /// # Errors
    /// - terminal / `NotInitialized` guards
    /// - `InvalidSecret` if `secret` does not hash to the hashlock
    /// - `StageNotScheduled` if the schedule has no public stage
    /// - `TimelockNotReached` before `public_withdrawal_at`
    /// - `TransferFailed` if the sink rejects the payouts
    pub fn public_withdraw(
        &mut self,
        secret: &Secret,
        now: Timestamp,
        sink: &mut impl FundsTransfer,
    ) -> Result<()> {
        let terms = self.active_terms()?;
        Self::verify_secret(terms, secret)?;
        terms.schedule.check(TimelockStage::PublicWithdrawal, now)?;

        self.release(secret, sink, TimelockStage::PublicWithdrawal)
    }

    /// Refund the depositor once the cancellation stage opens. Callable by
    /// anyone.
    ///
    /// # Errors
    /// - terminal / `NotInitialized` guards
    /// - `TimelockNotReached` before `cancellation_at`
    /// - `TransferFailed` if the sink rejects the payouts
    pub fn cancel(&mut self, now: Timestamp, sink: &mut impl FundsTransfer) -> Result<()> {
        let terms = self.active_terms()?;
        terms.schedule.check(TimelockStage::Cancellation, now)?;

        self.refund(sink, TimelockStage::Cancellation)
    }

    /// Depositor-only refund after `cancellation_at + emergency_offset`.
    ///
    /// # Errors
    /// - terminal / `NotInitialized` guards
    /// - `Unauthorized` unless `caller` is the depositor
    /// - `TimelockNotReached` before the emergency deadline
    /// - `TransferFailed` if the sink rejects the payouts
    pub fn emergency_refund(
        &mut self,
        now: Timestamp,
        caller: &AccountId,
        sink: &mut impl FundsTransfer,
    ) -> Result<()> {
        let terms = self.active_terms()?;
        if caller != &terms.depositor {
            tracing::warn!(
                order_hash = %terms.params.order_hash(),
                caller = %caller,
                depositor = %terms.depositor,
                "Emergency refund by non-depositor rejected"
            );
            return Err(CrosslockError::Unauthorized {
                caller: caller.clone(),
                expected: terms.depositor.clone(),
            });
        }
        terms.schedule.check(TimelockStage::Emergency, now)?;

        self.refund(sink, TimelockStage::Emergency)
    }

    // =================================================================
    // Internals
    // =================================================================

    fn ensure_not_terminal(&self) -> Result<()> {
        match self.state {
            EscrowState::Withdrawn => Err(CrosslockError::AlreadyWithdrawn),
            EscrowState::Cancelled => Err(CrosslockError::AlreadyCancelled),
            EscrowState::Uninitialized | EscrowState::Initialized => Ok(()),
        }
    }

    /// Terminal guard, then initialization guard.
    fn active_terms(&self) -> Result<&EscrowTerms> {
        self.ensure_not_terminal()?;
        match (&self.state, &self.terms) {
            (EscrowState::Initialized, Some(terms)) => Ok(terms),
            (EscrowState::Initialized, None) => Err(CrosslockError::Internal(
                "initialized escrow without terms".to_string(),
            )),
            _ => Err(CrosslockError::NotInitialized),
        }
    }

    fn verify_secret(terms: &EscrowTerms, secret: &Secret) -> Result<()> {
        if terms.params.verify_secret(secret.as_bytes()) {
            Ok(())
        } else {
            tracing::warn!(
                order_hash = %terms.params.order_hash(),
                "Secret does not match hashlock"
            );
            Err(CrosslockError::InvalidSecret)
        }
    }

    /// Custody held above `amount + safety_deposit`.
    fn surplus(&self, terms: &EscrowTerms) -> Result<Amount> {
        self.custody
            .checked_sub(terms.params.total_required())
            .ok_or_else(|| {
                CrosslockError::Internal(format!(
                    "custody {} below required {}",
                    self.custody,
                    terms.params.total_required()
                ))
            })
    }

    fn release(
        &mut self,
        secret: &Secret,
        sink: &mut impl FundsTransfer,
        stage: TimelockStage,
    ) -> Result<()> {
        let terms = self.active_terms()?;
        let surplus = self.surplus(terms)?;

        let mut payouts = vec![Payout::new(
            terms.params.maker().clone(),
            terms.params.amount(),
            PayoutKind::Principal,
        )];
        if terms.params.safety_deposit() > 0 {
            payouts.push(Payout::new(
                terms.depositor.clone(),
                terms.params.safety_deposit(),
                PayoutKind::SafetyDeposit,
            ));
        }
        if surplus > 0 {
            payouts.push(Payout::new(
                terms.depositor.clone(),
                surplus,
                PayoutKind::Surplus,
            ));
        }

        self.settle(sink, &payouts, EscrowState::Withdrawn, stage)?;
        self.revealed_secret = Some(secret.clone());
        Ok(())
    }

    fn refund(&mut self, sink: &mut impl FundsTransfer, stage: TimelockStage) -> Result<()> {
        let terms = self.active_terms()?;
        let surplus = self.surplus(terms)?;

        let mut payouts = vec![Payout::new(
            terms.depositor.clone(),
            terms.params.total_required(),
            PayoutKind::Refund,
        )];
        if surplus > 0 {
            payouts.push(Payout::new(
                terms.depositor.clone(),
                surplus,
                PayoutKind::Surplus,
            ));
        }

        self.settle(sink, &payouts, EscrowState::Cancelled, stage)
    }

    /// Run the payout batch, then commit the terminal state. Nothing is
    /// mutated if the sink fails.
    fn settle(
        &mut self,
        sink: &mut impl FundsTransfer,
        payouts: &[Payout],
        target: EscrowState,
        stage: TimelockStage,
    ) -> Result<()> {
        debug_assert!(self.state.can_transition_to(target));
        let order_hash = self.order_hash().map(|h| h.to_hex()).unwrap_or_default();

        if let Err(err) = sink.transfer(payouts) {
            tracing::warn!(
                order_hash = %order_hash,
                %stage,
                error = %err,
                "Payout failed, escrow state unchanged"
            );
            return Err(err);
        }

        let paid = payouts
            .iter()
            .fold(0, |acc: Amount, p| acc.saturating_add(p.amount));
        self.custody = self.custody.saturating_sub(paid);
        self.state = target;

        tracing::info!(
            order_hash = %order_hash,
            %stage,
            state = %target,
            paid,
            payouts = payouts.len(),
            "Escrow resolved"
        );
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn status(&self) -> EscrowState {
        self.state
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.terms.is_some()
    }

    /// Initialized and not yet resolved.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == EscrowState::Initialized
    }

    #[must_use]
    pub fn is_withdrawn(&self) -> bool {
        self.state == EscrowState::Withdrawn
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state == EscrowState::Cancelled
    }

    /// Timelock window at `now`; `None` before initialization.
    #[must_use]
    pub fn timelock_status(&self, now: Timestamp) -> Option<TimelockStatus> {
        self.schedule().map(|s| s.status(now))
    }

    /// Would a private withdrawal pass the state and timelock guards at `now`?
    #[must_use]
    pub fn can_withdraw_now(&self, now: Timestamp) -> bool {
        self.is_active() && self.schedule().is_some_and(|s| s.can_withdraw(now))
    }

    /// Would `cancel` pass the state and timelock guards at `now`?
    #[must_use]
    pub fn can_cancel_now(&self, now: Timestamp) -> bool {
        self.is_active() && self.schedule().is_some_and(|s| s.can_cancel(now))
    }

    #[must_use]
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    #[must_use]
    pub fn params(&self) -> Option<&ImmutableSwapParams> {
        self.terms.as_ref().map(|t| &t.params)
    }

    #[must_use]
    pub fn schedule(&self) -> Option<&TimelockSchedule> {
        self.terms.as_ref().map(|t| &t.schedule)
    }

    #[must_use]
    pub fn depositor(&self) -> Option<&AccountId> {
        self.terms.as_ref().map(|t| &t.depositor)
    }

    #[must_use]
    pub fn order_hash(&self) -> Option<OrderHash> {
        self.params().map(ImmutableSwapParams::order_hash)
    }

    #[must_use]
    pub fn hashlock(&self) -> Option<Hashlock> {
        self.params().map(ImmutableSwapParams::hashlock)
    }

    #[must_use]
    pub fn maker(&self) -> Option<&AccountId> {
        self.params().map(ImmutableSwapParams::maker)
    }

    #[must_use]
    pub fn taker_address(&self) -> Option<TakerAddress> {
        self.params().map(ImmutableSwapParams::taker_address)
    }

    #[must_use]
    pub fn amount(&self) -> Option<Amount> {
        self.params().map(ImmutableSwapParams::amount)
    }

    #[must_use]
    pub fn safety_deposit(&self) -> Option<Amount> {
        self.params().map(ImmutableSwapParams::safety_deposit)
    }

    #[must_use]
    pub fn withdrawal_at(&self) -> Option<Timestamp> {
        self.schedule().map(TimelockSchedule::withdrawal_at)
    }

    #[must_use]
    pub fn public_withdrawal_at(&self) -> Option<Timestamp> {
        self.schedule().and_then(TimelockSchedule::public_withdrawal_at)
    }

    #[must_use]
    pub fn cancellation_at(&self) -> Option<Timestamp> {
        self.schedule().map(TimelockSchedule::cancellation_at)
    }

    #[must_use]
    pub fn created_at(&self) -> Option<Timestamp> {
        self.schedule().map(TimelockSchedule::created_at)
    }

    #[must_use]
    pub fn deposited_amount(&self) -> Amount {
        self.deposited_amount
    }

    #[must_use]
    pub fn custody(&self) -> Amount {
        self.custody
    }

    /// Set exactly once, by a successful withdrawal.
    #[must_use]
    pub fn revealed_secret(&self) -> Option<&Secret> {
        self.revealed_secret.as_ref()
    }
}

impl Default for SwapEscrow {
    fn default() -> Self {
        Self::new(EscrowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use crosslock_types::TimelockPolicy;

    use super::*;
    use crate::transfer::CustodyLedger;

    const AMOUNT: Amount = 1_000;
    const BOND: Amount = 100;

    struct Fixture {
        escrow: SwapEscrow,
        sink: CustodyLedger,
        secret: Secret,
        maker: AccountId,
        depositor: AccountId,
    }

    /// Schedule 0 / 100 / 150 / 200, simplified policy (emergency +7000).
    fn setup_with(config: EscrowConfig, funding: Amount) -> Fixture {
        let secret = Secret::from("my_secret_123");
        let params = ImmutableSwapParams::dummy(&secret, "maker.near", AMOUNT, BOND);
        let schedule =
            TimelockSchedule::new(100, Some(150), 200, 0, &TimelockPolicy::simplified()).unwrap();
        let depositor = AccountId::dummy("resolver.near");
        let escrow =
            SwapEscrow::open(config, params, schedule, funding, depositor.clone()).unwrap();
        Fixture {
            escrow,
            sink: CustodyLedger::new(),
            secret,
            maker: AccountId::dummy("maker.near"),
            depositor,
        }
    }

    fn setup() -> Fixture {
        setup_with(EscrowConfig::simplified(), AMOUNT + BOND)
    }

    struct FailingSink;

    impl FundsTransfer for FailingSink {
        fn transfer(&mut self, _payouts: &[Payout]) -> Result<()> {
            Err(CrosslockError::TransferFailed {
                reason: "sink offline".to_string(),
            })
        }
    }

    #[test]
    fn state_transitions_valid() {
        assert!(EscrowState::Uninitialized.can_transition_to(EscrowState::Initialized));
        assert!(EscrowState::Initialized.can_transition_to(EscrowState::Withdrawn));
        assert!(EscrowState::Initialized.can_transition_to(EscrowState::Cancelled));
    }

    #[test]
    fn state_transitions_invalid() {
        assert!(!EscrowState::Withdrawn.can_transition_to(EscrowState::Cancelled));
        assert!(!EscrowState::Cancelled.can_transition_to(EscrowState::Withdrawn));
        assert!(!EscrowState::Uninitialized.can_transition_to(EscrowState::Withdrawn));
        assert!(!EscrowState::Initialized.can_transition_to(EscrowState::Uninitialized));
    }

    #[test]
    fn initialize_records_funding() {
        let f = setup();
        assert!(f.escrow.is_active());
        assert!(f.escrow.is_initialized());
        assert_eq!(f.escrow.deposited_amount(), 1_100);
        assert_eq!(f.escrow.custody(), 1_100);
        assert_eq!(f.escrow.depositor(), Some(&f.depositor));
        assert_eq!(f.escrow.maker(), Some(&f.maker));
        assert_eq!(f.escrow.amount(), Some(AMOUNT));
        assert_eq!(f.escrow.safety_deposit(), Some(BOND));
        assert_eq!(f.escrow.withdrawal_at(), Some(100));
        assert_eq!(f.escrow.public_withdrawal_at(), Some(150));
        assert_eq!(f.escrow.cancellation_at(), Some(200));
        assert_eq!(f.escrow.created_at(), Some(0));
        assert_eq!(f.escrow.hashlock(), Some(f.secret.hashlock()));
        assert!(f.escrow.revealed_secret().is_none());
    }

    #[test]
    fn initialize_underfunded_rejected() {
        let secret = Secret::random();
        let params = ImmutableSwapParams::dummy(&secret, "maker", AMOUNT, BOND);
        let schedule =
            TimelockSchedule::new(100, None, 200, 0, &TimelockPolicy::simplified()).unwrap();
        let mut escrow = SwapEscrow::new(EscrowConfig::simplified());
        let err = escrow
            .initialize(params, schedule, AMOUNT + BOND - 1, AccountId::dummy("r"))
            .unwrap_err();
        assert_eq!(
            err,
            CrosslockError::InsufficientFunds {
                needed: 1_100,
                supplied: 1_099,
            }
        );
        assert_eq!(escrow.status(), EscrowState::Uninitialized);
        assert_eq!(escrow.custody(), 0);
    }

    #[test]
    fn schedule_outside_policy_rejected() {
        let secret = Secret::random();
        let depositor = AccountId::dummy("resolver.near");
        // Opens 1s after creation with the short emergency offset.
        let loose =
            TimelockSchedule::new(1, None, 200, 0, &TimelockPolicy::simplified()).unwrap();

        let mut escrow = SwapEscrow::new(EscrowConfig::standard());
        let err = escrow
            .initialize(
                ImmutableSwapParams::dummy(&secret, "maker", AMOUNT, BOND),
                loose,
                AMOUNT + BOND,
                depositor.clone(),
            )
            .unwrap_err();
        assert!(matches!(err, CrosslockError::Configuration(_)));
        assert_eq!(escrow.status(), EscrowState::Uninitialized);
        assert_eq!(escrow.custody(), 0);

        // Same offset but a withdrawal delay below the standard minimum.
        let early = TimelockSchedule::new(
            1,
            None,
            200,
            0,
            &TimelockPolicy {
                min_withdrawal_delay: 0,
                ..TimelockPolicy::standard()
            },
        )
        .unwrap();
        let err = escrow
            .initialize(
                ImmutableSwapParams::dummy(&secret, "maker", AMOUNT, BOND),
                early,
                AMOUNT + BOND,
                depositor.clone(),
            )
            .unwrap_err();
        assert!(matches!(err, CrosslockError::TimelockOrdering { .. }));

        // The escrow never opened, so no emergency refund can drain it.
        let err = escrow
            .emergency_refund(200 + 7_000, &depositor, &mut CustodyLedger::new())
            .unwrap_err();
        assert_eq!(err, CrosslockError::NotInitialized);
    }

    #[test]
    fn tampered_escrow_json_rejected() {
        let f = setup();
        let mut value = serde_json::to_value(&f.escrow).unwrap();
        value["terms"]["params"]["maker"] = serde_json::json!("");
        assert!(serde_json::from_value::<SwapEscrow>(value).is_err());

        let mut value = serde_json::to_value(&f.escrow).unwrap();
        value["terms"]["schedule"]["withdrawal_at"] = serde_json::json!(500);
        assert!(serde_json::from_value::<SwapEscrow>(value).is_err());
    }

    #[test]
    fn double_initialize_rejected() {
        let mut f = setup();
        let params = f.escrow.params().unwrap().clone();
        let schedule = *f.escrow.schedule().unwrap();
        let err = f
            .escrow
            .initialize(params, schedule, 5_000, f.depositor.clone())
            .unwrap_err();
        assert_eq!(err, CrosslockError::AlreadyInitialized);
        assert_eq!(f.escrow.custody(), 1_100);
    }

    #[test]
    fn uninitialized_rejects_everything() {
        let mut escrow = SwapEscrow::default();
        let mut sink = CustodyLedger::new();
        let who = AccountId::dummy("x");
        let secret = Secret::from("s");
        assert_eq!(escrow.deposit(10), Err(CrosslockError::NotInitialized));
        assert_eq!(
            escrow.withdraw(&secret, 1_000, &who, &mut sink),
            Err(CrosslockError::NotInitialized)
        );
        assert_eq!(
            escrow.public_withdraw(&secret, 1_000, &mut sink),
            Err(CrosslockError::NotInitialized)
        );
        assert_eq!(
            escrow.cancel(1_000, &mut sink),
            Err(CrosslockError::NotInitialized)
        );
        assert_eq!(
            escrow.emergency_refund(100_000, &who, &mut sink),
            Err(CrosslockError::NotInitialized)
        );
        assert_eq!(escrow.timelock_status(0), None);
        assert!(!escrow.can_withdraw_now(1_000));
    }

    #[test]
    fn withdraw_pays_maker_and_returns_bond() {
        let mut f = setup();
        let maker = f.maker.clone();
        f.escrow
            .withdraw(&f.secret, 120, &maker, &mut f.sink)
            .unwrap();

        assert!(f.escrow.is_withdrawn());
        assert!(!f.escrow.is_active());
        assert_eq!(f.sink.balance(&f.maker), AMOUNT);
        assert_eq!(f.sink.balance(&f.depositor), BOND);
        assert_eq!(f.escrow.custody(), 0);
        assert_eq!(f.escrow.revealed_secret(), Some(&f.secret));
    }

    #[test]
    fn withdraw_wrong_secret_rejected() {
        let mut f = setup();
        let maker = f.maker.clone();
        let err = f
            .escrow
            .withdraw(&Secret::from("wrong"), 120, &maker, &mut f.sink)
            .unwrap_err();
        assert_eq!(err, CrosslockError::InvalidSecret);
        assert!(f.escrow.is_active());
        assert!(f.sink.history().is_empty());
    }

    #[test]
    fn withdraw_before_timelock_rejected() {
        let mut f = setup();
        let maker = f.maker.clone();
        let err = f
            .escrow
            .withdraw(&f.secret, 99, &maker, &mut f.sink)
            .unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::TimelockNotReached {
                stage: TimelockStage::Withdrawal,
                available_at: 100,
                now: 99,
            }
        ));
        assert!(err.is_recoverable());
        assert!(f.escrow.is_active());
    }

    #[test]
    fn private_withdraw_requires_maker() {
        let mut f = setup();
        let stranger = AccountId::dummy("stranger.near");
        let err = f
            .escrow
            .withdraw(&f.secret, 120, &stranger, &mut f.sink)
            .unwrap_err();
        assert!(matches!(err, CrosslockError::Unauthorized { .. }));
        assert!(f.escrow.is_active());
    }

    #[test]
    fn open_private_withdraw_policy() {
        let config = EscrowConfig {
            private_withdrawal_requires_maker: false,
            ..EscrowConfig::simplified()
        };
        let mut f = setup_with(config, AMOUNT + BOND);
        let stranger = AccountId::dummy("stranger.near");
        f.escrow
            .withdraw(&f.secret, 120, &stranger, &mut f.sink)
            .unwrap();
        // Principal still goes to the maker, not the caller.
        assert_eq!(f.sink.balance(&f.maker), AMOUNT);
        assert_eq!(f.sink.balance(&stranger), 0);
    }

    #[test]
    fn public_withdraw_after_public_stage() {
        let mut f = setup();
        let err = f
            .escrow
            .public_withdraw(&f.secret, 149, &mut f.sink)
            .unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::TimelockNotReached {
                stage: TimelockStage::PublicWithdrawal,
                ..
            }
        ));

        f.escrow
            .public_withdraw(&f.secret, 150, &mut f.sink)
            .unwrap();
        assert!(f.escrow.is_withdrawn());
        assert_eq!(f.sink.balance(&f.maker), AMOUNT);
    }

    #[test]
    fn public_withdraw_wrong_secret_rejected() {
        let mut f = setup();
        let err = f
            .escrow
            .public_withdraw(&Secret::from("nope"), 160, &mut f.sink)
            .unwrap_err();
        assert_eq!(err, CrosslockError::InvalidSecret);
    }

    #[test]
    fn public_withdraw_without_public_stage() {
        let secret = Secret::random();
        let params = ImmutableSwapParams::dummy(&secret, "maker", AMOUNT, BOND);
        let schedule =
            TimelockSchedule::new(100, None, 200, 0, &TimelockPolicy::simplified()).unwrap();
        let mut escrow = SwapEscrow::open(
            EscrowConfig::simplified(),
            params,
            schedule,
            AMOUNT + BOND,
            AccountId::dummy("r"),
        )
        .unwrap();
        let err = escrow
            .public_withdraw(&secret, 150, &mut CustodyLedger::new())
            .unwrap_err();
        assert!(matches!(err, CrosslockError::StageNotScheduled { .. }));
    }

    #[test]
    fn cancel_before_timelock_rejected() {
        let mut f = setup();
        let err = f.escrow.cancel(199, &mut f.sink).unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::TimelockNotReached {
                stage: TimelockStage::Cancellation,
                ..
            }
        ));
        assert!(f.escrow.is_active());
    }

    #[test]
    fn cancel_refunds_principal_and_bond() {
        let mut f = setup();
        f.escrow.cancel(250, &mut f.sink).unwrap();
        assert!(f.escrow.is_cancelled());
        assert_eq!(f.sink.balance(&f.depositor), AMOUNT + BOND);
        assert_eq!(f.sink.balance(&f.maker), 0);
        assert_eq!(f.escrow.custody(), 0);
        assert!(f.escrow.revealed_secret().is_none());
    }

    #[test]
    fn surplus_returned_to_depositor() {
        let mut f = setup_with(EscrowConfig::simplified(), AMOUNT + BOND + 50);
        let maker = f.maker.clone();
        f.escrow
            .withdraw(&f.secret, 120, &maker, &mut f.sink)
            .unwrap();
        assert_eq!(f.sink.balance(&f.maker), AMOUNT);
        assert_eq!(f.sink.balance(&f.depositor), BOND + 50);
        assert_eq!(f.escrow.custody(), 0);
    }

    #[test]
    fn deposit_accumulates_custody() {
        let mut f = setup();
        assert_eq!(
            f.escrow.deposit(AMOUNT),
            Err(CrosslockError::InsufficientFunds {
                needed: 1_100,
                supplied: 1_000,
            })
        );
        f.escrow.deposit(AMOUNT + BOND).unwrap();
        assert_eq!(f.escrow.custody(), 2_200);
        assert_eq!(f.escrow.deposited_amount(), 2_200);

        f.escrow.cancel(200, &mut f.sink).unwrap();
        assert_eq!(f.sink.balance(&f.depositor), 2_200);
    }

    #[test]
    fn emergency_refund_depositor_only() {
        let mut f = setup();
        let maker = f.maker.clone();
        let err = f
            .escrow
            .emergency_refund(200 + 7_000, &maker, &mut f.sink)
            .unwrap_err();
        assert!(matches!(err, CrosslockError::Unauthorized { .. }));

        let depositor = f.depositor.clone();
        let err = f
            .escrow
            .emergency_refund(200 + 6_999, &depositor, &mut f.sink)
            .unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::TimelockNotReached {
                stage: TimelockStage::Emergency,
                ..
            }
        ));

        f.escrow
            .emergency_refund(200 + 7_000, &depositor, &mut f.sink)
            .unwrap();
        assert!(f.escrow.is_cancelled());
        assert_eq!(f.sink.balance(&f.depositor), AMOUNT + BOND);
    }

    #[test]
    fn terminal_states_reject_everything() {
        let mut f = setup();
        let maker = f.maker.clone();
        let depositor = f.depositor.clone();
        f.escrow
            .withdraw(&f.secret, 120, &maker, &mut f.sink)
            .unwrap();

        assert_eq!(
            f.escrow.withdraw(&f.secret, 130, &maker, &mut f.sink),
            Err(CrosslockError::AlreadyWithdrawn)
        );
        assert_eq!(
            f.escrow.public_withdraw(&f.secret, 160, &mut f.sink),
            Err(CrosslockError::AlreadyWithdrawn)
        );
        assert_eq!(
            f.escrow.cancel(300, &mut f.sink),
            Err(CrosslockError::AlreadyWithdrawn)
        );
        assert_eq!(
            f.escrow.emergency_refund(100_000, &depositor, &mut f.sink),
            Err(CrosslockError::AlreadyWithdrawn)
        );
        assert_eq!(
            f.escrow.deposit(5_000),
            Err(CrosslockError::AlreadyWithdrawn)
        );
        // Paid exactly once.
        assert_eq!(f.sink.total_paid(), AMOUNT + BOND);
    }

    #[test]
    fn cancelled_blocks_withdraw_even_with_secret() {
        let mut f = setup();
        let maker = f.maker.clone();
        f.escrow.cancel(200, &mut f.sink).unwrap();
        assert_eq!(
            f.escrow.withdraw(&f.secret, 210, &maker, &mut f.sink),
            Err(CrosslockError::AlreadyCancelled)
        );
        assert_eq!(
            f.escrow.cancel(210, &mut f.sink),
            Err(CrosslockError::AlreadyCancelled)
        );
        assert_eq!(f.sink.total_paid(), AMOUNT + BOND);
    }

    #[test]
    fn failed_transfer_leaves_state_untouched() {
        let mut f = setup();
        let maker = f.maker.clone();
        let err = f
            .escrow
            .withdraw(&f.secret, 120, &maker, &mut FailingSink)
            .unwrap_err();
        assert!(matches!(err, CrosslockError::TransferFailed { .. }));
        assert!(f.escrow.is_active());
        assert_eq!(f.escrow.custody(), 1_100);
        assert!(f.escrow.revealed_secret().is_none());

        let err = f.escrow.cancel(250, &mut FailingSink).unwrap_err();
        assert!(err.is_recoverable());
        assert!(f.escrow.is_active());

        // The guard condition did not change; a working sink succeeds.
        f.escrow.cancel(250, &mut f.sink).unwrap();
        assert!(f.escrow.is_cancelled());
    }

    #[test]
    fn status_queries_follow_schedule() {
        let f = setup();
        assert_eq!(f.escrow.timelock_status(50), Some(TimelockStatus::Pending));
        assert_eq!(
            f.escrow.timelock_status(120),
            Some(TimelockStatus::WithdrawalAllowed)
        );
        assert_eq!(
            f.escrow.timelock_status(250),
            Some(TimelockStatus::CancellationAllowed)
        );
        assert!(!f.escrow.can_withdraw_now(99));
        assert!(f.escrow.can_withdraw_now(100));
        assert!(!f.escrow.can_cancel_now(199));
        assert!(f.escrow.can_cancel_now(200));
    }

    #[test]
    fn resolved_escrow_reports_cannot_act() {
        let mut f = setup();
        f.escrow.cancel(200, &mut f.sink).unwrap();
        assert!(!f.escrow.can_cancel_now(300));
        assert!(!f.escrow.can_withdraw_now(300));
        assert_eq!(f.escrow.status(), EscrowState::Cancelled);
        assert_eq!(f.escrow.status().to_string(), "CANCELLED");
    }

    #[test]
    fn serde_roundtrip() {
        let f = setup();
        let json = serde_json::to_string(&f.escrow).unwrap();
        let back: SwapEscrow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status(), EscrowState::Initialized);
        assert_eq!(back.params(), f.escrow.params());
        assert_eq!(back.custody(), 1_100);
    }
}
