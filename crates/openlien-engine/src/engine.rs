//! Lien lifecycle engine.
//!
//! ## Lifecycle
//!
//! ```text
//!            borrow / buy_to_borrow(_locked)
//!                        │
//!                        ▼
//!   ┌──────────────── OPEN (no auction) ◀──────────────┐
//!   │   repay            │  start_auction   refinance  │
//!   ▼                    ▼                  borrower_  │
//! CLOSED ◀── repay ── AUCTION ACTIVE ── refinance_─────┘
//!   ▲                    │              auction(_by_other)
//!   │                    │ elapsed > duration
//!   └────── seize ── DEFAULTED
//! ```
//!
//! Every public operation runs inside [`LienEngine::atomic`]: lien store,
//! offer capacity, offer bookkeeping, pool, registry and the event log are
//! checkpointed first and restored if anything fails. Lien state is always
//! committed before settlement is dispatched.

use openlien_ingress::{OfferBook, OfferValidator};
use openlien_settlement::{
    CollateralRegistry, CustodialPool, Dispatcher, Exchange, InMemoryExchange, InMemoryPool,
    InMemoryRegistry, SettlementPlan,
};
use openlien_types::{
    Address, EngineConfig, EventRecord, ItemId, Journaled, Lien, LienEvent, LienId, LienPointer,
    LoanOffer, OfferAuth, OfferHash, OfferSignature, OpenlienError, Result, Salt, SellOffer,
    TxContext,
};
use serde::{Deserialize, Serialize};

use crate::capacity::OfferCapacity;
use crate::lien_store::LienStore;
use crate::math::{self, AuctionState};

/// Why a seize pointer was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No auction has been started on the lien.
    NoAuction,
    /// The auction is still within its duration.
    AuctionActive,
}

/// Per-pointer result of a batch seize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeizeOutcome {
    Seized(LienId),
    Skipped { lien_id: LienId, reason: SkipReason },
}

impl SeizeOutcome {
    #[must_use]
    pub fn is_seized(&self) -> bool {
        matches!(self, Self::Seized(_))
    }
}

/// Positions in the journals of everything an operation may mutate.
#[derive(Debug, Clone)]
pub struct EngineCheckpoint<VC, DC> {
    liens: <LienStore as Journaled>::Checkpoint,
    capacity: <OfferCapacity as Journaled>::Checkpoint,
    offers: VC,
    dispatcher: DC,
    events: usize,
}

/// The lien lifecycle engine over an offer validator and settlement
/// collaborators.
#[derive(Debug)]
pub struct LienEngine<V, P, R, X> {
    pub(crate) config: EngineConfig,
    pub(crate) liens: LienStore,
    pub(crate) capacity: OfferCapacity,
    pub(crate) offers: V,
    pub(crate) dispatcher: Dispatcher<P, R, X>,
    events: Vec<EventRecord>,
}

/// Engine wired to the in-memory collaborators.
pub type InMemoryEngine = LienEngine<OfferBook, InMemoryPool, InMemoryRegistry, InMemoryExchange>;

impl InMemoryEngine {
    /// Fresh engine acting as `address`, trading through an exchange at
    /// `exchange`.
    ///
    /// # Errors
    /// `Configuration` if `config` is invalid.
    pub fn in_memory(config: EngineConfig, address: Address, exchange: Address) -> Result<Self> {
        let offers = OfferBook::new(config.oracle_block_range);
        let dispatcher = Dispatcher::new(
            address,
            InMemoryPool::new(),
            InMemoryRegistry::new(),
            InMemoryExchange::new(exchange),
        );
        Self::new(config, offers, dispatcher)
    }
}

impl<V, P, R, X> LienEngine<V, P, R, X>
where
    V: OfferValidator + Journaled,
    P: CustodialPool + Journaled,
    R: CollateralRegistry + Journaled,
    X: Exchange,
{
    /// # Errors
    /// `Configuration` if `config` is invalid.
    pub fn new(config: EngineConfig, offers: V, dispatcher: Dispatcher<P, R, X>) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = %dispatcher.operator(),
            max_auction_duration = config.max_auction_duration,
            liquidation_threshold_bps = config.liquidation_threshold_bps,
            "Lien engine initialized"
        );
        Ok(Self {
            config,
            liens: LienStore::new(),
            capacity: OfferCapacity::new(),
            offers,
            dispatcher,
            events: Vec::new(),
        })
    }

    // =================================================================
    // Lifecycle operations
    // =================================================================

    /// Lock `item_id` and draw `loan_amount` from `offer`.
    pub fn borrow(
        &mut self,
        ctx: &TxContext,
        offer: &LoanOffer,
        signature: &OfferSignature,
        loan_amount: u128,
        item_id: ItemId,
    ) -> Result<LienId> {
        self.atomic("borrow", ctx, |engine| {
            engine.check_auction_duration(offer.auction_duration)?;
            let lien = Lien {
                lender: offer.lender,
                borrower: ctx.caller,
                collection: offer.collection,
                item_id,
                amount: loan_amount,
                start_time: ctx.timestamp,
                rate: offer.rate,
                auction_start_block: 0,
                auction_duration: offer.auction_duration,
            };
            let lien_id = engine.liens.create(&lien);
            engine.take_loan_offer(ctx, offer, signature, &lien, lien_id)?;

            let mut plan = SettlementPlan::new();
            plan.move_collateral(lien.collection, item_id, ctx.caller, engine.address())
                .transfer(offer.lender, ctx.caller, loan_amount);
            engine.settle(&plan, ctx)?;

            tracing::info!(
                lien = %lien_id,
                lender = %lien.lender,
                borrower = %lien.borrower,
                item = %item_id,
                amount = loan_amount,
                rate = lien.rate,
                "Borrow committed"
            );
            Ok(lien_id)
        })
    }

    /// Pay off a lien's current debt and release the collateral.
    ///
    /// Anyone may repay; the caller pays, the borrower gets the item.
    pub fn repay(&mut self, ctx: &TxContext, lien: &Lien, lien_id: LienId) -> Result<u128> {
        self.atomic("repay", ctx, |engine| {
            engine.require_open(lien, lien_id, ctx)?;
            let debt = engine.close_for_repayment(ctx, lien, lien_id)?;

            let mut plan = SettlementPlan::new();
            plan.move_collateral(lien.collection, lien.item_id, engine.address(), lien.borrower)
                .transfer(ctx.caller, lien.lender, debt);
            engine.settle(&plan, ctx)?;

            tracing::info!(lien = %lien_id, payer = %ctx.caller, debt, "Repay committed");
            Ok(debt)
        })
    }

    /// Lender starts the refinancing auction at the current block.
    pub fn start_auction(&mut self, ctx: &TxContext, lien: &Lien, lien_id: LienId) -> Result<()> {
        self.atomic("start_auction", ctx, |engine| {
            engine.liens.require(lien_id, lien)?;
            require_caller(ctx, lien.lender, "lender")?;
            if lien.auction_started() {
                return Err(OpenlienError::AuctionAlreadyActive(lien_id));
            }
            if ctx.block_number == 0 {
                return Err(OpenlienError::InvalidContext(
                    "block 0 cannot mark an auction start".into(),
                ));
            }
            engine
                .liens
                .update(lien_id, &lien.with_auction_start(ctx.block_number))?;
            engine.emit(
                ctx,
                LienEvent::StartAuction {
                    lien_id,
                    collection: lien.collection,
                },
            );
            tracing::info!(lien = %lien_id, block = ctx.block_number, "Auction started");
            Ok(())
        })
    }

    /// Seize the collateral of every defaulted lien in `pointers`.
    ///
    /// A pointer the caller is not lender of, or whose lien does not
    /// verify, aborts the whole batch. A lien that is simply not defaulted
    /// yet is skipped.
    pub fn seize(&mut self, ctx: &TxContext, pointers: &[LienPointer]) -> Result<Vec<SeizeOutcome>> {
        self.atomic("seize", ctx, |engine| {
            let mut outcomes = Vec::with_capacity(pointers.len());
            let mut plan = SettlementPlan::new();
            for LienPointer { lien, lien_id } in pointers {
                require_caller(ctx, lien.lender, "lender")?;
                engine.liens.require(*lien_id, lien)?;
                let reason = match AuctionState::of(lien, ctx.block_number) {
                    AuctionState::Defaulted => None,
                    AuctionState::NotStarted => Some(SkipReason::NoAuction),
                    AuctionState::Active => Some(SkipReason::AuctionActive),
                };
                if let Some(reason) = reason {
                    tracing::warn!(lien = %lien_id, ?reason, "Seize skipped: lien not defaulted");
                    outcomes.push(SeizeOutcome::Skipped {
                        lien_id: *lien_id,
                        reason,
                    });
                    continue;
                }
                engine.liens.remove(*lien_id);
                plan.move_collateral(lien.collection, lien.item_id, engine.address(), lien.lender);
                engine.emit(
                    ctx,
                    LienEvent::Seize {
                        lien_id: *lien_id,
                        collection: lien.collection,
                    },
                );
                outcomes.push(SeizeOutcome::Seized(*lien_id));
            }
            engine.settle(&plan, ctx)?;
            tracing::info!(
                lender = %ctx.caller,
                seized = outcomes.iter().filter(|o| o.is_seized()).count(),
                skipped = outcomes.iter().filter(|o| !o.is_seized()).count(),
                "Seize committed"
            );
            Ok(outcomes)
        })
    }

    /// Lender hands the lien to a new lender offering equal or better terms.
    pub fn refinance(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        lien_id: LienId,
        offer: &LoanOffer,
        signature: &OfferSignature,
    ) -> Result<()> {
        self.atomic("refinance", ctx, |engine| {
            engine.require_open(lien, lien_id, ctx)?;
            require_caller(ctx, lien.lender, "lender")?;
            if offer.rate > lien.rate {
                return Err(OpenlienError::InvalidRefinance {
                    reason: format!("offer rate {} above lien rate {}", offer.rate, lien.rate),
                });
            }
            require_same_duration(offer, lien)?;
            let debt = engine.current_debt(lien, ctx)?;
            engine.replace_with_offer(ctx, lien, lien_id, debt, offer, signature)?;

            let mut plan = SettlementPlan::new();
            plan.transfer(offer.lender, lien.lender, debt);
            engine.settle(&plan, ctx)?;

            tracing::info!(lien = %lien_id, new_lender = %offer.lender, debt, "Refinance committed");
            Ok(())
        })
    }

    /// Caller takes over a lien in auction at `rate`, paying off its debt.
    pub fn refinance_auction(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        lien_id: LienId,
        rate: u32,
    ) -> Result<()> {
        self.atomic("refinance_auction", ctx, |engine| {
            engine.liens.require(lien_id, lien)?;
            engine.require_auction_active(lien, lien_id, ctx)?;
            let max = engine.auction_rate_ceiling(lien, ctx);
            if rate > max {
                return Err(OpenlienError::RateTooHigh { rate, max });
            }
            let debt = engine.current_debt(lien, ctx)?;
            let replacement = Lien {
                lender: ctx.caller,
                amount: debt,
                start_time: ctx.timestamp,
                rate,
                auction_start_block: 0,
                ..lien.clone()
            };
            engine.liens.update(lien_id, &replacement)?;
            engine.emit_refinance(ctx, lien_id, &replacement);

            let mut plan = SettlementPlan::new();
            plan.transfer(ctx.caller, lien.lender, debt);
            engine.settle(&plan, ctx)?;

            tracing::info!(lien = %lien_id, new_lender = %ctx.caller, debt, rate, "Auction refinance committed");
            Ok(())
        })
    }

    /// A signed offer takes over a lien in auction.
    pub fn refinance_auction_by_other(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        lien_id: LienId,
        offer: &LoanOffer,
        signature: &OfferSignature,
    ) -> Result<()> {
        self.atomic("refinance_auction_by_other", ctx, |engine| {
            engine.liens.require(lien_id, lien)?;
            engine.require_auction_active(lien, lien_id, ctx)?;
            let max = engine.auction_rate_ceiling(lien, ctx);
            if offer.rate > max {
                return Err(OpenlienError::RateTooHigh {
                    rate: offer.rate,
                    max,
                });
            }
            require_same_duration(offer, lien)?;
            let debt = engine.current_debt(lien, ctx)?;
            engine.replace_with_offer(ctx, lien, lien_id, debt, offer, signature)?;

            let mut plan = SettlementPlan::new();
            plan.transfer(offer.lender, lien.lender, debt);
            engine.settle(&plan, ctx)?;

            tracing::info!(lien = %lien_id, new_lender = %offer.lender, debt, "Auction refinance committed");
            Ok(())
        })
    }

    /// Borrower moves the lien to a new offer, drawing `loan_amount`.
    ///
    /// The old lender always receives exactly the current debt: from the
    /// new lender alone when `loan_amount >= debt` (surplus to the
    /// borrower), otherwise topped up by the borrower.
    pub fn borrower_refinance(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        lien_id: LienId,
        loan_amount: u128,
        offer: &LoanOffer,
        signature: &OfferSignature,
    ) -> Result<()> {
        self.atomic("borrower_refinance", ctx, |engine| {
            engine.require_open(lien, lien_id, ctx)?;
            require_caller(ctx, lien.borrower, "borrower")?;
            engine.check_auction_duration(offer.auction_duration)?;
            let debt = engine.current_debt(lien, ctx)?;
            engine.replace_with_offer(ctx, lien, lien_id, loan_amount, offer, signature)?;

            let mut plan = SettlementPlan::new();
            if loan_amount >= debt {
                plan.transfer(offer.lender, lien.lender, debt)
                    .transfer(offer.lender, lien.borrower, loan_amount - debt);
            } else {
                plan.transfer(offer.lender, lien.lender, loan_amount)
                    .transfer(lien.borrower, lien.lender, debt - loan_amount);
            }
            engine.settle(&plan, ctx)?;

            tracing::info!(
                lien = %lien_id,
                new_lender = %offer.lender,
                debt,
                loan_amount,
                "Borrower refinance committed"
            );
            Ok(())
        })
    }

    // =================================================================
    // Offer administration
    // =================================================================

    /// Cancel one of the caller's offer salts.
    pub fn cancel_offer(&mut self, ctx: &TxContext, salt: Salt) {
        self.offers.cancel_offer(ctx.caller, salt);
        self.emit(
            ctx,
            LienEvent::OfferCancelled {
                user: ctx.caller,
                salt,
            },
        );
        tracing::info!(user = %ctx.caller, salt, "Offer cancelled");
    }

    /// Cancel several of the caller's offer salts.
    pub fn cancel_offers(&mut self, ctx: &TxContext, salts: &[Salt]) {
        for salt in salts {
            self.cancel_offer(ctx, *salt);
        }
    }

    /// Invalidate every outstanding offer signed by the caller.
    pub fn increment_nonce(&mut self, ctx: &TxContext) -> u64 {
        let new_nonce = self.offers.increment_nonce(ctx.caller);
        self.emit(
            ctx,
            LienEvent::NonceIncremented {
                user: ctx.caller,
                new_nonce,
            },
        );
        tracing::info!(user = %ctx.caller, new_nonce, "Nonce incremented");
        new_nonce
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn is_open(&self, lien_id: LienId) -> bool {
        self.liens.is_open(lien_id)
    }

    /// Open lien ids, ascending.
    #[must_use]
    pub fn open_liens(&self) -> Vec<LienId> {
        self.liens.open_ids()
    }

    /// Whether `lien` is exactly the committed value under `lien_id`.
    #[must_use]
    pub fn verify(&self, lien_id: LienId, lien: &Lien) -> bool {
        self.liens.verify(lien_id, lien)
    }

    #[must_use]
    pub fn amount_taken(&self, offer_hash: &OfferHash) -> u128 {
        self.capacity.amount_taken(offer_hash)
    }

    /// Debt of `lien` at the context's timestamp.
    pub fn current_debt(&self, lien: &Lien, ctx: &TxContext) -> Result<u128> {
        math::compute_current_debt(lien.amount, lien.rate, lien.start_time, ctx.timestamp)
    }

    /// Highest rate a refinancing bid on `lien` may carry at the context's block.
    #[must_use]
    pub fn auction_rate_ceiling(&self, lien: &Lien, ctx: &TxContext) -> u32 {
        math::calc_refinancing_auction_rate(
            lien.auction_start_block,
            lien.auction_duration,
            lien.rate,
            ctx.block_number,
            self.config.liquidation_threshold_bps,
        )
    }

    /// Hash of `offer` under its lender's current nonce.
    #[must_use]
    pub fn loan_offer_hash(&self, offer: &LoanOffer) -> OfferHash {
        offer.hash(self.offers.nonce(&offer.lender))
    }

    /// Hash of `offer` under its borrower's current nonce.
    #[must_use]
    pub fn sell_offer_hash(&self, offer: &SellOffer) -> OfferHash {
        offer.hash(self.offers.nonce(&offer.borrower))
    }

    /// Committed events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Account the engine holds collateral and funds as.
    #[must_use]
    pub fn address(&self) -> Address {
        self.dispatcher.operator()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn offers(&self) -> &V {
        &self.offers
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<P, R, X> {
        &self.dispatcher
    }

    /// Direct access to the collaborators, for funding and minting.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<P, R, X> {
        &mut self.dispatcher
    }

    // =================================================================
    // Internals shared with the marketplace flows
    // =================================================================

    /// Run `op` all-or-nothing. A call carrying native value is rejected.
    pub(crate) fn atomic<T>(
        &mut self,
        name: &'static str,
        ctx: &TxContext,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.journaled(name, ctx, |engine| {
            require_no_value(ctx)?;
            op(engine)
        })
    }

    /// Run `op` all-or-nothing after moving the call's native value into
    /// the caller's pool balance.
    pub(crate) fn atomic_payable<T>(
        &mut self,
        name: &'static str,
        ctx: &TxContext,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.journaled(name, ctx, |engine| {
            let mut plan = SettlementPlan::new();
            plan.deposit_on_behalf(ctx.caller, ctx.value);
            engine.settle(&plan, ctx)?;
            op(engine)
        })
    }

    fn journaled<T>(
        &mut self,
        name: &'static str,
        ctx: &TxContext,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let checkpoint = self.checkpoint();
        let outcome = op(self);
        match &outcome {
            Ok(_) => self.commit(checkpoint),
            Err(err) => {
                self.rollback(checkpoint);
                tracing::warn!(
                    operation = name,
                    tx = %ctx.tx_id,
                    caller = %ctx.caller,
                    code = ?err.kind(),
                    error = %err,
                    "Operation reverted"
                );
            }
        }
        outcome
    }

    /// Draw a newly opened `lien` from `offer` and announce it.
    pub(crate) fn take_loan_offer(
        &mut self,
        ctx: &TxContext,
        offer: &LoanOffer,
        signature: &OfferSignature,
        lien: &Lien,
        lien_id: LienId,
    ) -> Result<OfferHash> {
        let hash = self.draw_loan_offer(ctx, offer, signature, lien, lien_id)?;
        self.emit(
            ctx,
            LienEvent::LoanOfferTaken {
                offer_hash: hash,
                lien_id,
                lender: lien.lender,
                borrower: lien.borrower,
                collection: lien.collection,
                item_id: lien.item_id,
                amount: lien.amount,
                rate: lien.rate,
                auction_duration: lien.auction_duration,
            },
        );
        Ok(hash)
    }

    /// Validate `offer`, check its terms against `lien`, and draw
    /// `lien.amount` from its capacity.
    fn draw_loan_offer(
        &mut self,
        ctx: &TxContext,
        offer: &LoanOffer,
        signature: &OfferSignature,
        lien: &Lien,
        lien_id: LienId,
    ) -> Result<OfferHash> {
        let nonce = self.offers.nonce(&offer.lender);
        let auth = OfferAuth::for_loan(offer, nonce, signature);
        self.offers.validate_offer(&auth, ctx)?;
        let hash = auth.hash;

        let max = self.config.liquidation_threshold_bps;
        if offer.rate > max {
            return Err(OpenlienError::RateTooHigh {
                rate: offer.rate,
                max,
            });
        }
        if lien.amount < offer.min_amount || lien.amount > offer.max_amount {
            return Err(OpenlienError::InvalidLoanAmount {
                amount: lien.amount,
                min: offer.min_amount,
                max: offer.max_amount,
            });
        }
        let taken = self.capacity.draw(hash, lien.amount, offer.total_amount)?;
        tracing::debug!(offer = %hash, lien = %lien_id, taken, total = offer.total_amount, "Loan offer drawn");
        Ok(hash)
    }

    /// Replace `lien` in place with the terms of `offer`, drawing
    /// `loan_amount` from it. Borrower and collateral are preserved.
    fn replace_with_offer(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        lien_id: LienId,
        loan_amount: u128,
        offer: &LoanOffer,
        signature: &OfferSignature,
    ) -> Result<Lien> {
        if lien.collection != offer.collection {
            return Err(OpenlienError::CollectionsDoNotMatch {
                expected: lien.collection,
                actual: offer.collection,
            });
        }
        let replacement = Lien {
            lender: offer.lender,
            amount: loan_amount,
            start_time: ctx.timestamp,
            rate: offer.rate,
            auction_start_block: 0,
            auction_duration: offer.auction_duration,
            ..lien.clone()
        };
        self.liens.update(lien_id, &replacement)?;
        self.draw_loan_offer(ctx, offer, signature, &replacement, lien_id)?;
        self.emit_refinance(ctx, lien_id, &replacement);
        Ok(replacement)
    }

    /// Close `lien` and return the debt owed on it.
    pub(crate) fn close_for_repayment(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        lien_id: LienId,
    ) -> Result<u128> {
        let debt = self.current_debt(lien, ctx)?;
        self.liens.remove(lien_id);
        self.emit(
            ctx,
            LienEvent::Repay {
                lien_id,
                collection: lien.collection,
            },
        );
        Ok(debt)
    }

    /// Verified and not defaulted.
    pub(crate) fn require_open(&self, lien: &Lien, lien_id: LienId, ctx: &TxContext) -> Result<()> {
        self.liens.require(lien_id, lien)?;
        if math::is_defaulted(lien, ctx.block_number) {
            return Err(OpenlienError::LienDefaulted(lien_id));
        }
        Ok(())
    }

    fn require_auction_active(&self, lien: &Lien, lien_id: LienId, ctx: &TxContext) -> Result<()> {
        if math::auction_is_active(lien, ctx.block_number) {
            Ok(())
        } else {
            Err(OpenlienError::AuctionNotActive(lien_id))
        }
    }

    pub(crate) fn check_auction_duration(&self, duration: u64) -> Result<()> {
        let max = self.config.max_auction_duration;
        if duration > max {
            return Err(OpenlienError::InvalidAuctionDuration { duration, max });
        }
        Ok(())
    }

    pub(crate) fn settle(&mut self, plan: &SettlementPlan, ctx: &TxContext) -> Result<()> {
        self.dispatcher.dispatch(plan, ctx)
    }

    pub(crate) fn emit(&mut self, ctx: &TxContext, event: LienEvent) {
        tracing::debug!(tx = %ctx.tx_id, event = %event, "Event recorded");
        self.events.push(EventRecord::new(ctx, event));
    }

    fn emit_refinance(&mut self, ctx: &TxContext, lien_id: LienId, replacement: &Lien) {
        self.emit(
            ctx,
            LienEvent::Refinance {
                lien_id,
                collection: replacement.collection,
                new_lender: replacement.lender,
                new_amount: replacement.amount,
                new_rate: replacement.rate,
                new_auction_duration: replacement.auction_duration,
            },
        );
    }
}

impl<V, P, R, X> Journaled for LienEngine<V, P, R, X>
where
    V: Journaled,
    P: Journaled,
    R: Journaled,
{
    type Checkpoint = EngineCheckpoint<V::Checkpoint, (P::Checkpoint, R::Checkpoint)>;

    fn checkpoint(&mut self) -> Self::Checkpoint {
        EngineCheckpoint {
            liens: self.liens.checkpoint(),
            capacity: self.capacity.checkpoint(),
            offers: self.offers.checkpoint(),
            dispatcher: self.dispatcher.checkpoint(),
            events: self.events.len(),
        }
    }

    fn rollback(&mut self, checkpoint: Self::Checkpoint) {
        self.liens.rollback(checkpoint.liens);
        self.capacity.rollback(checkpoint.capacity);
        self.offers.rollback(checkpoint.offers);
        self.dispatcher.rollback(checkpoint.dispatcher);
        self.events.truncate(checkpoint.events);
    }

    fn commit(&mut self, checkpoint: Self::Checkpoint) {
        self.liens.commit(checkpoint.liens);
        self.capacity.commit(checkpoint.capacity);
        self.offers.commit(checkpoint.offers);
        self.dispatcher.commit(checkpoint.dispatcher);
    }
}

fn require_no_value(ctx: &TxContext) -> Result<()> {
    if ctx.value == 0 {
        Ok(())
    } else {
        Err(OpenlienError::InvalidContext(format!(
            "operation is not payable, got value {}",
            ctx.value
        )))
    }
}

pub(crate) fn require_caller(ctx: &TxContext, expected: Address, role: &str) -> Result<()> {
    if ctx.caller == expected {
        Ok(())
    } else {
        Err(OpenlienError::unauthorized(format!(
            "caller {} is not the {role}",
            ctx.caller
        )))
    }
}

fn require_same_duration(offer: &LoanOffer, lien: &Lien) -> Result<()> {
    if offer.auction_duration == lien.auction_duration {
        Ok(())
    } else {
        Err(OpenlienError::InvalidRefinance {
            reason: format!(
                "auction duration {} differs from lien's {}",
                offer.auction_duration, lien.auction_duration
            ),
        })
    }
}
