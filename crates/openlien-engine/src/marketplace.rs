//! Marketplace-integrated flows: buying into a lien, buying out of one,
//! and selling a locked item into a bid.
//!
//! The exchange is an opaque side effect. Whatever it reports, the engine
//! judges a sale by what it can observe afterwards: its own pool balance
//! delta (`take_bid`) or ownership of the purchased item (`buy_to_borrow`).
//!
//! ## Fund reconciliation for `buy_to_borrow_locked`
//!
//! ```text
//!   loan < debt          new lender ─loan──────────▶ old lender
//!                        buyer      ─debt-loan─────▶ old lender
//!                        buyer      ─paf-debt──────▶ old borrower
//!
//!   debt <= loan < paf   new lender ─debt──────────▶ old lender
//!                        new lender ─loan-debt─────▶ old borrower
//!                        buyer      ─paf-loan──────▶ old borrower
//!
//!   paf <= loan          new lender ─debt──────────▶ old lender
//!                        new lender ─paf-debt──────▶ old borrower
//!                        new lender ─loan-paf──────▶ buyer
//! ```
//! (`paf` = sell price after fees)

use openlien_ingress::OfferValidator;
use openlien_settlement::{CollateralRegistry, CustodialPool, Exchange, SettlementPlan};
use openlien_types::{
    Address, Execution, Journaled, Lien, LienEvent, LienId, LoanInput, MarketOrder, OfferAuth,
    OpenlienError, Payment, Result, SellInput, Side, TxContext,
};

use crate::engine::{LienEngine, require_caller};
use crate::fees;

impl<V, P, R, X> LienEngine<V, P, R, X>
where
    V: OfferValidator + Journaled,
    P: CustodialPool + Journaled,
    R: CollateralRegistry + Journaled,
    X: Exchange,
{
    /// Buy the item in `execution`'s sell order, financed by `loan`, and
    /// lock it as collateral for a new lien.
    pub fn buy_to_borrow(
        &mut self,
        ctx: &TxContext,
        loan: &LoanInput,
        loan_amount: u128,
        execution: &Execution,
    ) -> Result<LienId> {
        self.atomic("buy_to_borrow", ctx, |engine| {
            engine.buy_to_borrow_inner(ctx, loan, loan_amount, execution)
        })
    }

    /// [`buy_to_borrow`](Self::buy_to_borrow), first depositing the call's
    /// native value for the caller.
    pub fn buy_to_borrow_native(
        &mut self,
        ctx: &TxContext,
        loan: &LoanInput,
        loan_amount: u128,
        execution: &Execution,
    ) -> Result<LienId> {
        self.atomic_payable("buy_to_borrow_native", ctx, |engine| {
            engine.buy_to_borrow_inner(ctx, loan, loan_amount, execution)
        })
    }

    /// Buy a locked item through its borrower's sell offer and re-lock it
    /// under a new lien financed by `loan`.
    pub fn buy_to_borrow_locked(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        sell: &SellInput,
        loan: &LoanInput,
        loan_amount: u128,
    ) -> Result<LienId> {
        self.atomic("buy_to_borrow_locked", ctx, |engine| {
            engine.buy_to_borrow_locked_inner(ctx, lien, sell, loan, loan_amount)
        })
    }

    /// [`buy_to_borrow_locked`](Self::buy_to_borrow_locked), first
    /// depositing the call's native value for the caller.
    pub fn buy_to_borrow_locked_native(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        sell: &SellInput,
        loan: &LoanInput,
        loan_amount: u128,
    ) -> Result<LienId> {
        self.atomic_payable("buy_to_borrow_locked_native", ctx, |engine| {
            engine.buy_to_borrow_locked_inner(ctx, lien, sell, loan, loan_amount)
        })
    }

    /// Buy a locked item outright through its borrower's sell offer.
    pub fn buy_locked(&mut self, ctx: &TxContext, lien: &Lien, sell: &SellInput) -> Result<()> {
        self.atomic("buy_locked", ctx, |engine| {
            engine.buy_locked_inner(ctx, lien, sell)
        })
    }

    /// [`buy_locked`](Self::buy_locked), first depositing the call's native
    /// value for the caller.
    pub fn buy_locked_native(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        sell: &SellInput,
    ) -> Result<()> {
        self.atomic_payable("buy_locked_native", ctx, |engine| {
            engine.buy_locked_inner(ctx, lien, sell)
        })
    }

    /// Borrower sells the locked item into a standing bid; the proceeds
    /// repay the lien and the surplus goes to the borrower.
    pub fn take_bid(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        lien_id: LienId,
        execution: &Execution,
    ) -> Result<u128> {
        self.atomic("take_bid", ctx, |engine| {
            engine.require_open(lien, lien_id, ctx)?;
            let bid = &execution.maker_order;
            let me = engine.address();
            if bid.trader == me {
                return Err(OpenlienError::unauthorized("cannot take the engine's own order"));
            }
            require_caller(ctx, lien.borrower, "borrower")?;

            let debt = engine.close_for_repayment(ctx, lien, lien_id)?;

            let ask = MarketOrder {
                trader: me,
                side: Side::Sell,
                collection: lien.collection,
                item_id: lien.item_id,
                payment: Payment::Pool,
                price: bid.price,
                fees: Vec::new(),
                salt: lien_id.0,
                expiration_time: u64::MAX,
            };
            let exchange = engine.dispatcher.exchange().address();
            let balance_before = engine.dispatcher.pool().balance_of(&me);
            let mut sale = SettlementPlan::new();
            sale.approve_collateral(lien.collection, lien.item_id, exchange)
                .execute(ask, bid.clone(), 0);
            engine.settle(&sale, ctx)?;

            let received = engine
                .dispatcher
                .pool()
                .balance_of(&me)
                .saturating_sub(balance_before);
            if received < debt {
                return Err(OpenlienError::InvalidRepayment { received, debt });
            }

            let mut payout = SettlementPlan::new();
            payout
                .transfer(me, lien.lender, debt)
                .transfer(me, lien.borrower, received - debt);
            engine.settle(&payout, ctx)?;

            tracing::info!(
                lien = %lien_id,
                bidder = %bid.trader,
                received,
                debt,
                "Bid taken"
            );
            Ok(received)
        })
    }

    fn buy_to_borrow_inner(
        &mut self,
        ctx: &TxContext,
        loan: &LoanInput,
        loan_amount: u128,
        execution: &Execution,
    ) -> Result<LienId> {
        let offer = &loan.offer;
        let ask = &execution.maker_order;
        let me = self.address();
        if ask.trader == me {
            return Err(OpenlienError::unauthorized("cannot take the engine's own order"));
        }
        self.check_auction_duration(offer.auction_duration)?;
        if ask.collection != offer.collection {
            return Err(OpenlienError::CollectionsDoNotMatch {
                expected: offer.collection,
                actual: ask.collection,
            });
        }

        let price = ask.price;
        let lien = Lien {
            lender: offer.lender,
            borrower: ctx.caller,
            collection: offer.collection,
            item_id: ask.item_id,
            amount: loan_amount,
            start_time: ctx.timestamp,
            rate: offer.rate,
            auction_start_block: 0,
            auction_duration: offer.auction_duration,
        };
        let lien_id = self.liens.create(&lien);
        self.take_loan_offer(ctx, offer, &loan.signature, &lien, lien_id)?;

        let mut plan = SettlementPlan::new();
        if loan_amount < price {
            fund_purchase(&mut plan, ask.payment, offer.lender, me, loan_amount);
            fund_purchase(&mut plan, ask.payment, ctx.caller, me, price - loan_amount);
        } else {
            fund_purchase(&mut plan, ask.payment, offer.lender, me, price);
            plan.transfer(offer.lender, ctx.caller, loan_amount - price);
        }
        let bid = MarketOrder {
            trader: me,
            side: Side::Buy,
            collection: offer.collection,
            item_id: ask.item_id,
            payment: ask.payment,
            price,
            fees: Vec::new(),
            salt: lien_id.0,
            expiration_time: u64::MAX,
        };
        let value = match ask.payment {
            Payment::Native => price,
            Payment::Pool => 0,
        };
        plan.execute(ask.clone(), bid, value);
        self.settle(&plan, ctx)?;

        if self.dispatcher.registry().owner_of(&lien.collection, lien.item_id) != Some(me) {
            return Err(OpenlienError::CollateralNotOwned {
                collection: lien.collection,
                item: lien.item_id,
                expected: me,
            });
        }

        tracing::info!(
            lien = %lien_id,
            borrower = %ctx.caller,
            seller = %ask.trader,
            price,
            loan_amount,
            "Buy-to-borrow committed"
        );
        Ok(lien_id)
    }

    fn buy_to_borrow_locked_inner(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        sell: &SellInput,
        loan: &LoanInput,
        loan_amount: u128,
    ) -> Result<LienId> {
        let old_id = sell.offer.lien_id;
        self.require_open(lien, old_id, ctx)?;
        let offer = &loan.offer;
        if lien.collection != offer.collection {
            return Err(OpenlienError::CollectionsDoNotMatch {
                expected: lien.collection,
                actual: offer.collection,
            });
        }
        self.check_auction_duration(offer.auction_duration)?;

        let mut plan = SettlementPlan::new();
        let (paf, debt) = self.release_locked(ctx, lien, sell, &mut plan)?;

        let new_lien = Lien {
            lender: offer.lender,
            borrower: ctx.caller,
            collection: lien.collection,
            item_id: lien.item_id,
            amount: loan_amount,
            start_time: ctx.timestamp,
            rate: offer.rate,
            auction_start_block: 0,
            auction_duration: offer.auction_duration,
        };
        let lien_id = self.liens.create(&new_lien);
        self.take_loan_offer(ctx, offer, &loan.signature, &new_lien, lien_id)?;

        let (new_lender, buyer) = (offer.lender, ctx.caller);
        if loan_amount < debt {
            plan.transfer(new_lender, lien.lender, loan_amount)
                .transfer(buyer, lien.lender, debt - loan_amount)
                .transfer(buyer, lien.borrower, paf - debt);
        } else if loan_amount < paf {
            plan.transfer(new_lender, lien.lender, debt)
                .transfer(new_lender, lien.borrower, loan_amount - debt)
                .transfer(buyer, lien.borrower, paf - loan_amount);
        } else {
            plan.transfer(new_lender, lien.lender, debt)
                .transfer(new_lender, lien.borrower, paf - debt)
                .transfer(new_lender, buyer, loan_amount - paf);
        }
        self.settle(&plan, ctx)?;

        tracing::info!(
            old_lien = %old_id,
            lien = %lien_id,
            buyer = %buyer,
            debt,
            price_after_fees = paf,
            loan_amount,
            "Buy-to-borrow-locked committed"
        );
        Ok(lien_id)
    }

    fn buy_locked_inner(&mut self, ctx: &TxContext, lien: &Lien, sell: &SellInput) -> Result<()> {
        let lien_id = sell.offer.lien_id;
        self.require_open(lien, lien_id, ctx)?;

        let mut plan = SettlementPlan::new();
        let (paf, debt) = self.release_locked(ctx, lien, sell, &mut plan)?;
        plan.move_collateral(lien.collection, lien.item_id, self.address(), ctx.caller)
            .transfer(ctx.caller, lien.lender, debt)
            .transfer(ctx.caller, lien.borrower, paf - debt);
        self.settle(&plan, ctx)?;

        tracing::info!(
            lien = %lien_id,
            buyer = %ctx.caller,
            debt,
            price_after_fees = paf,
            "Buy-locked committed"
        );
        Ok(())
    }

    /// Consume the sell offer, charge its fees to the caller and close the
    /// lien. Returns `(price_after_fees, debt)`.
    fn release_locked(
        &mut self,
        ctx: &TxContext,
        lien: &Lien,
        sell: &SellInput,
        plan: &mut SettlementPlan,
    ) -> Result<(u128, u128)> {
        let offer = &sell.offer;
        if lien.borrower != offer.borrower {
            return Err(OpenlienError::unauthorized(
                "sell offer is not signed by the lien's borrower",
            ));
        }
        let nonce = self.offers.nonce(&offer.borrower);
        self.offers
            .validate_offer(&OfferAuth::for_sell(offer, nonce, &sell.signature), ctx)?;
        self.offers.mark_fulfilled(offer.borrower, offer.salt)?;

        let price_after_fees = fees::pay_fees(plan, ctx.caller, &offer.fees, offer.price)?;
        let debt = self.close_for_repayment(ctx, lien, offer.lien_id)?;
        if debt > price_after_fees {
            return Err(OpenlienError::InvalidRepayment {
                received: price_after_fees,
                debt,
            });
        }
        self.emit(
            ctx,
            LienEvent::BuyLocked {
                lien_id: offer.lien_id,
                collection: lien.collection,
                item_id: lien.item_id,
                buyer: ctx.caller,
                seller: lien.borrower,
            },
        );
        Ok((price_after_fees, debt))
    }
}

/// Route `amount` from `from` to the engine in the form the exchange will
/// be paid in.
fn fund_purchase(plan: &mut SettlementPlan, payment: Payment, from: Address, to: Address, amount: u128) {
    match payment {
        Payment::Native => plan.withdraw_to(from, to, amount),
        Payment::Pool => plan.transfer(from, to, amount),
    };
}
