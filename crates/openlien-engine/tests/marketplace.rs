//! Integration tests: buy-to-borrow, buying locked items, and taking bids.

mod common;

use common::*;
use openlien_ingress::{OfferValidator, TestSigner};
use openlien_settlement::CollateralRegistry;
use openlien_types::*;

const ITEM_FOR_SALE: u64 = 7;

/// A seller holding `ITEM_FOR_SALE`, approved to the exchange.
fn seller(w: &mut World) -> Address {
    let seller = Address::random();
    let (collection, exchange) = (w.collection, w.exchange());
    let registry = w.engine.dispatcher_mut().registry_mut();
    registry.mint(collection, ItemId(ITEM_FOR_SALE), seller);
    registry.set_approval_for_all(seller, collection, exchange, true);
    seller
}

fn order(
    trader: Address,
    side: Side,
    w: &World,
    item: u64,
    payment: Payment,
    price: u128,
) -> MarketOrder {
    MarketOrder {
        trader,
        side,
        collection: w.collection,
        item_id: ItemId(item),
        payment,
        price,
        fees: Vec::new(),
        salt: rand::random(),
        expiration_time: u64::MAX,
    }
}

fn ask(w: &World, seller: Address, payment: Payment, price: u128) -> Execution {
    Execution {
        maker_order: order(seller, Side::Sell, w, ITEM_FOR_SALE, payment, price),
    }
}

/// Borrower's signed sell offer for `lien_id`.
fn sell_input(w: &World, lien_id: LienId, price: u128, fees: Vec<Fee>) -> SellInput {
    let offer = SellOffer {
        borrower: w.borrower.address(),
        lien_id,
        price,
        expiration_time: u64::MAX,
        salt: rand::random(),
        oracle: None,
        fees,
    };
    let nonce = w.engine.offers().nonce(&offer.borrower);
    let signature = w.borrower.sign_sell_offer(&offer, nonce);
    SellInput { offer, signature }
}

fn lien_for(w: &World, lender: Address, borrower: Address, item: u64, amount: u128) -> Lien {
    Lien {
        lender,
        borrower,
        collection: w.collection,
        item_id: ItemId(item),
        amount,
        start_time: T0,
        rate: 1_000,
        auction_start_block: 0,
        auction_duration: 1_000,
    }
}

// ---------------------------------------------------------------------------
// buy_to_borrow
// ---------------------------------------------------------------------------

#[test]
fn buy_to_borrow_with_down_payment() {
    let mut w = World::new();
    let seller = seller(&mut w);
    w.fund(w.borrower.address(), 200);
    let loan = w.loan_input(&w.lender, w.offer());
    let execution = ask(&w, seller, Payment::Pool, 500);

    let ctx = w.borrower_ctx();
    let lien_id = w.engine.buy_to_borrow(&ctx, &loan, 300, &execution).unwrap();

    assert_eq!(w.owner(ITEM_FOR_SALE), Some(w.engine.address()));
    assert_eq!(w.balance(&seller), 500);
    assert_eq!(w.balance(&w.borrower.address()), 0);
    assert_eq!(w.balance(&w.lender.address()), LENDER_FUNDS - 300);
    assert_eq!(w.balance(&w.engine.address()), 0);
    let lien = lien_for(&w, w.lender.address(), w.borrower.address(), ITEM_FOR_SALE, 300);
    assert!(w.engine.verify(lien_id, &lien));
    w.assert_supply();
}

#[test]
fn buy_to_borrow_with_surplus_loan() {
    let mut w = World::new();
    let seller = seller(&mut w);
    let loan = w.loan_input(&w.lender, w.offer());
    let execution = ask(&w, seller, Payment::Pool, 500);

    let ctx = w.borrower_ctx();
    let lien_id = w.engine.buy_to_borrow(&ctx, &loan, 700, &execution).unwrap();

    assert_eq!(w.balance(&seller), 500);
    assert_eq!(w.balance(&w.borrower.address()), 200);
    assert_eq!(w.balance(&w.lender.address()), LENDER_FUNDS - 700);
    assert!(w.engine.is_open(lien_id));
    w.assert_supply();
}

#[test]
fn buy_to_borrow_native_payment() {
    let mut w = World::new();
    let seller = seller(&mut w);
    w.fund_native(w.borrower.address(), 200);
    let loan = w.loan_input(&w.lender, w.offer());
    let execution = ask(&w, seller, Payment::Native, 500);

    let ctx = w.borrower_ctx().with_value(200);
    w.engine
        .buy_to_borrow_native(&ctx, &loan, 300, &execution)
        .unwrap();

    assert_eq!(w.native_balance(&seller), 500);
    assert_eq!(w.balance(&seller), 0);
    assert_eq!(w.native_balance(&w.borrower.address()), 0);
    assert_eq!(w.native_balance(&w.engine.address()), 0);
    assert_eq!(w.owner(ITEM_FOR_SALE), Some(w.engine.address()));
    w.assert_supply();
}

#[test]
fn buy_to_borrow_rejects_mismatched_or_own_orders() {
    let mut w = World::new();
    let seller = seller(&mut w);
    let loan = w.loan_input(&w.lender, w.offer());
    let ctx = w.borrower_ctx();

    let mut foreign = ask(&w, seller, Payment::Pool, 500);
    foreign.maker_order.collection = CollectionId::from_bytes([8u8; 32]);
    assert!(matches!(
        w.engine.buy_to_borrow(&ctx, &loan, 500, &foreign).unwrap_err(),
        OpenlienError::CollectionsDoNotMatch { .. }
    ));

    let own = ask(&w, w.engine.address(), Payment::Pool, 500);
    let err = w.engine.buy_to_borrow(&ctx, &loan, 500, &own).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    assert!(w.engine.open_liens().is_empty());
    assert_eq!(w.balance(&w.lender.address()), LENDER_FUNDS);
}

#[test]
fn buy_to_borrow_reverts_when_exchange_refuses() {
    let mut w = World::new();
    let seller = Address::random();
    let collection = w.collection;
    // Minted but never approved to the exchange.
    w.engine
        .dispatcher_mut()
        .registry_mut()
        .mint(collection, ItemId(ITEM_FOR_SALE), seller);
    let loan = w.loan_input(&w.lender, w.offer());
    let execution = ask(&w, seller, Payment::Pool, 500);

    let ctx = w.borrower_ctx();
    let err = w
        .engine
        .buy_to_borrow(&ctx, &loan, 500, &execution)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Settlement);
    assert!(w.engine.open_liens().is_empty());
    assert_eq!(w.owner(ITEM_FOR_SALE), Some(seller));
    assert_eq!(w.balance(&w.lender.address()), LENDER_FUNDS);
    assert_eq!(w.engine.amount_taken(&w.engine.loan_offer_hash(&loan.offer)), 0);
}

// ---------------------------------------------------------------------------
// buy_locked
// ---------------------------------------------------------------------------

#[test]
fn buy_locked_pays_fees_debt_and_seller() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let recipient = Address::random();
    let sell = sell_input(
        &w,
        lien_id,
        1_000,
        vec![Fee {
            rate: 250,
            recipient,
        }],
    );
    let buyer = Address::random();
    w.fund(buyer, 1_000);
    assert_eq!(w.engine.sell_offer_hash(&sell.offer), sell.offer.hash(0));

    let ctx = w.ctx(buyer, T0, B0);
    w.engine.buy_locked(&ctx, &lien, &sell).unwrap();

    assert!(!w.engine.is_open(lien_id));
    assert_eq!(w.owner(1), Some(buyer));
    assert_eq!(w.balance(&recipient), 25);
    assert_eq!(w.balance(&w.lender.address()), LENDER_FUNDS);
    assert_eq!(w.balance(&w.borrower.address()), 100 + 875);
    assert_eq!(w.balance(&buyer), 0);
    assert!(
        w.engine
            .offers()
            .is_cancelled_or_fulfilled(&sell.offer.borrower, sell.offer.salt)
    );

    let names: Vec<_> = w.engine.events().iter().map(|r| r.event.name()).collect();
    assert_eq!(names, vec!["LOAN_OFFER_TAKEN", "REPAY", "BUY_LOCKED"]);
    w.assert_supply();
}

#[test]
fn buy_locked_native_deposits_value() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let sell = sell_input(&w, lien_id, 400, Vec::new());
    let buyer = Address::random();
    w.fund_native(buyer, 400);

    let ctx = w.ctx(buyer, T0, B0).with_value(400);
    w.engine.buy_locked_native(&ctx, &lien, &sell).unwrap();
    assert_eq!(w.owner(1), Some(buyer));
    assert_eq!(w.native_balance(&buyer), 0);
    assert_eq!(w.balance(&w.borrower.address()), 100 + 300);
}

#[test]
fn buy_locked_below_debt_fails() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let sell = sell_input(&w, lien_id, 50, Vec::new());
    let buyer = Address::random();
    w.fund(buyer, 1_000);

    let ctx = w.ctx(buyer, T0, B0);
    assert_eq!(
        w.engine.buy_locked(&ctx, &lien, &sell).unwrap_err(),
        OpenlienError::InvalidRepayment {
            received: 50,
            debt: 100
        }
    );
    assert!(w.engine.is_open(lien_id));
    assert!(
        !w.engine
            .offers()
            .is_cancelled_or_fulfilled(&sell.offer.borrower, sell.offer.salt)
    );
    assert_eq!(w.balance(&buyer), 1_000);
}

#[test]
fn buy_locked_requires_borrower_signature() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let buyer = Address::random();
    w.fund(buyer, 1_000);
    let ctx = w.ctx(buyer, T0, B0);

    let mut other_seller = sell_input(&w, lien_id, 500, Vec::new());
    other_seller.offer.borrower = Address::random();
    let err = w.engine.buy_locked(&ctx, &lien, &other_seller).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let mut forged = sell_input(&w, lien_id, 500, Vec::new());
    let impostor = TestSigner::random();
    forged.signature = impostor.sign_sell_offer(&forged.offer, 0);
    assert!(matches!(
        w.engine.buy_locked(&ctx, &lien, &forged).unwrap_err(),
        OpenlienError::InvalidSignature { .. }
    ));
    assert!(w.engine.is_open(lien_id));
}

#[test]
fn sell_offer_is_single_use() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let sell = sell_input(&w, lien_id, 500, Vec::new());
    let buyer = Address::random();
    w.fund(buyer, 2_000);
    let ctx = w.ctx(buyer, T0, B0);
    w.engine.buy_locked(&ctx, &lien, &sell).unwrap();

    let err = w.engine.buy_locked(&ctx, &lien, &sell).unwrap_err();
    assert_eq!(err, OpenlienError::LienMismatch(lien_id));
}

// ---------------------------------------------------------------------------
// buy_to_borrow_locked
// ---------------------------------------------------------------------------

/// Old lien of 500 on item 1, sold for 1000 to a buyer financing `loan`.
fn buy_locked_with_loan(loan: u128) -> (World, Address, Address, LienId) {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 500, 1);
    let sell = sell_input(&w, lien_id, 1_000, Vec::new());

    let next = TestSigner::random();
    w.fund(next.address(), LENDER_FUNDS);
    let mut offer = LoanOffer::dummy(next.address(), w.collection);
    offer.total_amount = 2_000;
    offer.max_amount = 2_000;
    let loan_input = w.loan_input(&next, offer);

    let buyer = Address::random();
    w.fund(buyer, 1_000);
    let ctx = w.ctx(buyer, T0, B0);
    let new_id = w
        .engine
        .buy_to_borrow_locked(&ctx, &lien, &sell, &loan_input, loan)
        .unwrap();

    let new_lien = lien_for(&w, next.address(), buyer, 1, loan);
    assert!(w.engine.verify(new_id, &new_lien));
    assert!(!w.engine.is_open(lien_id));
    assert_eq!(w.owner(1), Some(w.engine.address()));
    (w, next.address(), buyer, new_id)
}

#[test]
fn buy_to_borrow_locked_reconciles_every_branch() {
    for loan in [300u128, 700, 1_200] {
        let (w, next, buyer, new_id) = buy_locked_with_loan(loan);
        assert_eq!(new_id, LienId(1));
        // Old lender made whole, old borrower gets price minus debt on top of the loan.
        assert_eq!(w.balance(&w.lender.address()), LENDER_FUNDS, "loan {loan}");
        assert_eq!(w.balance(&w.borrower.address()), 1_000, "loan {loan}");
        assert_eq!(w.balance(&next), LENDER_FUNDS - loan, "loan {loan}");
        // Buyer started with the full price and ends holding the loan.
        assert_eq!(w.balance(&buyer), loan, "loan {loan}");
        w.assert_supply();
    }
}

/// Item 1 under a lien of 500 taken at `T0`, listed at 1000 with a 10% fee,
/// bought one year later (debt 550, 900 after fees) by a buyer financing `loan`.
struct AgedSale {
    w: World,
    lien: Lien,
    sell: SellInput,
    loan: LoanInput,
    next: Address,
    buyer: Address,
    fee_recipient: Address,
}

const AGED_DEBT: u128 = 550;
const AGED_PAF: u128 = 900;

fn aged_sale() -> AgedSale {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 500, 1);
    let fee_recipient = Address::random();
    let sell = sell_input(
        &w,
        lien_id,
        1_000,
        vec![Fee {
            rate: 1_000,
            recipient: fee_recipient,
        }],
    );

    let next = TestSigner::random();
    w.fund(next.address(), LENDER_FUNDS);
    let mut offer = LoanOffer::dummy(next.address(), w.collection);
    offer.total_amount = 2_000;
    offer.max_amount = 2_000;
    let loan = w.loan_input(&next, offer);

    AgedSale {
        w,
        lien,
        sell,
        loan,
        next: next.address(),
        buyer: Address::random(),
        fee_recipient,
    }
}

impl AgedSale {
    fn ctx(&self) -> TxContext {
        self.w.ctx(self.buyer, T0 + YEAR, B0 + 1)
    }

    fn assert_settled(&self, new_id: LienId, loan: u128) {
        let w = &self.w;
        let new_lien = Lien {
            start_time: T0 + YEAR,
            ..lien_for(w, self.next, self.buyer, 1, loan)
        };
        assert!(w.engine.verify(new_id, &new_lien), "loan {loan}");
        assert!(!w.engine.is_open(self.sell.offer.lien_id), "loan {loan}");
        assert_eq!(w.owner(1), Some(w.engine.address()), "loan {loan}");

        // Old lender receives exactly the accrued debt.
        assert_eq!(
            w.balance(&w.lender.address()),
            LENDER_FUNDS - 500 + AGED_DEBT,
            "loan {loan}"
        );
        // Old borrower keeps the principal and gains price after fees minus debt.
        assert_eq!(
            w.balance(&w.borrower.address()),
            500 + AGED_PAF - AGED_DEBT,
            "loan {loan}"
        );
        assert_eq!(w.balance(&self.fee_recipient), 100, "loan {loan}");
        assert_eq!(w.balance(&self.next), LENDER_FUNDS - loan, "loan {loan}");
        w.assert_supply();
    }
}

#[test]
fn buy_to_borrow_locked_with_fees_and_interest_at_branch_edges() {
    for loan in [
        AGED_DEBT - 1,
        AGED_DEBT,
        AGED_DEBT + 1,
        AGED_PAF - 1,
        AGED_PAF,
        AGED_PAF + 1,
    ] {
        let mut sale = aged_sale();
        sale.w.fund(sale.buyer, 1_000);
        let ctx = sale.ctx();
        let new_id = sale
            .w
            .engine
            .buy_to_borrow_locked(&ctx, &sale.lien, &sale.sell, &sale.loan, loan)
            .unwrap();

        sale.assert_settled(new_id, loan);
        // Buyer pays the full listed price and holds the loan.
        assert_eq!(sale.w.balance(&sale.buyer), loan, "loan {loan}");
    }
}

#[test]
fn buy_to_borrow_locked_native_deposits_shortfall() {
    let mut sale = aged_sale();
    let loan = 700;
    // Price 1000 less the loan.
    sale.w.fund_native(sale.buyer, 300);
    let ctx = sale.ctx().with_value(300);
    let new_id = sale
        .w
        .engine
        .buy_to_borrow_locked_native(&ctx, &sale.lien, &sale.sell, &sale.loan, loan)
        .unwrap();

    sale.assert_settled(new_id, loan);
    assert_eq!(sale.w.native_balance(&sale.buyer), 0);
    assert_eq!(sale.w.balance(&sale.buyer), 0);
}

#[test]
fn buy_to_borrow_locked_native_reverts_deposit_on_failure() {
    let mut sale = aged_sale();
    sale.w.fund_native(sale.buyer, 200);
    let ctx = sale.ctx().with_value(200);
    // 700 borrowed leaves 300 to pay, but only 200 arrives.
    let err = sale
        .w
        .engine
        .buy_to_borrow_locked_native(&ctx, &sale.lien, &sale.sell, &sale.loan, 700)
        .unwrap_err();

    assert!(matches!(err, OpenlienError::InsufficientBalance { .. }));
    assert!(sale.w.engine.verify(sale.sell.offer.lien_id, &sale.lien));
    assert_eq!(sale.w.native_balance(&sale.buyer), 200);
    assert_eq!(sale.w.balance(&sale.buyer), 0);
    sale.w.assert_supply();
}

#[test]
fn buy_to_borrow_locked_rejects_other_collection() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 500, 1);
    let sell = sell_input(&w, lien_id, 1_000, Vec::new());
    let mut offer = w.offer();
    offer.collection = CollectionId::from_bytes([8u8; 32]);
    let loan = w.loan_input(&w.lender, offer);
    let ctx = w.ctx(Address::random(), T0, B0);
    assert!(matches!(
        w.engine
            .buy_to_borrow_locked(&ctx, &lien, &sell, &loan, 500)
            .unwrap_err(),
        OpenlienError::CollectionsDoNotMatch { .. }
    ));
    assert!(w.engine.is_open(lien_id));
}

// ---------------------------------------------------------------------------
// take_bid
// ---------------------------------------------------------------------------

fn bid(w: &World, bidder: Address, price: u128, fees: Vec<Fee>) -> Execution {
    let mut maker_order = order(bidder, Side::Buy, w, 1, Payment::Pool, price);
    maker_order.fees = fees;
    Execution { maker_order }
}

#[test]
fn take_bid_repays_and_forwards_surplus() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let bidder = Address::random();
    w.fund(bidder, 1_000);
    let recipient = Address::random();
    let execution = bid(
        &w,
        bidder,
        800,
        vec![Fee {
            rate: 250,
            recipient,
        }],
    );

    let ctx = w.borrower_ctx();
    let received = w.engine.take_bid(&ctx, &lien, lien_id, &execution).unwrap();

    assert_eq!(received, 780);
    assert!(!w.engine.is_open(lien_id));
    assert_eq!(w.owner(1), Some(bidder));
    assert_eq!(w.balance(&recipient), 20);
    assert_eq!(w.balance(&bidder), 200);
    assert_eq!(w.balance(&w.lender.address()), LENDER_FUNDS);
    assert_eq!(w.balance(&w.borrower.address()), 100 + 680);
    assert_eq!(w.balance(&w.engine.address()), 0);
    w.assert_supply();
}

#[test]
fn take_bid_below_debt_reverts() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let bidder = Address::random();
    w.fund(bidder, 1_000);
    let execution = bid(&w, bidder, 50, Vec::new());

    let ctx = w.borrower_ctx();
    assert_eq!(
        w.engine
            .take_bid(&ctx, &lien, lien_id, &execution)
            .unwrap_err(),
        OpenlienError::InvalidRepayment {
            received: 50,
            debt: 100
        }
    );
    assert!(w.engine.verify(lien_id, &lien));
    assert_eq!(w.owner(1), Some(w.engine.address()));
    assert_eq!(w.balance(&bidder), 1_000);
    assert_eq!(w.events_named("REPAY"), 0);
}

#[test]
fn take_bid_only_by_borrower() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let bidder = Address::random();
    w.fund(bidder, 1_000);
    let execution = bid(&w, bidder, 500, Vec::new());

    let ctx = w.ctx(lien.lender, T0, B0);
    let err = w
        .engine
        .take_bid(&ctx, &lien, lien_id, &execution)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let own = bid(&w, w.engine.address(), 500, Vec::new());
    let ctx = w.borrower_ctx();
    let err = w.engine.take_bid(&ctx, &lien, lien_id, &own).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(w.engine.is_open(lien_id));
}

#[test]
fn take_bid_on_defaulted_lien_fails() {
    let mut w = World::new();
    let (lien, lien_id) = w.borrow(&w.offer(), 100, 1);
    let lien = w.start_auction(&lien, lien_id, B0 + 1);
    let bidder = Address::random();
    w.fund(bidder, 1_000);
    let execution = bid(&w, bidder, 500, Vec::new());

    let ctx = w.ctx(w.borrower.address(), T0, B0 + 1 + lien.auction_duration + 1);
    assert_eq!(
        w.engine
            .take_bid(&ctx, &lien, lien_id, &execution)
            .unwrap_err(),
        OpenlienError::LienDefaulted(lien_id)
    );
}
