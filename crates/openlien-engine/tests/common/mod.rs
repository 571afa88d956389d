//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use openlien_engine::InMemoryEngine;
use openlien_ingress::{OfferValidator, TestSigner};
use openlien_settlement::{CollateralRegistry, CustodialPool};
use openlien_types::*;

pub const T0: u64 = 1_700_000_000;
pub const B0: u64 = 100;
pub const YEAR: u64 = 31_536_000;
pub const LENDER_FUNDS: u128 = 10_000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("openlien=debug")
        .with_test_writer()
        .try_init();
}

pub struct World {
    pub engine: InMemoryEngine,
    pub lender: TestSigner,
    pub borrower: TestSigner,
    pub collection: CollectionId,
}

impl World {
    /// Engine with a funded lender and a borrower owning items 1..=3, all
    /// approved to the engine.
    pub fn new() -> Self {
        init_tracing();
        let mut engine = InMemoryEngine::in_memory(
            EngineConfig::default(),
            Address::random(),
            Address::random(),
        )
        .unwrap();
        let lender = TestSigner::random();
        let borrower = TestSigner::random();
        let collection = CollectionId::from_bytes([3u8; 32]);
        let me = engine.address();

        let d = engine.dispatcher_mut();
        d.pool_mut().fund(lender.address(), LENDER_FUNDS);
        for item in 1..=3 {
            d.registry_mut()
                .mint(collection, ItemId(item), borrower.address());
        }
        d.registry_mut()
            .set_approval_for_all(borrower.address(), collection, me, true);

        Self {
            engine,
            lender,
            borrower,
            collection,
        }
    }

    pub fn ctx(&self, caller: Address, timestamp: u64, block: u64) -> TxContext {
        TxContext::new(caller, timestamp, block)
    }

    pub fn borrower_ctx(&self) -> TxContext {
        self.ctx(self.borrower.address(), T0, B0)
    }

    pub fn offer(&self) -> LoanOffer {
        LoanOffer::dummy(self.lender.address(), self.collection)
    }

    pub fn sign(&self, signer: &TestSigner, offer: &LoanOffer) -> OfferSignature {
        signer.sign_loan_offer(offer, self.engine.offers().nonce(&signer.address()))
    }

    pub fn loan_input(&self, signer: &TestSigner, offer: LoanOffer) -> LoanInput {
        let signature = self.sign(signer, &offer);
        LoanInput { offer, signature }
    }

    /// Borrow `amount` against `item` from the world's lender at `T0`/`B0`,
    /// returning the committed lien value.
    pub fn borrow(&mut self, offer: &LoanOffer, amount: u128, item: u64) -> (Lien, LienId) {
        let ctx = self.borrower_ctx();
        let signature = self.sign(&self.lender, offer);
        let lien_id = self
            .engine
            .borrow(&ctx, offer, &signature, amount, ItemId(item))
            .unwrap();
        let lien = Lien {
            lender: offer.lender,
            borrower: self.borrower.address(),
            collection: offer.collection,
            item_id: ItemId(item),
            amount,
            start_time: T0,
            rate: offer.rate,
            auction_start_block: 0,
            auction_duration: offer.auction_duration,
        };
        assert!(self.engine.verify(lien_id, &lien));
        (lien, lien_id)
    }

    /// Start the auction on `lien` at `block`, returning the updated value.
    pub fn start_auction(&mut self, lien: &Lien, lien_id: LienId, block: u64) -> Lien {
        let ctx = self.ctx(lien.lender, T0, block);
        self.engine.start_auction(&ctx, lien, lien_id).unwrap();
        lien.with_auction_start(block)
    }

    pub fn fund(&mut self, account: Address, amount: u128) {
        self.engine.dispatcher_mut().pool_mut().fund(account, amount);
    }

    pub fn fund_native(&mut self, account: Address, amount: u128) {
        self.engine
            .dispatcher_mut()
            .pool_mut()
            .fund_native(account, amount);
    }

    pub fn balance(&self, account: &Address) -> u128 {
        self.engine.dispatcher().pool().balance_of(account)
    }

    pub fn native_balance(&self, account: &Address) -> u128 {
        self.engine.dispatcher().pool().native_balance_of(account)
    }

    pub fn owner(&self, item: u64) -> Option<Address> {
        self.engine
            .dispatcher()
            .registry()
            .owner_of(&self.collection, ItemId(item))
    }

    pub fn exchange(&self) -> Address {
        use openlien_settlement::Exchange;
        self.engine.dispatcher().exchange().address()
    }

    /// Number of committed events with the given name.
    pub fn events_named(&self, name: &str) -> usize {
        self.engine
            .events()
            .iter()
            .filter(|r| r.event.name() == name)
            .count()
    }

    pub fn assert_supply(&self) {
        self.engine.dispatcher().pool().verify_supply().unwrap();
    }
}
