//! # openlien-engine
//!
//! Lien lifecycle engine for the **OpenLien** NFT-collateral lending system.
//!
//! - [`math`]: simple-interest debt and the refinancing-auction rate ceiling
//! - [`LienStore`]: hash-committed open-lien table
//! - [`OfferCapacity`]: per-offer drawn-amount counters
//! - [`LienEngine`]: borrow, repay, auctions, seizure, refinancing
//! - marketplace flows: buy-to-borrow, buy-locked, take-bid
//!
//! ## Trust model
//!
//! The engine stores a fingerprint per lien and nothing else about it.
//! Every call hands the full lien back and it is re-hashed before use:
//!
//! 1. **Commitment**: a lien is open iff its fingerprint is stored
//! 2. **All-or-nothing**: each operation is checkpointed and rolled back on
//!    any failure, including failures inside settlement
//! 3. **State before effects**: liens are closed or replaced before any
//!    exchange call
//! 4. **Observed settlement**: sale proceeds are measured as the engine's
//!    own balance delta, never taken from the exchange's word
//!
//! ## Operation Flow
//!
//! ```text
//! caller ─► LienEngine ─► LienStore.require ─► OfferValidator.validate_offer
//!                │                                      │
//!                ▼                                      ▼
//!         math (debt, ceiling) ─► LienStore mutate ─► SettlementPlan
//!                                                       │
//!                                                       ▼
//!                                              Dispatcher.dispatch
//! ```

pub mod capacity;
pub mod engine;
pub mod fees;
pub mod lien_store;
pub mod marketplace;
pub mod math;

pub use capacity::OfferCapacity;
pub use engine::{EngineCheckpoint, InMemoryEngine, LienEngine, SeizeOutcome, SkipReason};
pub use lien_store::LienStore;
pub use math::AuctionState;
