//! Event log types for the OpenLien audit trail.
//!
//! Every committed state change produces a [`LienEvent`], wrapped in an
//! [`EventRecord`] that ties it to the transaction and block it happened in.
//! Events from reverted operations are never recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, CollectionId, ItemId, LienId, OfferHash, Salt, TxContext, TxId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LienEvent {
    /// A loan offer funded a new or refinanced lien.
    LoanOfferTaken {
        offer_hash: OfferHash,
        lien_id: LienId,
        lender: Address,
        borrower: Address,
        collection: CollectionId,
        item_id: ItemId,
        amount: u128,
        rate: u32,
        auction_duration: u64,
    },
    /// A lien was repaid and closed.
    Repay {
        lien_id: LienId,
        collection: CollectionId,
    },
    /// A lender started the refinancing auction.
    StartAuction {
        lien_id: LienId,
        collection: CollectionId,
    },
    /// A defaulted lien's collateral went to its lender.
    Seize {
        lien_id: LienId,
        collection: CollectionId,
    },
    /// A lien was replaced in place with new terms.
    Refinance {
        lien_id: LienId,
        collection: CollectionId,
        new_lender: Address,
        new_amount: u128,
        new_rate: u32,
        new_auction_duration: u64,
    },
    /// A locked item was bought out of its lien.
    BuyLocked {
        lien_id: LienId,
        collection: CollectionId,
        item_id: ItemId,
        buyer: Address,
        seller: Address,
    },
    /// An offer salt was cancelled.
    OfferCancelled { user: Address, salt: Salt },
    /// A signer's nonce was bumped, invalidating all outstanding offers.
    NonceIncremented { user: Address, new_nonce: u64 },
}

impl LienEvent {
    /// Short uppercase name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoanOfferTaken { .. } => "LOAN_OFFER_TAKEN",
            Self::Repay { .. } => "REPAY",
            Self::StartAuction { .. } => "START_AUCTION",
            Self::Seize { .. } => "SEIZE",
            Self::Refinance { .. } => "REFINANCE",
            Self::BuyLocked { .. } => "BUY_LOCKED",
            Self::OfferCancelled { .. } => "OFFER_CANCELLED",
            Self::NonceIncremented { .. } => "NONCE_INCREMENTED",
        }
    }

    /// The lien this event concerns, if any.
    #[must_use]
    pub fn lien_id(&self) -> Option<LienId> {
        match self {
            Self::LoanOfferTaken { lien_id, .. }
            | Self::Repay { lien_id, .. }
            | Self::StartAuction { lien_id, .. }
            | Self::Seize { lien_id, .. }
            | Self::Refinance { lien_id, .. }
            | Self::BuyLocked { lien_id, .. } => Some(*lien_id),
            Self::OfferCancelled { .. } | Self::NonceIncremented { .. } => None,
        }
    }
}

impl std::fmt::Display for LienEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lien_id() {
            Some(id) => write!(f, "{} {id}", self.name()),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// An event stamped with its transaction and block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub tx_id: TxId,
    pub block_number: u64,
    pub block_time: DateTime<Utc>,
    pub event: LienEvent,
}

impl EventRecord {
    #[must_use]
    pub fn new(ctx: &TxContext, event: LienEvent) -> Self {
        Self {
            tx_id: ctx.tx_id,
            block_number: ctx.block_number,
            block_time: ctx.block_time(),
            event,
        }
    }
}
