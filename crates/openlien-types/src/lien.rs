//! # Lien: an open collateralized loan position
//!
//! The engine never persists a `Lien`. It stores only the lien's
//! [`Fingerprint`] under its [`LienId`]; every caller must hand back the full
//! value, which is re-hashed and compared before anything else happens.
//!
//! ## Auction marker
//!
//! ```text
//!   auction_start_block == 0   no auction running
//!   auction_start_block == h   auction began at height h
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Address, CollectionId, Fingerprint, ItemId, LienId};

/// A lien: lender, borrower, collateral and loan terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lien {
    pub lender: Address,
    pub borrower: Address,
    pub collection: CollectionId,
    pub item_id: ItemId,
    /// Principal (for refinanced liens: the capitalized debt).
    pub amount: u128,
    /// Unix seconds at which interest started accruing.
    pub start_time: u64,
    /// Annualized simple interest rate in basis points.
    pub rate: u32,
    /// Block height the auction began at, or zero.
    pub auction_start_block: u64,
    /// Auction length in blocks.
    pub auction_duration: u64,
}

impl Lien {
    /// Structural hash over every field in declaration order.
    ///
    /// Format: `"openlien:lien:v1:" || lender || borrower || collection ||
    /// item_id || amount || start_time || rate || auction_start_block ||
    /// auction_duration`, integers little-endian.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(b"openlien:lien:v1:");
        hasher.update(self.lender.as_bytes());
        hasher.update(self.borrower.as_bytes());
        hasher.update(self.collection.as_bytes());
        hasher.update(self.item_id.0.to_le_bytes());
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.start_time.to_le_bytes());
        hasher.update(self.rate.to_le_bytes());
        hasher.update(self.auction_start_block.to_le_bytes());
        hasher.update(self.auction_duration.to_le_bytes());
        Fingerprint(hasher.finalize().into())
    }

    /// Whether an auction marker is set.
    #[must_use]
    pub fn auction_started(&self) -> bool {
        self.auction_start_block != 0
    }

    /// Copy of this lien with the auction marker set to `block_number`.
    #[must_use]
    pub fn with_auction_start(&self, block_number: u64) -> Self {
        Self {
            auction_start_block: block_number,
            ..self.clone()
        }
    }
}

/// A caller-supplied `(lien, id)` pair, as used by batch seizure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LienPointer {
    pub lien: Lien,
    pub lien_id: LienId,
}

impl LienPointer {
    #[must_use]
    pub fn new(lien: Lien, lien_id: LienId) -> Self {
        Self { lien, lien_id }
    }
}

/// Dummy lien for unit tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Lien {
    pub fn dummy(amount: u128, rate: u32, start_time: u64) -> Self {
        Self {
            lender: Address::from_bytes([1u8; 32]),
            borrower: Address::from_bytes([2u8; 32]),
            collection: CollectionId::from_bytes([3u8; 32]),
            item_id: ItemId(1),
            amount,
            start_time,
            rate,
            auction_start_block: 0,
            auction_duration: 1_000,
        }
    }
}
