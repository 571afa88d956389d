//! Signed off-band intents: loan offers (lenders) and sell offers (borrowers
//! selling a locked item).
//!
//! Offers are never stored. They are hashed, the hash is checked against the
//! signer's ed25519 signature (and an optional oracle co-signature), and the
//! hash then keys any bookkeeping the engine needs (drawn amounts).
//!
//! The signer's current nonce is folded into every hash, so bumping the
//! nonce invalidates all outstanding offers at once.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Address, CollectionId, LienId, OfferHash, Salt};

/// A fee over a nominal price: `price * rate / 10_000` goes to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Basis points of the price.
    pub rate: u16,
    pub recipient: Address,
}

/// An unfulfilled lender intent. Drawable in pieces up to `total_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanOffer {
    pub lender: Address,
    pub collection: CollectionId,
    /// Cumulative amount all liens funded by this offer may draw.
    pub total_amount: u128,
    pub min_amount: u128,
    pub max_amount: u128,
    /// Auction duration (blocks) attached to every lien this offer funds.
    pub auction_duration: u64,
    pub salt: Salt,
    /// Unix seconds; the offer is usable while `now <= expiration_time`.
    pub expiration_time: u64,
    /// Annualized rate in basis points.
    pub rate: u32,
    /// Oracle that must co-sign, if any.
    pub oracle: Option<Address>,
}

impl LoanOffer {
    /// Content hash of this offer under the lender's `nonce`.
    #[must_use]
    pub fn hash(&self, nonce: u64) -> OfferHash {
        let mut hasher = Sha256::new();
        hasher.update(b"openlien:loan_offer:v1:");
        hasher.update(self.lender.as_bytes());
        hasher.update(self.collection.as_bytes());
        hasher.update(self.total_amount.to_le_bytes());
        hasher.update(self.min_amount.to_le_bytes());
        hasher.update(self.max_amount.to_le_bytes());
        hasher.update(self.auction_duration.to_le_bytes());
        hasher.update(self.salt.to_le_bytes());
        hasher.update(self.expiration_time.to_le_bytes());
        hasher.update(self.rate.to_le_bytes());
        hash_optional_address(&mut hasher, self.oracle.as_ref());
        hasher.update(nonce.to_le_bytes());
        OfferHash(hasher.finalize().into())
    }
}

/// A borrower's intent to sell a locked item, releasing lien `lien_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOffer {
    pub borrower: Address,
    pub lien_id: LienId,
    /// Nominal price; fees are carved out of it.
    pub price: u128,
    pub expiration_time: u64,
    pub salt: Salt,
    pub oracle: Option<Address>,
    pub fees: Vec<Fee>,
}

impl SellOffer {
    /// Content hash of this offer under the borrower's `nonce`.
    #[must_use]
    pub fn hash(&self, nonce: u64) -> OfferHash {
        let mut hasher = Sha256::new();
        hasher.update(b"openlien:sell_offer:v1:");
        hasher.update(self.borrower.as_bytes());
        hasher.update(self.lien_id.0.to_le_bytes());
        hasher.update(self.price.to_le_bytes());
        hasher.update(self.expiration_time.to_le_bytes());
        hasher.update(self.salt.to_le_bytes());
        hash_optional_address(&mut hasher, self.oracle.as_ref());
        hasher.update((self.fees.len() as u64).to_le_bytes());
        for fee in &self.fees {
            hasher.update(fee.rate.to_le_bytes());
            hasher.update(fee.recipient.as_bytes());
        }
        hasher.update(nonce.to_le_bytes());
        OfferHash(hasher.finalize().into())
    }
}

fn hash_optional_address(hasher: &mut Sha256, address: Option<&Address>) {
    match address {
        Some(address) => {
            hasher.update([1u8]);
            hasher.update(address.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

/// Oracle co-signature: ed25519 over `offer_hash || block_number (LE)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleAttestation {
    pub signature: Vec<u8>,
    /// Height the oracle signed at. Stale after the configured block range.
    pub block_number: u64,
}

impl OracleAttestation {
    /// Canonical bytes the oracle signs.
    #[must_use]
    pub fn signing_payload(offer_hash: &OfferHash, block_number: u64) -> Vec<u8> {
        let mut payload = Vec::with_capacity(40);
        payload.extend_from_slice(offer_hash.as_bytes());
        payload.extend_from_slice(&block_number.to_le_bytes());
        payload
    }
}

/// Signature bundle accompanying an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSignature {
    /// Signer's ed25519 signature over the 32-byte offer hash.
    pub signer: Vec<u8>,
    pub oracle: Option<OracleAttestation>,
}

/// Everything the offer-intake boundary needs to judge one offer.
#[derive(Debug, Clone, Copy)]
pub struct OfferAuth<'a> {
    pub hash: OfferHash,
    pub signer: Address,
    pub oracle: Option<Address>,
    pub signature: &'a OfferSignature,
    pub expiration_time: u64,
    pub salt: Salt,
}

impl<'a> OfferAuth<'a> {
    /// Authorization request for a loan offer hashed under `nonce`.
    #[must_use]
    pub fn for_loan(offer: &LoanOffer, nonce: u64, signature: &'a OfferSignature) -> Self {
        Self {
            hash: offer.hash(nonce),
            signer: offer.lender,
            oracle: offer.oracle,
            signature,
            expiration_time: offer.expiration_time,
            salt: offer.salt,
        }
    }

    /// Authorization request for a sell offer hashed under `nonce`.
    #[must_use]
    pub fn for_sell(offer: &SellOffer, nonce: u64, signature: &'a OfferSignature) -> Self {
        Self {
            hash: offer.hash(nonce),
            signer: offer.borrower,
            oracle: offer.oracle,
            signature,
            expiration_time: offer.expiration_time,
            salt: offer.salt,
        }
    }
}

/// A loan offer paired with its signature bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanInput {
    pub offer: LoanOffer,
    pub signature: OfferSignature,
}

/// A sell offer paired with its signature bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellInput {
    pub offer: SellOffer,
    pub signature: OfferSignature,
}

/// Dummy offers for unit tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl LoanOffer {
    pub fn dummy(lender: Address, collection: CollectionId) -> Self {
        Self {
            lender,
            collection,
            total_amount: 1_000,
            min_amount: 1,
            max_amount: 1_000,
            auction_duration: 1_000,
            salt: rand::random::<u64>(),
            expiration_time: u64::MAX,
            rate: 1_000,
            oracle: None,
        }
    }
}
