//! Offer signing for tests and fixtures. **Never use in production.**

use ed25519_dalek::{Signer, SigningKey};
use openlien_types::{
    Address, LoanOffer, OfferHash, OfferSignature, OracleAttestation, SellOffer,
};

/// An ed25519 keypair that can sign offers and oracle attestations.
#[derive(Debug, Clone)]
pub struct TestSigner {
    key: SigningKey,
}

impl TestSigner {
    /// Fresh random keypair.
    pub fn random() -> Self {
        Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// The signer's address (its ed25519 public key).
    pub fn address(&self) -> Address {
        Address::from_verifying_key(&self.key.verifying_key())
    }

    /// Raw signature over an offer hash.
    pub fn sign_hash(&self, hash: &OfferHash) -> Vec<u8> {
        self.key.sign(hash.as_bytes()).to_bytes().to_vec()
    }

    /// Signature bundle (no oracle) for a loan offer under `nonce`.
    pub fn sign_loan_offer(&self, offer: &LoanOffer, nonce: u64) -> OfferSignature {
        OfferSignature {
            signer: self.sign_hash(&offer.hash(nonce)),
            oracle: None,
        }
    }

    /// Signature bundle (no oracle) for a sell offer under `nonce`.
    pub fn sign_sell_offer(&self, offer: &SellOffer, nonce: u64) -> OfferSignature {
        OfferSignature {
            signer: self.sign_hash(&offer.hash(nonce)),
            oracle: None,
        }
    }

    /// Oracle co-signature over `hash` at `block_number`.
    pub fn attest(&self, hash: &OfferHash, block_number: u64) -> OracleAttestation {
        let payload = OracleAttestation::signing_payload(hash, block_number);
        OracleAttestation {
            signature: self.key.sign(&payload).to_bytes().to_vec(),
            block_number,
        }
    }
}
