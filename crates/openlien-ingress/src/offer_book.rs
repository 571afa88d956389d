//! Offer book: ed25519 offer authentication plus cancellation bookkeeping.
//!
//! Like a UTXO set in reverse: each `(signer, salt)` pair can be cancelled or
//! fulfilled exactly once, and is rejected forever after. Nonces invalidate
//! every outstanding offer of a signer in one step, because the nonce is
//! folded into each offer hash.
//!
//! ## Checks, in order
//!
//! 1. Expiry: `expiration_time < now` is rejected
//! 2. Cancellation: consumed `(signer, salt)` pairs are rejected
//! 3. Signer signature over the offer hash
//! 4. Oracle co-signature over `hash || block_number`, fresh within range

use std::collections::{HashMap, HashSet};

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use openlien_types::{
    Address, Journaled, Mark, OfferAuth, OfferHash, OpenlienError, OracleAttestation, Result,
    Salt, TxContext, UndoLog, constants,
};

use crate::validator::OfferValidator;

/// In-process offer validator.
#[derive(Debug, Clone)]
pub struct OfferBook {
    /// Per-signer nonce. Absent means zero.
    nonces: HashMap<Address, u64>,
    /// Cancelled or fulfilled `(signer, salt)` pairs.
    consumed: HashSet<(Address, Salt)>,
    /// Blocks an oracle attestation stays valid.
    oracle_block_range: u64,
    undo: UndoLog<Undo>,
}

#[derive(Debug, Clone)]
enum Undo {
    /// Pair newly consumed.
    Consumed(Address, Salt),
    /// Nonce before a bump.
    Nonce(Address, u64),
}

impl OfferBook {
    /// Create an empty book with the given oracle freshness window.
    #[must_use]
    pub fn new(oracle_block_range: u64) -> Self {
        Self {
            nonces: HashMap::new(),
            consumed: HashSet::new(),
            oracle_block_range,
            undo: UndoLog::new(),
        }
    }

    fn verify_signer(hash: &OfferHash, signer: &Address, signature: &[u8]) -> Result<()> {
        let key = VerifyingKey::from_bytes(signer.as_bytes()).map_err(|e| {
            OpenlienError::InvalidSignature {
                reason: format!("signer {signer} is not an ed25519 key: {e}"),
            }
        })?;
        let sig = Signature::from_slice(signature).map_err(|e| OpenlienError::InvalidSignature {
            reason: format!("malformed signature: {e}"),
        })?;
        key.verify(hash.as_bytes(), &sig)
            .map_err(|_| OpenlienError::InvalidSignature {
                reason: format!("signature does not authenticate {signer}"),
            })
    }

    fn verify_oracle(
        &self,
        hash: &OfferHash,
        oracle: &Address,
        attestation: Option<&OracleAttestation>,
        ctx: &TxContext,
    ) -> Result<()> {
        let attestation = attestation.ok_or_else(|| OpenlienError::InvalidOracleSignature {
            reason: format!("offer requires co-signature from {oracle}"),
        })?;
        if attestation
            .block_number
            .saturating_add(self.oracle_block_range)
            < ctx.block_number
        {
            return Err(OpenlienError::OracleSignatureExpired {
                signed_at: attestation.block_number,
                now: ctx.block_number,
            });
        }
        let key = VerifyingKey::from_bytes(oracle.as_bytes()).map_err(|e| {
            OpenlienError::InvalidOracleSignature {
                reason: format!("oracle {oracle} is not an ed25519 key: {e}"),
            }
        })?;
        let sig = Signature::from_slice(&attestation.signature).map_err(|e| {
            OpenlienError::InvalidOracleSignature {
                reason: format!("malformed oracle signature: {e}"),
            }
        })?;
        let payload = OracleAttestation::signing_payload(hash, attestation.block_number);
        key.verify(&payload, &sig)
            .map_err(|_| OpenlienError::InvalidOracleSignature {
                reason: format!("co-signature does not authenticate oracle {oracle}"),
            })
    }
}

impl Default for OfferBook {
    fn default() -> Self {
        Self::new(constants::DEFAULT_ORACLE_BLOCK_RANGE)
    }
}

impl OfferValidator for OfferBook {
    fn nonce(&self, signer: &Address) -> u64 {
        self.nonces.get(signer).copied().unwrap_or(0)
    }

    fn validate_offer(&self, auth: &OfferAuth<'_>, ctx: &TxContext) -> Result<()> {
        if auth.expiration_time < ctx.timestamp {
            return Err(OpenlienError::OfferExpired {
                expiration_time: auth.expiration_time,
                now: ctx.timestamp,
            });
        }
        if self.is_cancelled_or_fulfilled(&auth.signer, auth.salt) {
            return Err(OpenlienError::OfferUnavailable {
                signer: auth.signer,
                salt: auth.salt,
            });
        }
        Self::verify_signer(&auth.hash, &auth.signer, &auth.signature.signer)?;
        if let Some(oracle) = &auth.oracle {
            self.verify_oracle(&auth.hash, oracle, auth.signature.oracle.as_ref(), ctx)?;
        }

        tracing::debug!(
            offer = %auth.hash,
            signer = %auth.signer,
            salt = auth.salt,
            "Offer validated"
        );
        Ok(())
    }

    fn is_cancelled_or_fulfilled(&self, signer: &Address, salt: Salt) -> bool {
        self.consumed.contains(&(*signer, salt))
    }

    fn mark_fulfilled(&mut self, signer: Address, salt: Salt) -> Result<()> {
        if !self.consumed.insert((signer, salt)) {
            return Err(OpenlienError::OfferUnavailable { signer, salt });
        }
        self.undo.record(Undo::Consumed(signer, salt));
        Ok(())
    }

    fn cancel_offer(&mut self, signer: Address, salt: Salt) {
        if self.consumed.insert((signer, salt)) {
            self.undo.record(Undo::Consumed(signer, salt));
        }
        tracing::debug!(signer = %signer, salt, "Offer cancelled");
    }

    fn increment_nonce(&mut self, signer: Address) -> u64 {
        let nonce = self.nonces.entry(signer).or_insert(0);
        let prior = *nonce;
        *nonce += 1;
        tracing::debug!(signer = %signer, nonce = *nonce, "Nonce incremented");
        self.undo.record(Undo::Nonce(signer, prior));
        prior + 1
    }
}

impl Journaled for OfferBook {
    type Checkpoint = Mark;

    fn checkpoint(&mut self) -> Mark {
        self.undo.mark()
    }

    fn rollback(&mut self, checkpoint: Mark) {
        for entry in self.undo.unwind(checkpoint) {
            match entry {
                Undo::Consumed(signer, salt) => {
                    self.consumed.remove(&(signer, salt));
                }
                Undo::Nonce(signer, prior) => {
                    self.nonces.insert(signer, prior);
                }
            }
        }
    }

    fn commit(&mut self, checkpoint: Mark) {
        self.undo.release(checkpoint);
    }
}
