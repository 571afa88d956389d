//! The offer-intake boundary the lien engine consumes.

use openlien_types::{Address, OfferAuth, Result, Salt, TxContext};

/// Judges signed offers and keeps the cancellation/nonce bookkeeping.
///
/// The engine treats [`OfferValidator::validate_offer`] as a single fallible
/// call with no side effects; a rejection aborts the whole flow.
pub trait OfferValidator {
    /// Current nonce of `signer`. Part of every offer hash.
    fn nonce(&self, signer: &Address) -> u64;

    /// Check expiry, cancellation, signer signature and oracle co-signature.
    fn validate_offer(&self, auth: &OfferAuth<'_>, ctx: &TxContext) -> Result<()>;

    /// Whether `(signer, salt)` was cancelled or already fulfilled.
    fn is_cancelled_or_fulfilled(&self, signer: &Address, salt: Salt) -> bool;

    /// Consume a single-use offer.
    ///
    /// # Errors
    /// `OfferUnavailable` if the pair is already cancelled or fulfilled.
    fn mark_fulfilled(&mut self, signer: Address, salt: Salt) -> Result<()>;

    /// Cancel one offer salt. Idempotent.
    fn cancel_offer(&mut self, signer: Address, salt: Salt);

    /// Bump the signer's nonce, returning the new value.
    fn increment_nonce(&mut self, signer: Address) -> u64;
}
