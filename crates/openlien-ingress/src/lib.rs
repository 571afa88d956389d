//! # openlien-ingress
//!
//! **Offer intake**: the boundary through which signed loan and sell offers
//! enter the lien engine.
//!
//! ## Architecture
//!
//! 1. **OfferValidator**: the contract the engine consumes
//! 2. **OfferBook**: ed25519 implementation with cancellation and nonce
//!    bookkeeping
//!
//! ## Offer Flow
//!
//! ```text
//! engine → OfferValidator.nonce() → offer.hash(nonce)
//!        → OfferValidator.validate_offer() → verdict
//! ```
//!
//! Validation is read-only; a rejected offer leaves no trace.

pub mod offer_book;
#[cfg(any(test, feature = "test-helpers"))]
pub mod signer;
pub mod validator;

pub use offer_book::OfferBook;
#[cfg(any(test, feature = "test-helpers"))]
pub use signer::TestSigner;
pub use validator::OfferValidator;
