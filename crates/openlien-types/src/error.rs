//! Error types for the OpenLien engine.
//!
//! All errors use the `OL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization errors
//! - 2xx: Lien state errors
//! - 3xx: Offer validation errors
//! - 4xx: Economic constraint errors
//! - 5xx: Settlement errors
//! - 9xx: General / internal errors
//!
//! Every variant aborts the whole operation that raised it.

use thiserror::Error;

use crate::{Address, CollectionId, ItemId, LienId, Salt};

/// Failure classes callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller is not the party the operation requires.
    Authorization,
    /// Supplied lien value does not match the stored fingerprint.
    StaleLien,
    /// Operation is not allowed in the lien's current lifecycle state.
    LifecycleState,
    /// Signed offer is expired, cancelled, or mis-signed.
    OfferValidation,
    /// Amounts, rates, durations, fees or collections are out of bounds.
    Economic,
    /// Funds or assets could not be moved as required.
    Settlement,
    /// Configuration, arithmetic or internal failure.
    Internal,
}

/// Central error enum for all OpenLien operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenlienError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// Caller is not the lender/borrower the operation requires.
    #[error("OL_ERR_100: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    // =================================================================
    // Lien State Errors (2xx)
    // =================================================================
    /// The supplied lien does not hash to the stored fingerprint.
    #[error("OL_ERR_200: Lien mismatch for {0}")]
    LienMismatch(LienId),

    /// The lien's auction has run past its duration.
    #[error("OL_ERR_201: Lien {0} is defaulted")]
    LienDefaulted(LienId),

    /// An auction is already running on this lien.
    #[error("OL_ERR_202: Auction already active on {0}")]
    AuctionAlreadyActive(LienId),

    /// The operation requires a running, non-expired auction.
    #[error("OL_ERR_203: Auction not active on {0}")]
    AuctionNotActive(LienId),

    // =================================================================
    // Offer Errors (3xx)
    // =================================================================
    /// The offer's expiration time has passed.
    #[error("OL_ERR_300: Offer expired at {expiration_time}, now {now}")]
    OfferExpired { expiration_time: u64, now: u64 },

    /// The `(signer, salt)` pair was already cancelled or fulfilled.
    #[error("OL_ERR_301: Offer unavailable: signer {signer} salt {salt}")]
    OfferUnavailable { signer: Address, salt: Salt },

    /// The signer's ed25519 signature did not verify.
    #[error("OL_ERR_302: Offer signature invalid: {reason}")]
    InvalidSignature { reason: String },

    /// The oracle co-signature is missing or did not verify.
    #[error("OL_ERR_303: Oracle signature invalid: {reason}")]
    InvalidOracleSignature { reason: String },

    /// The oracle co-signature is older than the accepted block range.
    #[error("OL_ERR_304: Oracle signature expired: signed at block {signed_at}, now {now}")]
    OracleSignatureExpired { signed_at: u64, now: u64 },

    // =================================================================
    // Economic Errors (4xx)
    // =================================================================
    /// Rate above the liquidation threshold or the auction ceiling.
    #[error("OL_ERR_400: Rate too high: {rate} bps > {max} bps")]
    RateTooHigh { rate: u32, max: u32 },

    /// Loan amount outside the offer's `[min, max]` bounds.
    #[error("OL_ERR_401: Invalid loan amount {amount}: must be in [{min}, {max}]")]
    InvalidLoanAmount { amount: u128, min: u128, max: u128 },

    /// Cumulative draws would exceed the offer's total amount.
    #[error("OL_ERR_402: Insufficient offer: requested {requested}, remaining {remaining}")]
    InsufficientOffer { requested: u128, remaining: u128 },

    /// Auction duration exceeds the configured maximum.
    #[error("OL_ERR_403: Invalid auction duration {duration}: max {max}")]
    InvalidAuctionDuration { duration: u64, max: u64 },

    /// Refinancing terms are not at least as good as the current lien.
    #[error("OL_ERR_404: Invalid refinance: {reason}")]
    InvalidRefinance { reason: String },

    /// Lien and offer (or order) reference different collections.
    #[error("OL_ERR_405: Collections do not match: {expected} vs {actual}")]
    CollectionsDoNotMatch {
        expected: CollectionId,
        actual: CollectionId,
    },

    /// Fee total exceeds the nominal price.
    #[error("OL_ERR_406: Fees too high: {fees} > price {price}")]
    FeesTooHigh { fees: u128, price: u128 },

    // =================================================================
    // Settlement Errors (5xx)
    // =================================================================
    /// Sale proceeds do not cover the already-committed debt.
    #[error("OL_ERR_500: Invalid repayment: received {received}, debt {debt}")]
    InvalidRepayment { received: u128, debt: u128 },

    /// Not enough custodial (or native) balance to move funds.
    #[error("OL_ERR_501: Insufficient balance for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: Address,
        needed: u128,
        available: u128,
    },

    /// The collateral item is not owned by the expected account.
    #[error("OL_ERR_502: Collateral {collection} {item} not owned by {expected}")]
    CollateralNotOwned {
        collection: CollectionId,
        item: ItemId,
        expected: Address,
    },

    /// The operator may not move this collateral item.
    #[error("OL_ERR_503: Collateral transfer not authorized for operator {operator}")]
    CollateralTransferUnauthorized { operator: Address },

    /// The external exchange refused the order pair.
    #[error("OL_ERR_504: Exchange rejected execution: {reason}")]
    ExchangeRejected { reason: String },

    /// Supply conservation invariant violated: critical safety alert.
    #[error("OL_ERR_505: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Checked arithmetic overflowed or underflowed.
    #[error("OL_ERR_900: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    /// The transaction context is unusable for this operation.
    #[error("OL_ERR_901: Invalid transaction context: {0}")]
    InvalidContext(String),

    /// Configuration error (invalid values, unparsable file, etc.).
    #[error("OL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("OL_ERR_903: Serialization error: {0}")]
    Serialization(String),

    /// Unrecoverable internal error.
    #[error("OL_ERR_904: Internal error: {0}")]
    Internal(String),
}

impl OpenlienError {
    /// Classify this error into its failure class.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::LienMismatch(_) => ErrorKind::StaleLien,
            Self::LienDefaulted(_) | Self::AuctionAlreadyActive(_) | Self::AuctionNotActive(_) => {
                ErrorKind::LifecycleState
            }
            Self::OfferExpired { .. }
            | Self::OfferUnavailable { .. }
            | Self::InvalidSignature { .. }
            | Self::InvalidOracleSignature { .. }
            | Self::OracleSignatureExpired { .. } => ErrorKind::OfferValidation,
            Self::RateTooHigh { .. }
            | Self::InvalidLoanAmount { .. }
            | Self::InsufficientOffer { .. }
            | Self::InvalidAuctionDuration { .. }
            | Self::InvalidRefinance { .. }
            | Self::CollectionsDoNotMatch { .. }
            | Self::FeesTooHigh { .. } => ErrorKind::Economic,
            Self::InvalidRepayment { .. }
            | Self::InsufficientBalance { .. }
            | Self::CollateralNotOwned { .. }
            | Self::CollateralTransferUnauthorized { .. }
            | Self::ExchangeRejected { .. }
            | Self::SupplyInvariantViolation { .. } => ErrorKind::Settlement,
            Self::ArithmeticOverflow { .. }
            | Self::InvalidContext(_)
            | Self::Configuration(_)
            | Self::Serialization(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for an [`OpenlienError::Unauthorized`] error.
    #[must_use]
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`OpenlienError::ArithmeticOverflow`] error.
    #[must_use]
    pub fn overflow(context: &'static str) -> Self {
        Self::ArithmeticOverflow { context }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenlienError>;

impl From<serde_json::Error> for OpenlienError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
