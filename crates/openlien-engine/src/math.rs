//! Debt and auction math. Pure functions, no state.
//!
//! ## Interest
//!
//! Simple, non-compounding, truncating:
//! ```text
//! debt = principal + principal * rate_bps * elapsed_secs / (31_536_000 * 10_000)
//! ```
//!
//! ## Auction rate ceiling
//!
//! Linear in elapsed blocks from the lien's own rate up to the liquidation
//! threshold, held at the threshold once the duration has run out:
//! ```text
//!   ceiling ┤                 ┌──────────
//!           │             ╱
//!           │         ╱
//!   rate    ┼─────╱
//!           └─────┬───────────┬──────────▶ blocks
//!               start    start+duration
//! ```

use openlien_types::{Lien, OpenlienError, Result, constants};

/// Principal plus simple interest accrued from `start_time` to `now`.
///
/// Returns `principal` exactly when `now <= start_time`.
///
/// # Errors
/// `ArithmeticOverflow` if the intermediate product does not fit in `u128`.
pub fn compute_current_debt(
    principal: u128,
    rate_bps: u32,
    start_time: u64,
    now: u64,
) -> Result<u128> {
    let elapsed = u128::from(now.saturating_sub(start_time));
    let interest = principal
        .checked_mul(u128::from(rate_bps))
        .and_then(|v| v.checked_mul(elapsed))
        .ok_or(OpenlienError::overflow("interest accrual"))?
        / (constants::SECONDS_PER_YEAR * constants::BASIS_POINTS);
    principal
        .checked_add(interest)
        .ok_or(OpenlienError::overflow("debt"))
}

/// Highest rate a refinancing bid may carry at `current_block`.
///
/// Starts at `original_rate` when the auction begins and reaches `ceiling`
/// after `auction_duration` blocks. A zero duration yields the ceiling.
#[must_use]
pub fn calc_refinancing_auction_rate(
    auction_start_block: u64,
    auction_duration: u64,
    original_rate: u32,
    current_block: u64,
    ceiling: u32,
) -> u32 {
    let elapsed = current_block.saturating_sub(auction_start_block);
    if elapsed >= auction_duration || original_rate >= ceiling {
        return ceiling;
    }
    let span = u128::from(ceiling - original_rate);
    let step = span * u128::from(elapsed) / u128::from(auction_duration);
    // step < span <= u32::MAX
    original_rate + u32::try_from(step).unwrap_or(ceiling - original_rate)
}

/// Where a lien stands relative to its refinancing auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionState {
    /// No auction marker set.
    NotStarted,
    /// Marker set and `elapsed <= duration`.
    Active,
    /// Marker set and `elapsed > duration`.
    Defaulted,
}

impl AuctionState {
    /// Classify `lien` at `current_block`.
    #[must_use]
    pub fn of(lien: &Lien, current_block: u64) -> Self {
        if !lien.auction_started() {
            return Self::NotStarted;
        }
        let elapsed = current_block.saturating_sub(lien.auction_start_block);
        if elapsed > lien.auction_duration {
            Self::Defaulted
        } else {
            Self::Active
        }
    }
}

impl std::fmt::Display for AuctionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT_STARTED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Defaulted => write!(f, "DEFAULTED"),
        }
    }
}

/// Auction running and past its duration.
#[must_use]
pub fn is_defaulted(lien: &Lien, current_block: u64) -> bool {
    AuctionState::of(lien, current_block) == AuctionState::Defaulted
}

/// Auction running and within its duration (boundary inclusive).
#[must_use]
pub fn auction_is_active(lien: &Lien, current_block: u64) -> bool {
    AuctionState::of(lien, current_block) == AuctionState::Active
}
