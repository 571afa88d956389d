//! System-wide constants for the OpenLien engine.

/// Denominator for all basis-point rates (1 bps = 1 / 10,000).
pub const BASIS_POINTS: u128 = 10_000;

/// Seconds in a (non-leap) year. Interest accrues per second over this base.
pub const SECONDS_PER_YEAR: u128 = 31_536_000;

/// Liquidation-threshold rate ceiling: 1,000% APR expressed in bps.
///
/// No loan offer may carry a higher rate, and the refinancing auction
/// ceiling converges on this value.
pub const LIQUIDATION_THRESHOLD_BPS: u32 = 100_000;

/// Default upper bound on a lien's auction duration (blocks).
pub const DEFAULT_MAX_AUCTION_DURATION: u64 = 432_000;

/// Default number of blocks an oracle co-signature stays valid.
pub const DEFAULT_ORACLE_BLOCK_RANGE: u64 = 10;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenLien";
