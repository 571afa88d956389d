//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{OpenlienError, Result, constants};

/// Tunable limits for a lien engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound (blocks) on any auction duration a new lien may carry.
    pub max_auction_duration: u64,
    /// Rate ceiling in bps: offers above it are rejected and the auction
    /// ceiling converges on it.
    pub liquidation_threshold_bps: u32,
    /// Blocks an oracle co-signature stays valid after it was issued.
    pub oracle_block_range: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_auction_duration: constants::DEFAULT_MAX_AUCTION_DURATION,
            liquidation_threshold_bps: constants::LIQUIDATION_THRESHOLD_BPS,
            oracle_block_range: constants::DEFAULT_ORACLE_BLOCK_RANGE,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    /// `Serialization` on malformed JSON, `Configuration` on invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    ///
    /// # Errors
    /// Returns `Configuration` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.max_auction_duration == 0 {
            return Err(OpenlienError::Configuration(
                "max_auction_duration must be > 0".into(),
            ));
        }
        if u128::from(self.liquidation_threshold_bps) <= constants::BASIS_POINTS {
            return Err(OpenlienError::Configuration(format!(
                "liquidation_threshold_bps must exceed {} (got {})",
                constants::BASIS_POINTS,
                self.liquidation_threshold_bps
            )));
        }
        Ok(())
    }
}
