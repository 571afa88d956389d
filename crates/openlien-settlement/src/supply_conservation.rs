//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced after every settlement plan:
//! ```text
//! Σ(custodial balances) + Σ(native wallets) == Σ(issued)
//! ```
//!
//! Settlement only ever moves currency between accounts. If the sum ever
//! drifts, a settlement branch created or destroyed value.

use openlien_types::{OpenlienError, Result};

/// Tracks total currency issued into the system.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    issued: u128,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record currency entering the system (funding a wallet).
    pub fn record_issuance(&mut self, amount: u128) {
        self.issued = self.issued.saturating_add(amount);
    }

    /// Reset the issued total to a value previously read from
    /// [`expected_supply`](Self::expected_supply).
    pub(crate) fn restore(&mut self, issued: u128) {
        self.issued = issued;
    }

    /// Expected total supply.
    #[must_use]
    pub fn expected_supply(&self) -> u128 {
        self.issued
    }

    /// Verify the actual supply matches everything ever issued.
    ///
    /// # Errors
    /// Returns [`OpenlienError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, actual_supply: u128) -> Result<()> {
        if actual_supply != self.issued {
            return Err(OpenlienError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual_supply} != issued {}",
                    self.issued
                ),
            });
        }
        Ok(())
    }
}
