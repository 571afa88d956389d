//! Per-offer drawn-amount counters.
//!
//! A loan offer can fund many liens until the sum of their principals hits
//! `total_amount`. Counters are keyed by offer hash and only ever grow; a
//! new nonce or salt yields a new hash and so a fresh counter.

use std::collections::HashMap;

use openlien_types::{Journaled, Mark, OfferHash, OpenlienError, Result, UndoLog};

#[derive(Debug, Clone, Default)]
pub struct OfferCapacity {
    taken: HashMap<OfferHash, u128>,
    undo: UndoLog<(OfferHash, Option<u128>)>,
}

impl OfferCapacity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount already drawn against `hash`.
    #[must_use]
    pub fn amount_taken(&self, hash: &OfferHash) -> u128 {
        self.taken.get(hash).copied().unwrap_or(0)
    }

    /// Draw `amount` against an offer capped at `total`. Returns the new
    /// cumulative amount.
    ///
    /// # Errors
    /// `InsufficientOffer` if the draw would exceed `total`; the counter is
    /// left untouched.
    pub fn draw(&mut self, hash: OfferHash, amount: u128, total: u128) -> Result<u128> {
        let taken = self.amount_taken(&hash);
        let remaining = total.saturating_sub(taken);
        if amount > remaining {
            return Err(OpenlienError::InsufficientOffer {
                requested: amount,
                remaining,
            });
        }
        let updated = taken + amount;
        let prior = self.taken.insert(hash, updated);
        self.undo.record((hash, prior));
        Ok(updated)
    }
}

impl Journaled for OfferCapacity {
    type Checkpoint = Mark;

    fn checkpoint(&mut self) -> Mark {
        self.undo.mark()
    }

    fn rollback(&mut self, checkpoint: Mark) {
        for (hash, prior) in self.undo.unwind(checkpoint) {
            match prior {
                Some(taken) => self.taken.insert(hash, taken),
                None => self.taken.remove(&hash),
            };
        }
    }

    fn commit(&mut self, checkpoint: Mark) {
        self.undo.release(checkpoint);
    }
}
