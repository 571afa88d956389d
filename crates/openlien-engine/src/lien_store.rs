//! Hash-committed lien store.
//!
//! Only a [`Fingerprint`] is kept per open lien. Callers supply the full
//! [`Lien`] on every operation; [`LienStore::require`] re-hashes it and
//! rejects anything that does not match what was committed.
//!
//! ```text
//!   LienId(0) ─► fp(lien₀)
//!   LienId(1) ─► fp(lien₁)      open  ⇔  id present
//!   LienId(3) ─► fp(lien₃)      ids strictly increasing, never reused
//! ```

use std::collections::BTreeMap;

use openlien_types::{Fingerprint, Journaled, Lien, LienId, Mark, OpenlienError, Result, UndoLog};

/// Id → fingerprint table plus the id counter.
#[derive(Debug, Clone)]
pub struct LienStore {
    fingerprints: BTreeMap<LienId, Fingerprint>,
    next_id: LienId,
    /// Prior slot contents; `None` means the id was not open.
    undo: UndoLog<(LienId, Option<Fingerprint>)>,
}

impl Default for LienStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LienStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fingerprints: BTreeMap::new(),
            next_id: LienId(0),
            undo: UndoLog::new(),
        }
    }

    /// Commit a new lien under the next id.
    pub fn create(&mut self, lien: &Lien) -> LienId {
        let id = self.next_id;
        self.next_id = id.next();
        let fingerprint = lien.fingerprint();
        tracing::debug!(lien = %id, fingerprint = %fingerprint, "Lien committed");
        let prior = self.fingerprints.insert(id, fingerprint);
        self.undo.record((id, prior));
        id
    }

    /// Whether `lien` is exactly the value committed under `id`.
    #[must_use]
    pub fn verify(&self, id: LienId, lien: &Lien) -> bool {
        self.fingerprints
            .get(&id)
            .is_some_and(|stored| *stored == lien.fingerprint())
    }

    /// [`verify`](Self::verify) as a precondition.
    ///
    /// # Errors
    /// `LienMismatch` if the lien is closed or the value differs.
    pub fn require(&self, id: LienId, lien: &Lien) -> Result<()> {
        if self.verify(id, lien) {
            Ok(())
        } else {
            Err(OpenlienError::LienMismatch(id))
        }
    }

    /// Replace the committed value of an open lien.
    ///
    /// # Errors
    /// `LienMismatch` if `id` is not open.
    pub fn update(&mut self, id: LienId, lien: &Lien) -> Result<()> {
        let slot = self
            .fingerprints
            .get_mut(&id)
            .ok_or(OpenlienError::LienMismatch(id))?;
        let prior = std::mem::replace(slot, lien.fingerprint());
        tracing::debug!(lien = %id, fingerprint = %slot, "Lien updated");
        self.undo.record((id, Some(prior)));
        Ok(())
    }

    /// Close a lien. Returns whether it was open.
    pub fn remove(&mut self, id: LienId) -> bool {
        match self.fingerprints.remove(&id) {
            Some(prior) => {
                self.undo.record((id, Some(prior)));
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_open(&self, id: LienId) -> bool {
        self.fingerprints.contains_key(&id)
    }

    /// Open lien ids, ascending.
    #[must_use]
    pub fn open_ids(&self) -> Vec<LienId> {
        self.fingerprints.keys().copied().collect()
    }

    /// Id the next [`create`](Self::create) will assign.
    #[must_use]
    pub fn next_id(&self) -> LienId {
        self.next_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

impl Journaled for LienStore {
    type Checkpoint = (Mark, LienId);

    fn checkpoint(&mut self) -> Self::Checkpoint {
        (self.undo.mark(), self.next_id)
    }

    fn rollback(&mut self, (mark, next_id): Self::Checkpoint) {
        for (id, prior) in self.undo.unwind(mark) {
            match prior {
                Some(fingerprint) => self.fingerprints.insert(id, fingerprint),
                None => self.fingerprints.remove(&id),
            };
        }
        self.next_id = next_id;
    }

    fn commit(&mut self, (mark, _): Self::Checkpoint) {
        self.undo.release(mark);
    }
}
