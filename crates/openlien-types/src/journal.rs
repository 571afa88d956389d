//! Checkpoint/rollback contract for state an operation may have to revert.
//!
//! Lifecycle operations are all-or-nothing. Anything they mutate (lien
//! store, offer bookkeeping, custodial balances, collateral ownership)
//! implements [`Journaled`] so a failed operation can restore the exact
//! state it started from.
//!
//! Implementations record the value each write overwrites in an
//! [`UndoLog`] instead of copying the whole structure. Nothing is recorded
//! while no checkpoint is open, and the log is emptied when the outermost
//! checkpoint commits, so its size is bounded by one operation's writes.
//!
//! ```text
//!   checkpoint ─► mark ── write ── write ── write
//!                   │                         │
//!   rollback   ◄────┴──── undo in reverse ◄───┘
//!   commit     ─► drop the entries (outermost only)
//! ```

/// State that can be captured and later restored.
///
/// Checkpoints nest and must be resolved in LIFO order: each one is
/// passed to exactly one of [`rollback`](Self::rollback) or
/// [`commit`](Self::commit).
pub trait Journaled {
    /// Opaque position in the state's history.
    type Checkpoint;

    /// Open a checkpoint at the current state.
    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Restore the state captured by `checkpoint`, discarding everything since.
    fn rollback(&mut self, checkpoint: Self::Checkpoint);

    /// Keep everything since `checkpoint`.
    fn commit(&mut self, checkpoint: Self::Checkpoint);
}

/// Position in an [`UndoLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// Overwritten values recorded while at least one checkpoint is open.
#[derive(Debug, Clone)]
pub struct UndoLog<E> {
    entries: Vec<E>,
    open: usize,
}

impl<E> Default for UndoLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> UndoLog<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            open: 0,
        }
    }

    /// Remember how to undo one write. Dropped when no checkpoint is open.
    pub fn record(&mut self, entry: E) {
        if self.open > 0 {
            self.entries.push(entry);
        }
    }

    /// Open a checkpoint.
    pub fn mark(&mut self) -> Mark {
        self.open += 1;
        Mark(self.entries.len())
    }

    /// Close `mark` and hand back its entries, newest first, for the
    /// caller to undo.
    pub fn unwind(&mut self, mark: Mark) -> std::iter::Rev<std::vec::Drain<'_, E>> {
        self.open = self.open.saturating_sub(1);
        let at = mark.0.min(self.entries.len());
        self.entries.drain(at..).rev()
    }

    /// Close `mark`, keeping its writes.
    pub fn release(&mut self, mark: Mark) {
        debug_assert!(mark.0 <= self.entries.len());
        self.open = self.open.saturating_sub(1);
        if self.open == 0 {
            self.entries.clear();
        }
    }

    /// Entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
