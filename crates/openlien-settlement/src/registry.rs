//! Collateral registry: ownership and transfer authorization of items.
//!
//! A transfer is authorized when the operator is the owner, the item's
//! approved delegate, or an operator the owner approved for the whole
//! collection. Item approvals are cleared on every transfer.

use std::collections::{HashMap, HashSet};

use openlien_types::{
    Address, CollectionId, ItemId, Journaled, Mark, OpenlienError, Result, UndoLog,
};

/// Asset movement capability consumed by settlement.
pub trait CollateralRegistry {
    /// Current owner of an item, if it exists.
    fn owner_of(&self, collection: &CollectionId, item: ItemId) -> Option<Address>;

    /// Move `item` from `from` to `to` on behalf of `operator`.
    fn transfer(
        &mut self,
        operator: Address,
        collection: CollectionId,
        from: Address,
        to: Address,
        item: ItemId,
    ) -> Result<()>;

    /// Let `delegate` move one item owned by `owner`.
    fn approve(
        &mut self,
        owner: Address,
        delegate: Address,
        collection: CollectionId,
        item: ItemId,
    ) -> Result<()>;

    /// Let (or stop letting) `operator` move every item `owner` holds in a collection.
    fn set_approval_for_all(
        &mut self,
        owner: Address,
        collection: CollectionId,
        operator: Address,
        approved: bool,
    );
}

/// In-memory collateral registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    owners: HashMap<(CollectionId, ItemId), Address>,
    approvals: HashMap<(CollectionId, ItemId), Address>,
    operators: HashSet<(CollectionId, Address, Address)>,
    undo: UndoLog<Undo>,
}

type Slot = (CollectionId, ItemId);

#[derive(Debug, Clone)]
enum Undo {
    Owner(Slot, Option<Address>),
    Approval(Slot, Option<Address>),
    /// Operator grant and whether it was present before.
    Operator((CollectionId, Address, Address), bool),
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `item` owned by `owner`.
    pub fn mint(&mut self, collection: CollectionId, item: ItemId, owner: Address) {
        self.set_owner((collection, item), owner);
    }

    fn set_owner(&mut self, slot: Slot, owner: Address) {
        let prior = self.owners.insert(slot, owner);
        self.undo.record(Undo::Owner(slot, prior));
    }

    fn set_approval(&mut self, slot: Slot, delegate: Option<Address>) {
        let prior = match delegate {
            Some(delegate) => self.approvals.insert(slot, delegate),
            None => self.approvals.remove(&slot),
        };
        if prior != delegate {
            self.undo.record(Undo::Approval(slot, prior));
        }
    }

    fn is_authorized(
        &self,
        operator: &Address,
        collection: CollectionId,
        owner: &Address,
        item: ItemId,
    ) -> bool {
        operator == owner
            || self.approvals.get(&(collection, item)) == Some(operator)
            || self.operators.contains(&(collection, *owner, *operator))
    }
}

impl CollateralRegistry for InMemoryRegistry {
    fn owner_of(&self, collection: &CollectionId, item: ItemId) -> Option<Address> {
        self.owners.get(&(*collection, item)).copied()
    }

    fn transfer(
        &mut self,
        operator: Address,
        collection: CollectionId,
        from: Address,
        to: Address,
        item: ItemId,
    ) -> Result<()> {
        if self.owner_of(&collection, item) != Some(from) {
            return Err(OpenlienError::CollateralNotOwned {
                collection,
                item,
                expected: from,
            });
        }
        if !self.is_authorized(&operator, collection, &from, item) {
            return Err(OpenlienError::CollateralTransferUnauthorized { operator });
        }
        self.set_approval((collection, item), None);
        self.set_owner((collection, item), to);
        Ok(())
    }

    fn approve(
        &mut self,
        owner: Address,
        delegate: Address,
        collection: CollectionId,
        item: ItemId,
    ) -> Result<()> {
        if self.owner_of(&collection, item) != Some(owner) {
            return Err(OpenlienError::CollateralNotOwned {
                collection,
                item,
                expected: owner,
            });
        }
        self.set_approval((collection, item), Some(delegate));
        Ok(())
    }

    fn set_approval_for_all(
        &mut self,
        owner: Address,
        collection: CollectionId,
        operator: Address,
        approved: bool,
    ) {
        let grant = (collection, owner, operator);
        let changed = if approved {
            self.operators.insert(grant)
        } else {
            self.operators.remove(&grant)
        };
        if changed {
            self.undo.record(Undo::Operator(grant, !approved));
        }
    }
}

impl Journaled for InMemoryRegistry {
    type Checkpoint = Mark;

    fn checkpoint(&mut self) -> Mark {
        self.undo.mark()
    }

    fn rollback(&mut self, checkpoint: Mark) {
        for entry in self.undo.unwind(checkpoint) {
            match entry {
                Undo::Owner(slot, Some(owner)) => {
                    self.owners.insert(slot, owner);
                }
                Undo::Owner(slot, None) => {
                    self.owners.remove(&slot);
                }
                Undo::Approval(slot, Some(delegate)) => {
                    self.approvals.insert(slot, delegate);
                }
                Undo::Approval(slot, None) => {
                    self.approvals.remove(&slot);
                }
                Undo::Operator(grant, true) => {
                    self.operators.insert(grant);
                }
                Undo::Operator(grant, false) => {
                    self.operators.remove(&grant);
                }
            }
        }
    }

    fn commit(&mut self, checkpoint: Mark) {
        self.undo.release(checkpoint);
    }
}
