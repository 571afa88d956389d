//! Settlement instructions produced by the lien engine.
//!
//! A lifecycle operation never touches the pool or the registry directly.
//! It emits a [`SettlementPlan`]: an ordered list of [`Instruction`]s the
//! [`Dispatcher`](crate::Dispatcher) applies as one unit.

use openlien_types::{Address, CollectionId, ItemId, MarketOrder};
use serde::{Deserialize, Serialize};

/// One fund or asset movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Custodial balance `from` → `to`.
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },

    /// Custodial balance of `from` paid out to `to`'s native wallet.
    WithdrawTo {
        from: Address,
        to: Address,
        amount: u128,
    },

    /// Native currency of `payer` deposited into its custodial balance.
    DepositOnBehalf { payer: Address, amount: u128 },

    /// Collateral item `from` → `to`, moved by the dispatcher's operator.
    MoveCollateral {
        collection: CollectionId,
        item_id: ItemId,
        from: Address,
        to: Address,
    },

    /// Operator-owned item approved to `delegate`.
    ApproveCollateral {
        collection: CollectionId,
        item_id: ItemId,
        delegate: Address,
    },

    /// Execute a sell/buy pair through the exchange, called by the operator.
    Execute {
        sell: MarketOrder,
        buy: MarketOrder,
        value: u128,
    },
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transfer { from, to, amount } => {
                write!(f, "TRANSFER {amount} {from} -> {to}")
            }
            Self::WithdrawTo { from, to, amount } => {
                write!(f, "WITHDRAW {amount} {from} -> {to}")
            }
            Self::DepositOnBehalf { payer, amount } => {
                write!(f, "DEPOSIT {amount} for {payer}")
            }
            Self::MoveCollateral {
                collection,
                item_id,
                from,
                to,
            } => write!(f, "MOVE {collection} {item_id} {from} -> {to}"),
            Self::ApproveCollateral {
                collection,
                item_id,
                delegate,
            } => write!(f, "APPROVE {collection} {item_id} to {delegate}"),
            Self::Execute { sell, buy, value } => {
                write!(f, "EXECUTE [{sell}] x [{buy}] value={value}")
            }
        }
    }
}

/// Ordered instructions for one lifecycle operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    instructions: Vec<Instruction>,
}

impl SettlementPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Append a custodial transfer. Zero amounts are dropped.
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> &mut Self {
        if amount > 0 {
            self.instructions
                .push(Instruction::Transfer { from, to, amount });
        }
        self
    }

    /// Append a withdrawal to a native wallet. Zero amounts are dropped.
    pub fn withdraw_to(&mut self, from: Address, to: Address, amount: u128) -> &mut Self {
        if amount > 0 {
            self.instructions
                .push(Instruction::WithdrawTo { from, to, amount });
        }
        self
    }

    /// Append a native deposit. Zero amounts are dropped.
    pub fn deposit_on_behalf(&mut self, payer: Address, amount: u128) -> &mut Self {
        if amount > 0 {
            self.instructions
                .push(Instruction::DepositOnBehalf { payer, amount });
        }
        self
    }

    pub fn move_collateral(
        &mut self,
        collection: CollectionId,
        item_id: ItemId,
        from: Address,
        to: Address,
    ) -> &mut Self {
        self.push(Instruction::MoveCollateral {
            collection,
            item_id,
            from,
            to,
        })
    }

    pub fn approve_collateral(
        &mut self,
        collection: CollectionId,
        item_id: ItemId,
        delegate: Address,
    ) -> &mut Self {
        self.push(Instruction::ApproveCollateral {
            collection,
            item_id,
            delegate,
        })
    }

    pub fn execute(&mut self, sell: MarketOrder, buy: MarketOrder, value: u128) -> &mut Self {
        self.push(Instruction::Execute { sell, buy, value })
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
