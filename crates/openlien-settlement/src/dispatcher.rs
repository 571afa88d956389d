//! Atomic application of settlement plans.
//!
//! ```text
//!   SettlementPlan ──► Dispatcher ──► CustodialPool      (Transfer, WithdrawTo, DepositOnBehalf)
//!                          │     ├──► CollateralRegistry (MoveCollateral, ApproveCollateral)
//!                          │     └──► Exchange           (Execute)
//!                          ▼
//!              supply check, or rollback of pool + registry
//! ```
//!
//! Every instruction of a plan succeeds or none of them is observed. The
//! dispatcher acts for a single operator address (the lien engine's own
//! account): collateral moves and exchange calls are made in its name.

use openlien_types::{Address, Journaled, OpenlienError, Result, TxContext};

use crate::exchange::{Exchange, ExecutionRequest};
use crate::instruction::{Instruction, SettlementPlan};
use crate::pool::CustodialPool;
use crate::registry::CollateralRegistry;

/// Applies [`SettlementPlan`]s against the external collaborators.
#[derive(Debug, Clone)]
pub struct Dispatcher<P, R, X> {
    operator: Address,
    pool: P,
    registry: R,
    exchange: X,
}

impl<P, R, X> Dispatcher<P, R, X>
where
    P: CustodialPool + Journaled,
    R: CollateralRegistry + Journaled,
    X: Exchange,
{
    #[must_use]
    pub fn new(operator: Address, pool: P, registry: R, exchange: X) -> Self {
        Self {
            operator,
            pool,
            registry,
            exchange,
        }
    }

    /// Apply every instruction in order.
    ///
    /// On the first failure the pool and registry are restored to their
    /// state before the plan and the error is returned.
    ///
    /// # Errors
    /// The failing instruction's error, or
    /// [`OpenlienError::SupplyInvariantViolation`] if the plan changed the
    /// total currency supply.
    pub fn dispatch(&mut self, plan: &SettlementPlan, ctx: &TxContext) -> Result<()> {
        let checkpoint = self.checkpoint();
        let supply_before = self.pool.total_supply();

        let outcome = plan
            .instructions()
            .iter()
            .try_for_each(|ix| self.apply(ix, ctx))
            .and_then(|()| {
                let supply_after = self.pool.total_supply();
                if supply_after == supply_before {
                    Ok(())
                } else {
                    Err(OpenlienError::SupplyInvariantViolation {
                        reason: format!(
                            "plan changed supply: {supply_before} -> {supply_after}"
                        ),
                    })
                }
            });

        match &outcome {
            Ok(()) => self.commit(checkpoint),
            Err(err) => {
                tracing::warn!(
                    tx = %ctx.tx_id,
                    instructions = plan.len(),
                    error = %err,
                    "Settlement plan reverted"
                );
                self.rollback(checkpoint);
            }
        }
        outcome
    }

    fn apply(&mut self, instruction: &Instruction, ctx: &TxContext) -> Result<()> {
        tracing::debug!(tx = %ctx.tx_id, instruction = %instruction, "Applying instruction");
        match instruction {
            Instruction::Transfer { from, to, amount } => self.pool.transfer(*from, *to, *amount),
            Instruction::WithdrawTo { from, to, amount } => {
                self.pool.withdraw_to(*from, *to, *amount)
            }
            Instruction::DepositOnBehalf { payer, amount } => {
                self.pool.deposit_on_behalf(*payer, *amount)
            }
            Instruction::MoveCollateral {
                collection,
                item_id,
                from,
                to,
            } => self
                .registry
                .transfer(self.operator, *collection, *from, *to, *item_id),
            Instruction::ApproveCollateral {
                collection,
                item_id,
                delegate,
            } => self
                .registry
                .approve(self.operator, *delegate, *collection, *item_id),
            Instruction::Execute { sell, buy, value } => {
                let request = ExecutionRequest {
                    caller: self.operator,
                    sell,
                    buy,
                    value: *value,
                    now: ctx.timestamp,
                };
                self.exchange
                    .execute(&request, &mut self.pool, &mut self.registry)
            }
        }
    }

    /// Account the dispatcher acts as.
    #[must_use]
    pub fn operator(&self) -> Address {
        self.operator
    }

    #[must_use]
    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut P {
        &mut self.pool
    }

    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    #[must_use]
    pub fn exchange(&self) -> &X {
        &self.exchange
    }
}

impl<P, R, X> Journaled for Dispatcher<P, R, X>
where
    P: Journaled,
    R: Journaled,
{
    type Checkpoint = (P::Checkpoint, R::Checkpoint);

    fn checkpoint(&mut self) -> Self::Checkpoint {
        (self.pool.checkpoint(), self.registry.checkpoint())
    }

    fn rollback(&mut self, checkpoint: Self::Checkpoint) {
        let (pool, registry) = checkpoint;
        self.pool.rollback(pool);
        self.registry.rollback(registry);
    }

    fn commit(&mut self, checkpoint: Self::Checkpoint) {
        let (pool, registry) = checkpoint;
        self.pool.commit(pool);
        self.registry.commit(registry);
    }
}
