//! Custodial pool for the payment currency.
//!
//! The pool holds per-account custodial balances. It also models the native
//! wallets funds are withdrawn to and deposited from, so that flows paying
//! the exchange in native currency stay inside one conserved supply.
//!
//! The lien engine is the pool's trusted operator: it may move any
//! account's custodial balance. Nothing here is consulted for trust
//! decisions about liens.

use std::collections::HashMap;

use openlien_types::{Address, Journaled, Mark, OpenlienError, Result, UndoLog};

use crate::supply_conservation::SupplyConservation;

/// Fund movement capability consumed by settlement.
pub trait CustodialPool {
    /// Custodial balance of `account`.
    fn balance_of(&self, account: &Address) -> u128;

    /// Native (non-custodial) balance of `account`.
    fn native_balance_of(&self, account: &Address) -> u128;

    /// Move custodial balance between accounts.
    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<()>;

    /// Move custodial balance of `from` out of the pool into `to`'s native wallet.
    fn withdraw_to(&mut self, from: Address, to: Address, amount: u128) -> Result<()>;

    /// Move native currency of `payer` into the pool, credited to `payer`.
    fn deposit_on_behalf(&mut self, payer: Address, amount: u128) -> Result<()>;

    /// Pay native currency from one wallet to another.
    fn pay_native(&mut self, from: Address, to: Address, amount: u128) -> Result<()>;

    /// Custodial plus native currency across all accounts.
    fn total_supply(&self) -> u128;
}

/// In-memory custodial pool.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPool {
    /// Custodial balances.
    balances: HashMap<Address, u128>,
    /// Native wallet balances.
    native: HashMap<Address, u128>,
    /// Issuance tracker.
    supply: SupplyConservation,
    undo: UndoLog<Undo>,
}

#[derive(Debug, Clone, Copy)]
enum Ledger {
    Custodial,
    Native,
}

#[derive(Debug, Clone)]
enum Undo {
    /// Balance before a write; `None` if the account had no entry.
    Balance(Ledger, Address, Option<u128>),
    /// Issued total before a funding.
    Issued(u128),
}

impl InMemoryPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue native currency into `account`'s wallet.
    pub fn fund_native(&mut self, account: Address, amount: u128) {
        self.issue(Ledger::Native, account, amount);
    }

    /// Issue currency straight into `account`'s custodial balance.
    pub fn fund(&mut self, account: Address, amount: u128) {
        self.issue(Ledger::Custodial, account, amount);
    }

    /// Check the conservation invariant against everything issued.
    pub fn verify_supply(&self) -> Result<()> {
        self.supply.verify(self.total_supply())
    }

    fn ledger(&self, ledger: Ledger) -> &HashMap<Address, u128> {
        match ledger {
            Ledger::Custodial => &self.balances,
            Ledger::Native => &self.native,
        }
    }

    fn get(&self, ledger: Ledger, account: &Address) -> u128 {
        self.ledger(ledger).get(account).copied().unwrap_or(0)
    }

    fn set(&mut self, ledger: Ledger, account: Address, balance: u128) {
        let map = match ledger {
            Ledger::Custodial => &mut self.balances,
            Ledger::Native => &mut self.native,
        };
        let prior = map.insert(account, balance);
        self.undo.record(Undo::Balance(ledger, account, prior));
    }

    fn issue(&mut self, ledger: Ledger, account: Address, amount: u128) {
        let balance = self.get(ledger, &account).saturating_add(amount);
        self.set(ledger, account, balance);
        self.undo.record(Undo::Issued(self.supply.expected_supply()));
        self.supply.record_issuance(amount);
    }

    fn debit(&mut self, ledger: Ledger, account: Address, amount: u128) -> Result<()> {
        let available = self.get(ledger, &account);
        if available < amount {
            return Err(OpenlienError::InsufficientBalance {
                account,
                needed: amount,
                available,
            });
        }
        self.set(ledger, account, available - amount);
        Ok(())
    }

    fn credit(&mut self, ledger: Ledger, account: Address, amount: u128) -> Result<()> {
        let balance = self
            .get(ledger, &account)
            .checked_add(amount)
            .ok_or(OpenlienError::overflow("pool credit"))?;
        self.set(ledger, account, balance);
        Ok(())
    }
}

impl CustodialPool for InMemoryPool {
    fn balance_of(&self, account: &Address) -> u128 {
        self.get(Ledger::Custodial, account)
    }

    fn native_balance_of(&self, account: &Address) -> u128 {
        self.get(Ledger::Native, account)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<()> {
        self.debit(Ledger::Custodial, from, amount)?;
        self.credit(Ledger::Custodial, to, amount)
    }

    fn withdraw_to(&mut self, from: Address, to: Address, amount: u128) -> Result<()> {
        self.debit(Ledger::Custodial, from, amount)?;
        self.credit(Ledger::Native, to, amount)
    }

    fn deposit_on_behalf(&mut self, payer: Address, amount: u128) -> Result<()> {
        self.debit(Ledger::Native, payer, amount)?;
        self.credit(Ledger::Custodial, payer, amount)
    }

    fn pay_native(&mut self, from: Address, to: Address, amount: u128) -> Result<()> {
        self.debit(Ledger::Native, from, amount)?;
        self.credit(Ledger::Native, to, amount)
    }

    fn total_supply(&self) -> u128 {
        self.balances
            .values()
            .chain(self.native.values())
            .fold(0u128, |acc, v| acc.saturating_add(*v))
    }
}

impl Journaled for InMemoryPool {
    type Checkpoint = Mark;

    fn checkpoint(&mut self) -> Mark {
        self.undo.mark()
    }

    fn rollback(&mut self, checkpoint: Mark) {
        for entry in self.undo.unwind(checkpoint) {
            match entry {
                Undo::Balance(ledger, account, prior) => {
                    let map = match ledger {
                        Ledger::Custodial => &mut self.balances,
                        Ledger::Native => &mut self.native,
                    };
                    match prior {
                        Some(balance) => map.insert(account, balance),
                        None => map.remove(&account),
                    };
                }
                Undo::Issued(issued) => self.supply.restore(issued),
            }
        }
    }

    fn commit(&mut self, checkpoint: Mark) {
        self.undo.release(checkpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fund_increases_balance() {
        let mut pool = InMemoryPool::new();
        let user = Address::random();
        pool.fund(user, 1_000);
        assert_eq!(pool.balance_of(&user), 1_000);
        assert_eq!(pool.native_balance_of(&user), 0);
        pool.verify_supply().unwrap();
    }

    #[test]
    fn transfer_moves_custodial_balance() {
        let mut pool = InMemoryPool::new();
        let (a, b) = (Address::random(), Address::random());
        pool.fund(a, 100);
        pool.transfer(a, b, 40).unwrap();
        assert_eq!(pool.balance_of(&a), 60);
        assert_eq!(pool.balance_of(&b), 40);
        pool.verify_supply().unwrap();
    }

    #[test]
    fn transfer_insufficient_fails_unchanged() {
        let mut pool = InMemoryPool::new();
        let (a, b) = (Address::random(), Address::random());
        pool.fund(a, 10);
        let err = pool.transfer(a, b, 11).unwrap_err();
        assert!(matches!(
            err,
            OpenlienError::InsufficientBalance {
                needed: 11,
                available: 10,
                ..
            }
        ));
        assert_eq!(pool.balance_of(&a), 10);
        assert_eq!(pool.balance_of(&b), 0);
    }

    #[test]
    fn withdraw_and_deposit_cross_the_pool_boundary() {
        let mut pool = InMemoryPool::new();
        let (a, b) = (Address::random(), Address::random());
        pool.fund(a, 100);
        pool.withdraw_to(a, b, 30).unwrap();
        assert_eq!(pool.balance_of(&a), 70);
        assert_eq!(pool.native_balance_of(&b), 30);

        pool.deposit_on_behalf(b, 20).unwrap();
        assert_eq!(pool.native_balance_of(&b), 10);
        assert_eq!(pool.balance_of(&b), 20);
        pool.verify_supply().unwrap();
    }

    #[test]
    fn pay_native_requires_funds() {
        let mut pool = InMemoryPool::new();
        let (a, b) = (Address::random(), Address::random());
        pool.fund_native(a, 5);
        pool.pay_native(a, b, 5).unwrap();
        assert!(pool.pay_native(a, b, 1).is_err());
        assert_eq!(pool.native_balance_of(&b), 5);
    }

    #[test]
    fn rollback_restores_balances() {
        let mut pool = InMemoryPool::new();
        let (a, b) = (Address::random(), Address::random());
        pool.fund(a, 100);
        let cp = pool.checkpoint();
        pool.transfer(a, b, 100).unwrap();
        pool.rollback(cp);
        assert_eq!(pool.balance_of(&a), 100);
        assert_eq!(pool.balance_of(&b), 0);
    }

    #[test]
    fn rollback_reverts_funding_and_issuance_together() {
        let mut pool = InMemoryPool::new();
        let (a, b) = (Address::random(), Address::random());
        pool.fund(a, 100);

        let cp = pool.checkpoint();
        pool.fund_native(b, 40);
        pool.deposit_on_behalf(b, 40).unwrap();
        pool.transfer(b, a, 15).unwrap();
        pool.rollback(cp);

        assert_eq!(pool.balance_of(&a), 100);
        assert_eq!(pool.balance_of(&b), 0);
        assert_eq!(pool.native_balance_of(&b), 0);
        assert_eq!(pool.total_supply(), 100);
        pool.verify_supply().unwrap();
    }

    #[test]
    fn nested_checkpoint_commit_is_undone_by_outer_rollback() {
        let mut pool = InMemoryPool::new();
        let (a, b) = (Address::random(), Address::random());
        pool.fund(a, 100);

        let outer = pool.checkpoint();
        let inner = pool.checkpoint();
        pool.transfer(a, b, 60).unwrap();
        pool.commit(inner);
        assert_eq!(pool.balance_of(&b), 60);
        pool.rollback(outer);

        assert_eq!(pool.balance_of(&a), 100);
        assert_eq!(pool.balance_of(&b), 0);
    }
}
