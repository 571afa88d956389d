//! # openlien-settlement
//!
//! **Settlement Dispatcher**: turns a lifecycle outcome into fund and
//! collateral movements against the external collaborators.
//!
//! ## Architecture
//!
//! The lien engine decides *what* moves; this crate decides *how*:
//! 1. The engine builds a [`SettlementPlan`] of ordered [`Instruction`]s
//! 2. The [`Dispatcher`] applies them to the [`CustodialPool`],
//!    [`CollateralRegistry`] and [`Exchange`]
//! 3. Any failure restores pool and registry to their pre-plan state
//! 4. A successful plan must leave total currency supply unchanged
//!
//! ## Collaborators
//!
//! - [`InMemoryPool`]: custodial and native balances with issuance tracking
//! - [`InMemoryRegistry`]: item ownership, per-item and operator approvals
//! - [`InMemoryExchange`]: settles one sell/buy pair, no matching policy

pub mod dispatcher;
pub mod exchange;
pub mod instruction;
pub mod pool;
pub mod registry;
pub mod supply_conservation;

pub use dispatcher::Dispatcher;
pub use exchange::{Exchange, ExecutionRequest, InMemoryExchange};
pub use instruction::{Instruction, SettlementPlan};
pub use pool::{CustodialPool, InMemoryPool};
pub use registry::{CollateralRegistry, InMemoryRegistry};
pub use supply_conservation::SupplyConservation;
