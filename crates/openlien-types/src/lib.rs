//! # openlien-types
//!
//! Shared types, errors, and configuration for the **OpenLien** lien engine.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`CollectionId`], [`ItemId`], [`LienId`], [`OfferHash`], [`Fingerprint`], [`TxId`]
//! - **Lien model**: [`Lien`], [`LienPointer`]
//! - **Offer model**: [`LoanOffer`], [`SellOffer`], [`LoanInput`], [`SellInput`], [`Fee`], [`OfferSignature`], [`OfferAuth`]
//! - **Marketplace model**: [`MarketOrder`], [`Execution`], [`Side`], [`Payment`]
//! - **Events**: [`LienEvent`], [`EventRecord`]
//! - **Context**: [`TxContext`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`OpenlienError`] with `OL_ERR_` prefix codes, [`ErrorKind`]
//! - **Rollback**: [`Journaled`], [`UndoLog`]
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod event;
pub mod ids;
pub mod journal;
pub mod lien;
pub mod market;
pub mod offer;

// Re-export all primary types at crate root for ergonomic imports:
//   use openlien_types::{Lien, LoanOffer, TxContext, ...};

pub use config::*;
pub use context::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use journal::*;
pub use lien::*;
pub use market::*;
pub use offer::*;

// Constants are accessed via `openlien_types::constants::FOO`
// (not re-exported to avoid name collisions).
