//! Order types exchanged with the external marketplace.
//!
//! The engine only ever acts as the taker: it reads the counter-party's
//! maker order out of an [`Execution`], builds its own side of the trade,
//! and hands both to the exchange.

use serde::{Deserialize, Serialize};

use crate::{Address, CollectionId, Fee, ItemId, Salt};

/// Which side of the trade an order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Payment {
    /// Native currency carried as call value.
    Native,
    /// Balance held in the custodial pool.
    Pool,
}

impl std::fmt::Display for Payment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "NATIVE"),
            Self::Pool => write!(f, "POOL"),
        }
    }
}

/// A single marketplace order for one collateral item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrder {
    pub trader: Address,
    pub side: Side,
    pub collection: CollectionId,
    pub item_id: ItemId,
    pub payment: Payment,
    pub price: u128,
    /// Fees carved out of the seller's proceeds.
    pub fees: Vec<Fee>,
    pub salt: Salt,
    /// Unix seconds; `u64::MAX` for orders that never expire.
    pub expiration_time: u64,
}

impl std::fmt::Display for MarketOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} @ {} ({}) by {}",
            self.side, self.collection, self.item_id, self.price, self.payment, self.trader,
        )
    }
}

/// A counter-party's maker order the engine is asked to take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub maker_order: MarketOrder,
}
