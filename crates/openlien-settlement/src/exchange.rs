//! External exchange boundary.
//!
//! The lien engine treats execution as an opaque, fallible side effect. It
//! never trusts a return value: success of a sale is judged afterwards from
//! its own balance delta and item ownership.
//!
//! [`InMemoryExchange`] settles exactly one sell/buy pair. It implements no
//! matching policy: both orders must already agree on item, price and
//! payment kind.

use openlien_types::{
    Address, MarketOrder, OpenlienError, Payment, Result, Side, constants,
};

use crate::pool::CustodialPool;
use crate::registry::CollateralRegistry;

/// One execution call.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    /// The account making the call; must be one of the two traders.
    pub caller: Address,
    pub sell: &'a MarketOrder,
    pub buy: &'a MarketOrder,
    /// Native currency attached to the call.
    pub value: u128,
    /// Unix seconds, for order expiry.
    pub now: u64,
}

/// Matches and settles one maker/taker pair.
pub trait Exchange {
    /// Address collateral must be approved to before execution.
    fn address(&self) -> Address;

    /// Atomically settle the pair, moving funds and the item.
    fn execute(
        &mut self,
        request: &ExecutionRequest<'_>,
        pool: &mut dyn CustodialPool,
        registry: &mut dyn CollateralRegistry,
    ) -> Result<()>;
}

/// Minimal in-process exchange.
#[derive(Debug, Clone)]
pub struct InMemoryExchange {
    address: Address,
}

impl InMemoryExchange {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    fn reject(reason: impl Into<String>) -> OpenlienError {
        OpenlienError::ExchangeRejected {
            reason: reason.into(),
        }
    }

    fn check_pair(request: &ExecutionRequest<'_>) -> Result<()> {
        let (sell, buy) = (request.sell, request.buy);
        if sell.side != Side::Sell || buy.side != Side::Buy {
            return Err(Self::reject("orders must be one SELL and one BUY"));
        }
        if sell.trader == buy.trader {
            return Err(Self::reject("self-trade"));
        }
        if request.caller != sell.trader && request.caller != buy.trader {
            return Err(Self::reject("caller is neither trader"));
        }
        if sell.collection != buy.collection || sell.item_id != buy.item_id {
            return Err(Self::reject("orders reference different items"));
        }
        if sell.payment != buy.payment {
            return Err(Self::reject("payment kinds differ"));
        }
        if sell.price != buy.price {
            return Err(Self::reject(format!(
                "price mismatch: sell {} buy {}",
                sell.price, buy.price
            )));
        }
        if sell.expiration_time < request.now || buy.expiration_time < request.now {
            return Err(Self::reject("order expired"));
        }
        match sell.payment {
            Payment::Native => {
                if request.caller != buy.trader || request.value != sell.price {
                    return Err(Self::reject("native payment must be attached by the buyer"));
                }
            }
            Payment::Pool => {
                if request.value != 0 {
                    return Err(Self::reject("pool payment carries no native value"));
                }
            }
        }
        Ok(())
    }

    /// Fee transfers owed out of the sale, and their total.
    fn fee_schedule(request: &ExecutionRequest<'_>) -> Result<(Vec<(Address, u128)>, u128)> {
        let price = request.sell.price;
        let mut payouts = Vec::new();
        let mut total = 0u128;
        for fee in request.sell.fees.iter().chain(request.buy.fees.iter()) {
            let amount = price
                .checked_mul(u128::from(fee.rate))
                .ok_or(OpenlienError::overflow("exchange fee"))?
                / constants::BASIS_POINTS;
            total = total
                .checked_add(amount)
                .ok_or(OpenlienError::overflow("exchange fee total"))?;
            payouts.push((fee.recipient, amount));
        }
        if total > price {
            return Err(Self::reject(format!("fees {total} exceed price {price}")));
        }
        Ok((payouts, total))
    }
}

impl Exchange for InMemoryExchange {
    fn address(&self) -> Address {
        self.address
    }

    fn execute(
        &mut self,
        request: &ExecutionRequest<'_>,
        pool: &mut dyn CustodialPool,
        registry: &mut dyn CollateralRegistry,
    ) -> Result<()> {
        Self::check_pair(request)?;
        let (payouts, total_fees) = Self::fee_schedule(request)?;
        let (sell, buy) = (request.sell, request.buy);

        registry.transfer(
            self.address,
            sell.collection,
            sell.trader,
            buy.trader,
            sell.item_id,
        )?;

        let proceeds = sell.price - total_fees;
        match sell.payment {
            Payment::Native => {
                pool.pay_native(buy.trader, sell.trader, proceeds)?;
                for (recipient, amount) in payouts {
                    pool.pay_native(buy.trader, recipient, amount)?;
                }
            }
            Payment::Pool => {
                pool.transfer(buy.trader, sell.trader, proceeds)?;
                for (recipient, amount) in payouts {
                    pool.transfer(buy.trader, recipient, amount)?;
                }
            }
        }

        tracing::debug!(
            seller = %sell.trader,
            buyer = %buy.trader,
            item = %sell.item_id,
            price = sell.price,
            fees = total_fees,
            "Exchange execution settled"
        );
        Ok(())
    }
}
