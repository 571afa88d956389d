//! Marketplace fees carved out of a sell offer's nominal price.

use openlien_settlement::SettlementPlan;
use openlien_types::{Address, Fee, OpenlienError, Result, constants};

/// Each fee's amount, `price * rate / 10_000` truncated, in order.
///
/// # Errors
/// `FeesTooHigh` if the amounts sum above `price`.
pub fn fee_amounts(fees: &[Fee], price: u128) -> Result<Vec<(Address, u128)>> {
    let mut total = 0u128;
    let mut amounts = Vec::with_capacity(fees.len());
    for fee in fees {
        let amount = price
            .checked_mul(u128::from(fee.rate))
            .ok_or(OpenlienError::overflow("fee"))?
            / constants::BASIS_POINTS;
        total = total
            .checked_add(amount)
            .ok_or(OpenlienError::overflow("fee total"))?;
        amounts.push((fee.recipient, amount));
    }
    if total > price {
        return Err(OpenlienError::FeesTooHigh { fees: total, price });
    }
    Ok(amounts)
}

/// Append fee transfers from `payer` to `plan`; returns the price after fees.
///
/// # Errors
/// `FeesTooHigh` if the fees sum above `price`.
pub fn pay_fees(
    plan: &mut SettlementPlan,
    payer: Address,
    fees: &[Fee],
    price: u128,
) -> Result<u128> {
    let mut total = 0u128;
    for (recipient, amount) in fee_amounts(fees, price)? {
        plan.transfer(payer, recipient, amount);
        total += amount;
    }
    Ok(price - total)
}
