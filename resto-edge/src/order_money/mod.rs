//! Money calculation for order documents using rust_decimal
//!
//! Recomputes every derived total of an [`Order`] from its items, taxes
//! and payments. Voided items are economically invisible: their monetary
//! fields are zeroed after the original economics are frozen into the
//! write-once void snapshot.

use rust_decimal::prelude::*;
use shared::order::{ChargeType, LineItem, Order, PaymentLine};
use shared::currency_precision;

/// Line-level rounding (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Smallest payment adjustment step (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to 2 decimal places
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to the currency's precision (0 for IDR-class, else 2)
#[inline]
pub fn round_currency(value: Decimal, currency: &str) -> Decimal {
    value.round_dp_with_strategy(
        currency_precision(currency),
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Freeze qty/rate/amount of a voided item, once
///
/// Each snapshot field is only written while it is still zero, so a later
/// recalculation (after the live fields were zeroed) never overwrites it.
pub fn capture_void_snapshot(item: &mut LineItem) {
    if item.void_qty.is_zero() {
        item.void_qty = item.qty;
    }
    if item.void_rate.is_zero() {
        item.void_rate = item.rate;
    }
    if item.void_amount.is_zero() {
        item.void_amount = if item.amount.is_zero() {
            round_money(item.rate * item.qty)
        } else {
            item.amount
        };
    }
}

/// Zero every field that could re-enter an aggregate
fn neutralize_voided(item: &mut LineItem) {
    item.rate = Decimal::ZERO;
    item.amount = Decimal::ZERO;
    item.net_amount = Decimal::ZERO;
    item.base_amount = Decimal::ZERO;
    item.base_net_amount = Decimal::ZERO;
    item.discount_percentage = Decimal::ZERO;
    item.discount_amount = Decimal::ZERO;
}

/// Sum payment amounts
pub fn sum_payments(payments: &[PaymentLine]) -> Decimal {
    payments.iter().map(|p| p.amount).sum()
}

/// Compare two monetary values (within 0.01)
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

/// Scale payment lines so they sum exactly to `target`
///
/// Each line keeps its share of the current sum, floored to 0.01; the
/// residual is handed out in 0.01 steps to the lines with the largest
/// remainders (ties go to the earlier line). When the current sum is
/// zero the first line takes the whole amount.
pub fn prorate_payments(payments: &mut [PaymentLine], target: Decimal) {
    match payments.len() {
        0 => return,
        1 => {
            payments[0].amount = target;
            return;
        }
        _ => {}
    }

    let current = sum_payments(payments);
    if current.is_zero() {
        for (idx, p) in payments.iter_mut().enumerate() {
            p.amount = if idx == 0 { target } else { Decimal::ZERO };
        }
        return;
    }

    let shares: Vec<Decimal> = payments
        .iter()
        .map(|p| p.amount * target / current)
        .collect();
    let floors: Vec<Decimal> = shares
        .iter()
        .map(|s| s.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::ToNegativeInfinity))
        .collect();

    let residual = target - floors.iter().copied().sum::<Decimal>();
    let steps = (residual / MONEY_TOLERANCE).round().to_i64().unwrap_or(0);

    // Stable sort keeps line order among equal remainders
    let remainder = |i: usize| shares[i] - floors[i];
    let mut order: Vec<usize> = (0..payments.len()).collect();
    if steps >= 0 {
        order.sort_by(|&a, &b| remainder(b).cmp(&remainder(a)));
    } else {
        order.sort_by(|&a, &b| remainder(a).cmp(&remainder(b)));
    }

    for (p, floor) in payments.iter_mut().zip(&floors) {
        p.amount = *floor;
    }
    let step = if steps < 0 {
        -MONEY_TOLERANCE
    } else {
        MONEY_TOLERANCE
    };
    for k in 0..steps.unsigned_abs() as usize {
        let idx = order[k % order.len()];
        payments[idx].amount += step;
    }
}

/// Recalculate an order, returning the updated document
pub fn recalculate(mut order: Order) -> Order {
    recalculate_totals(&mut order);
    order
}

/// Recalculate all derived fields of an order in place
///
/// Deterministic and idempotent: running it twice yields the same
/// document.
pub fn recalculate_totals(order: &mut Order) {
    let conversion = order.effective_conversion_rate();

    // Items
    let mut total = Decimal::ZERO;
    let mut net_total = Decimal::ZERO;
    let mut active_count = 0usize;

    for item in &mut order.items {
        if item.is_voided() {
            capture_void_snapshot(item);
            neutralize_voided(item);
            continue;
        }

        // Rate is already net of the item discount
        item.amount = round_money(item.rate * item.qty);
        item.net_amount = item.amount;
        item.base_amount = round_money(item.amount * conversion);
        item.base_net_amount = round_money(item.net_amount * conversion);

        total += item.amount;
        net_total += item.net_amount;
        active_count += 1;
    }

    // Taxes
    let mut taxes_total = Decimal::ZERO;
    for tax in &mut order.taxes {
        tax.tax_amount = match tax.charge_type {
            ChargeType::OnNetTotal => round_money(net_total * tax.rate / Decimal::ONE_HUNDRED),
            ChargeType::Unsupported => Decimal::ZERO,
        };
        taxes_total += tax.tax_amount;
        tax.total = net_total + taxes_total;
    }

    // Header discount
    let discount_ceiling = (net_total + taxes_total).max(Decimal::ZERO);
    if order.additional_discount_percentage > Decimal::ZERO {
        order.discount_amount =
            round_money(net_total * order.additional_discount_percentage / Decimal::ONE_HUNDRED);
    }
    // `discount_amount` stays as requested; only the applied value is clamped
    order.applied_discount_amount = if active_count == 0 {
        Decimal::ZERO
    } else {
        order.discount_amount.clamp(Decimal::ZERO, discount_ceiling)
    };

    let grand_total = net_total + taxes_total - order.applied_discount_amount;
    let rounded_total = round_currency(grand_total, &order.currency);

    order.total = total;
    order.net_total = net_total;
    order.total_taxes_and_charges = taxes_total;
    order.grand_total = grand_total;
    order.rounded_total = rounded_total;

    order.base_total = round_money(total * conversion);
    order.base_net_total = round_money(net_total * conversion);
    order.base_grand_total = round_money(grand_total * conversion);
    order.base_rounded_total = round_money(rounded_total * conversion);

    // Payments
    if order.is_settlement {
        if order.payments.is_empty() {
            order.paid_amount = Decimal::ZERO;
            order.outstanding_amount = rounded_total;
        } else {
            prorate_payments(&mut order.payments, rounded_total);
            order.paid_amount = rounded_total;
            order.outstanding_amount = Decimal::ZERO;
        }
        order.change_amount = order
            .tendered_amount
            .map(|t| (t - rounded_total).max(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO);
    } else {
        let paid = sum_payments(&order.payments);
        order.paid_amount = paid;
        order.outstanding_amount = (rounded_total - paid).max(Decimal::ZERO);
        order.change_amount = (paid - rounded_total).max(Decimal::ZERO);
    }

    tracing::debug!(
        order_id = %order.name,
        active_items = active_count,
        net_total = %order.net_total,
        taxes = %order.total_taxes_and_charges,
        grand_total = %order.grand_total,
        rounded_total = %order.rounded_total,
        outstanding = %order.outstanding_amount,
        "Order recalculated"
    );
}

#[cfg(test)]
mod tests;
