use super::*;
use rust_decimal_macros::dec;
use shared::order::{KitchenStatus, TaxLine};

fn fried_rice_order() -> Order {
    let mut order = Order::new("POSINV-0001", "IDR");
    order
        .items
        .push(LineItem::new("r1", "FR", "Fried Rice", dec!(2), dec!(20000)));
    order
}

fn void(order: &mut Order, row_id: &str) {
    if let Some(item) = order.item_mut(row_id) {
        item.status_kitchen = KitchenStatus::Voided;
    }
}

// ========== Scenarios ==========

#[test]
fn test_plain_order_totals() {
    let order = recalculate(fried_rice_order());

    assert_eq!(order.items[0].amount, dec!(40000));
    assert_eq!(order.items[0].net_amount, dec!(40000));
    assert_eq!(order.total, dec!(40000));
    assert_eq!(order.net_total, dec!(40000));
    assert_eq!(order.grand_total, dec!(40000));
    assert_eq!(order.rounded_total, dec!(40000));
    assert_eq!(order.outstanding_amount, dec!(40000));
}

#[test]
fn test_voided_item_captures_snapshot_and_zeroes_totals() {
    let mut order = fried_rice_order();
    order.is_settlement = true;
    order.payments.push(PaymentLine::new("Cash", dec!(40000)));
    let mut order = recalculate(order);
    assert_eq!(order.payments[0].amount, dec!(40000));

    void(&mut order, "r1");
    let order = recalculate(order);
    let item = &order.items[0];

    assert_eq!(item.void_qty, dec!(2));
    assert_eq!(item.void_rate, dec!(20000));
    assert_eq!(item.void_amount, dec!(40000));
    assert_eq!(item.qty, dec!(2));
    assert_eq!(item.rate, Decimal::ZERO);
    assert_eq!(item.amount, Decimal::ZERO);
    assert_eq!(item.net_amount, Decimal::ZERO);

    assert_eq!(order.total, Decimal::ZERO);
    assert_eq!(order.net_total, Decimal::ZERO);
    assert_eq!(order.grand_total, Decimal::ZERO);
    assert_eq!(order.payments[0].amount, Decimal::ZERO);
    assert_eq!(order.outstanding_amount, Decimal::ZERO);
}

#[test]
fn test_percentage_tax_sets_sole_payment() {
    let mut order = Order::new("POSINV-0003", "IDR");
    order
        .items
        .push(LineItem::new("r1", "SET", "Paket Keluarga", dec!(1), dec!(100000)));
    order.taxes.push(TaxLine::on_net_total("PB1 10%", dec!(10)));
    order.is_settlement = true;
    order.payments.push(PaymentLine::new("QRIS", dec!(1)));

    let order = recalculate(order);

    assert_eq!(order.net_total, dec!(100000));
    assert_eq!(order.taxes[0].tax_amount, dec!(10000));
    assert_eq!(order.taxes[0].total, dec!(110000));
    assert_eq!(order.total_taxes_and_charges, dec!(10000));
    assert_eq!(order.grand_total, dec!(110000));
    assert_eq!(order.rounded_total, dec!(110000));
    assert_eq!(order.payments[0].amount, dec!(110000));
    assert_eq!(order.paid_amount, dec!(110000));
    assert_eq!(order.outstanding_amount, Decimal::ZERO);
}

// ========== Void snapshot ==========

#[test]
fn test_void_snapshot_is_write_once() {
    let mut order = recalculate(fried_rice_order());
    void(&mut order, "r1");
    let mut order = recalculate(order);

    // Tamper with live fields after the void; snapshot must not move
    order.items[0].qty = dec!(9);
    order.items[0].rate = dec!(1);
    let order = recalculate(recalculate(order));

    assert_eq!(order.items[0].void_qty, dec!(2));
    assert_eq!(order.items[0].void_rate, dec!(20000));
    assert_eq!(order.items[0].void_amount, dec!(40000));
    assert_eq!(order.items[0].rate, Decimal::ZERO);
}

#[test]
fn test_void_snapshot_falls_back_to_rate_times_qty() {
    // Voided before any recalculation: amount is still zero
    let mut order = fried_rice_order();
    void(&mut order, "r1");
    let order = recalculate(order);
    assert_eq!(order.items[0].void_amount, dec!(40000));
}

#[test]
fn test_voided_item_discount_fields_are_zeroed() {
    let mut order = fried_rice_order();
    order.items[0].discount_percentage = dec!(10);
    order.items[0].discount_amount = dec!(2000);
    void(&mut order, "r1");
    let order = recalculate(order);
    assert_eq!(order.items[0].discount_percentage, Decimal::ZERO);
    assert_eq!(order.items[0].discount_amount, Decimal::ZERO);
}

#[test]
fn test_recalculation_is_idempotent() {
    let mut order = fried_rice_order();
    order
        .items
        .push(LineItem::new("r2", "ET", "Es Teh", dec!(3), dec!(5000)));
    order.taxes.push(TaxLine::on_net_total("Service", dec!(5)));
    order.taxes.push(TaxLine::on_net_total("PB1", dec!(10)));
    void(&mut order, "r2");

    let once = recalculate(order);
    let twice = recalculate(once.clone());
    assert_eq!(once, twice);
    assert_eq!(twice.net_total, dec!(40000));
}

// ========== Taxes & discounts ==========

#[test]
fn test_tax_running_totals() {
    let mut order = fried_rice_order();
    order.taxes.push(TaxLine::on_net_total("Service Charge", dec!(5)));
    order.taxes.push(TaxLine::on_net_total("PB1", dec!(10)));
    let order = recalculate(order);

    assert_eq!(order.taxes[0].tax_amount, dec!(2000));
    assert_eq!(order.taxes[0].total, dec!(42000));
    assert_eq!(order.taxes[1].tax_amount, dec!(4000));
    assert_eq!(order.taxes[1].total, dec!(46000));
    assert_eq!(order.grand_total, dec!(46000));
}

#[test]
fn test_unsupported_charge_type_yields_zero() {
    let mut order = fried_rice_order();
    let mut fixed = TaxLine::on_net_total("Delivery", dec!(5000));
    fixed.charge_type = ChargeType::Unsupported;
    order.taxes.push(fixed);
    let order = recalculate(order);

    assert_eq!(order.taxes[0].tax_amount, Decimal::ZERO);
    assert_eq!(order.grand_total, dec!(40000));
}

#[test]
fn test_header_percentage_discount() {
    let mut order = fried_rice_order();
    order.additional_discount_percentage = dec!(10);
    order.taxes.push(TaxLine::on_net_total("PB1", dec!(10)));
    let order = recalculate(order);

    assert_eq!(order.discount_amount, dec!(4000));
    assert_eq!(order.applied_discount_amount, dec!(4000));
    assert_eq!(order.grand_total, dec!(40000) + dec!(4000) - dec!(4000));
}

#[test]
fn test_header_discount_is_clamped() {
    let mut order = fried_rice_order();
    order.discount_amount = dec!(99999);
    let order = recalculate(order);
    assert_eq!(order.applied_discount_amount, dec!(40000));
    assert_eq!(order.discount_amount, dec!(99999));
    assert_eq!(order.grand_total, Decimal::ZERO);

    let mut order = fried_rice_order();
    order.discount_amount = dec!(-500);
    let order = recalculate(order);
    assert_eq!(order.applied_discount_amount, Decimal::ZERO);
    assert_eq!(order.grand_total, dec!(40000));
}

#[test]
fn test_header_discount_survives_void_then_append() {
    let mut order = Order::new("POSINV-0009", "IDR");
    order.items.push(LineItem::new("a", "A", "Ayam Bakar", dec!(1), dec!(100000)));
    order.items.push(LineItem::new("b", "B", "Es Jeruk", dec!(1), dec!(30000)));
    order.discount_amount = dec!(50000);
    let mut order = recalculate(order);
    assert_eq!(order.grand_total, dec!(80000));

    // the remaining item cannot absorb the whole discount
    void(&mut order, "a");
    let mut order = recalculate(order);
    assert_eq!(order.applied_discount_amount, dec!(30000));
    assert_eq!(order.grand_total, Decimal::ZERO);
    assert_eq!(order.discount_amount, dec!(50000));

    order.items.push(LineItem::new("c", "C", "Sate Kambing", dec!(1), dec!(100000)));
    let order = recalculate(order);
    assert_eq!(order.applied_discount_amount, dec!(50000));
    assert_eq!(order.grand_total, dec!(80000));
}

#[test]
fn test_no_active_items_zeroes_everything() {
    let mut order = fried_rice_order();
    order.discount_amount = dec!(5000);
    order.taxes.push(TaxLine::on_net_total("PB1", dec!(10)));
    void(&mut order, "r1");
    let mut order = recalculate(order);

    assert_eq!(order.applied_discount_amount, Decimal::ZERO);
    assert_eq!(order.total_taxes_and_charges, Decimal::ZERO);
    assert_eq!(order.grand_total, Decimal::ZERO);
    assert_eq!(order.rounded_total, Decimal::ZERO);

    // a new item brings the requested discount back
    order.items.push(LineItem::new("r2", "ET", "Es Teh", dec!(2), dec!(5000)));
    let order = recalculate(order);
    assert_eq!(order.applied_discount_amount, dec!(5000));
    assert_eq!(order.grand_total, dec!(10000) + dec!(1000) - dec!(5000));
}

// ========== Rounding & currency ==========

#[test]
fn test_idr_rounds_to_whole_rupiah() {
    let mut order = Order::new("POSINV-0004", "IDR");
    order
        .items
        .push(LineItem::new("r1", "KP", "Kopi", dec!(1), dec!(18500)));
    order.taxes.push(TaxLine::on_net_total("PB1", dec!(11)));
    let order = recalculate(order);

    assert_eq!(order.grand_total, dec!(20535));
    assert_eq!(order.rounded_total, dec!(20535));

    let mut order = Order::new("POSINV-0005", "IDR");
    order
        .items
        .push(LineItem::new("r1", "KP", "Kopi", dec!(1), dec!(18555)));
    order.taxes.push(TaxLine::on_net_total("PB1", dec!(10)));
    let order = recalculate(order);
    assert_eq!(order.grand_total, dec!(20410.50));
    assert_eq!(order.rounded_total, dec!(20411));
}

#[test]
fn test_two_decimal_currency() {
    let mut order = Order::new("INV-USD", "USD");
    order
        .items
        .push(LineItem::new("r1", "C", "Coffee", dec!(3), dec!(3.333)));
    let order = recalculate(order);
    assert_eq!(order.items[0].amount, dec!(10.00));
    assert_eq!(order.rounded_total, dec!(10.00));
}

#[test]
fn test_base_mirrors_use_conversion_rate() {
    let mut order = Order::new("INV-USD", "USD");
    order.conversion_rate = dec!(15000);
    order
        .items
        .push(LineItem::new("r1", "C", "Coffee", dec!(2), dec!(2.5)));
    let order = recalculate(order);

    assert_eq!(order.items[0].base_amount, dec!(75000));
    assert_eq!(order.base_total, dec!(75000));
    assert_eq!(order.base_rounded_total, dec!(75000));

    // Unset rate counts as 1
    let mut order = fried_rice_order();
    order.conversion_rate = Decimal::ZERO;
    let order = recalculate(order);
    assert_eq!(order.base_total, dec!(40000));
}

// ========== Payments ==========

#[test]
fn test_multi_payment_prorate_sums_exactly() {
    let mut order = Order::new("INV-USD", "USD");
    order
        .items
        .push(LineItem::new("r1", "M", "Meal", dec!(1), dec!(100)));
    order.is_settlement = true;
    order.payments = vec![
        PaymentLine::new("Cash", dec!(1)),
        PaymentLine::new("Card", dec!(1)),
        PaymentLine::new("QRIS", dec!(1)),
    ];
    let order = recalculate(order);

    let sum: Decimal = order.payments.iter().map(|p| p.amount).sum();
    assert_eq!(sum, dec!(100));
    // 33.33 each, the leftover cent goes to the first line
    assert_eq!(order.payments[0].amount, dec!(33.34));
    assert_eq!(order.payments[1].amount, dec!(33.33));
    assert_eq!(order.payments[2].amount, dec!(33.33));
}

#[test]
fn test_prorate_keeps_ratio() {
    let mut payments = vec![
        PaymentLine::new("Cash", dec!(30000)),
        PaymentLine::new("Card", dec!(10000)),
    ];
    prorate_payments(&mut payments, dec!(50000));
    assert_eq!(payments[0].amount, dec!(37500));
    assert_eq!(payments[1].amount, dec!(12500));
}

#[test]
fn test_prorate_zero_sum_goes_to_first_line() {
    let mut payments = vec![
        PaymentLine::new("Cash", Decimal::ZERO),
        PaymentLine::new("Card", Decimal::ZERO),
    ];
    prorate_payments(&mut payments, dec!(25000));
    assert_eq!(payments[0].amount, dec!(25000));
    assert_eq!(payments[1].amount, Decimal::ZERO);
}

#[test]
fn test_settlement_without_payments_stays_outstanding() {
    let mut order = fried_rice_order();
    order.is_settlement = true;
    let order = recalculate(order);
    assert_eq!(order.paid_amount, Decimal::ZERO);
    assert_eq!(order.outstanding_amount, dec!(40000));
}

#[test]
fn test_settlement_change_from_tendered() {
    let mut order = fried_rice_order();
    order.is_settlement = true;
    order.tendered_amount = Some(dec!(50000));
    order.payments.push(PaymentLine::new("Cash", dec!(50000)));
    let order = recalculate(order);

    assert_eq!(order.payments[0].amount, dec!(40000));
    assert_eq!(order.change_amount, dec!(10000));
}

#[test]
fn test_non_settlement_paid_outstanding_change() {
    let mut order = fried_rice_order();
    order.payments.push(PaymentLine::new("Cash", dec!(30000)));
    let partial = recalculate(order);
    assert_eq!(partial.paid_amount, dec!(30000));
    assert_eq!(partial.outstanding_amount, dec!(10000));
    assert_eq!(partial.change_amount, Decimal::ZERO);

    let mut order = partial;
    order.payments.push(PaymentLine::new("Cash", dec!(20000)));
    let over = recalculate(order);
    assert_eq!(over.outstanding_amount, Decimal::ZERO);
    assert_eq!(over.change_amount, dec!(10000));
}

// ========== Properties ==========

#[test]
fn test_totals_invariants_hold_across_mixed_orders() {
    let rates = [dec!(12500), dec!(7999.99), dec!(18000), dec!(3333.33)];
    for (n, tax_rate) in [dec!(0), dec!(10), dec!(11)].into_iter().enumerate() {
        let mut order = Order::new(format!("INV-{n}"), if n == 1 { "USD" } else { "IDR" });
        for (i, rate) in rates.iter().enumerate() {
            order.items.push(LineItem::new(
                format!("r{i}"),
                format!("I{i}"),
                format!("Item {i}"),
                Decimal::from(i as i64 + 1),
                *rate,
            ));
        }
        order.taxes.push(TaxLine::on_net_total("Tax", tax_rate));
        order.discount_amount = dec!(1000);
        order.is_settlement = true;
        order.payments = vec![
            PaymentLine::new("Cash", dec!(7)),
            PaymentLine::new("Card", dec!(13)),
        ];
        void(&mut order, "r1");

        let order = recalculate(order);
        let active_net: Decimal = order.active_items().map(|i| i.net_amount).sum();
        assert_eq!(active_net, order.net_total);
        assert_eq!(
            order.grand_total,
            order.net_total + order.total_taxes_and_charges - order.applied_discount_amount
        );
        assert!(order.voided_items().all(|i| i.amount.is_zero()));
        assert_eq!(order.outstanding_amount, Decimal::ZERO);
        assert_eq!(sum_payments(&order.payments), order.rounded_total);
        assert!(money_eq(
            order.rounded_total,
            round_currency(order.grand_total, &order.currency)
        ));
    }
}
