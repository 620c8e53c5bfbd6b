//! Invoice snapshot collector
//!
//! Flattens a recalculated [`Order`] into plain values so the assemblers
//! never reach back into the document.

use rust_decimal::Decimal;
use shared::order::Order;

/// Printed timestamp format
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One printable item row
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotItem {
    pub row_id: String,
    pub name: String,
    pub menu: Option<String>,
    pub qty: Decimal,
    pub uom: Option<String>,
    pub rate: Decimal,
    pub amount: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub add_ons: Option<String>,
    pub notes: Option<String>,
    pub voided: bool,
    pub void_qty: Decimal,
    pub checked: bool,
}

impl SnapshotItem {
    pub fn has_discount(&self) -> bool {
        !self.discount_percentage.is_zero() || !self.discount_amount.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotTax {
    pub description: String,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPayment {
    pub mode: String,
    pub amount: Decimal,
}

/// Everything a printed document needs from an order
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSnapshot {
    pub name: String,
    pub company: String,
    pub branch: Option<String>,
    pub order_type: &'static str,
    /// Take-away queue number
    pub queue_number: Option<u32>,
    pub customer: Option<String>,
    pub table: Option<String>,
    pub pax: Option<u32>,
    pub currency: String,
    pub posted_at: String,
    pub remarks: Option<String>,

    pub items: Vec<SnapshotItem>,
    pub taxes: Vec<SnapshotTax>,
    pub payments: Vec<SnapshotPayment>,

    pub total: Decimal,
    pub net_total: Decimal,
    pub discount_amount: Decimal,
    pub total_taxes: Decimal,
    pub grand_total: Decimal,
    pub rounded_total: Decimal,
    pub paid_amount: Decimal,
    pub change_amount: Decimal,
    pub outstanding_amount: Decimal,
    pub loyalty_points: Option<i64>,
    pub loyalty_amount: Decimal,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl InvoiceSnapshot {
    /// Collect from an order; `default_currency` fills a blank currency
    pub fn collect(order: &Order, default_currency: &str) -> Self {
        let currency = match order.currency.trim() {
            "" => default_currency.to_string(),
            c => c.to_string(),
        };

        let customer = non_blank(order.customer_name.as_deref())
            .or_else(|| non_blank(Some(order.customer.as_str())));

        let items = order
            .items
            .iter()
            .map(|i| SnapshotItem {
                row_id: i.row_id.clone(),
                name: i.display_name().to_string(),
                menu: i.menu_ref().map(str::to_string),
                qty: i.qty,
                uom: non_blank(i.uom.as_deref()),
                rate: i.rate,
                amount: i.amount,
                discount_percentage: i.discount_percentage,
                discount_amount: i.discount_amount,
                add_ons: non_blank(i.add_ons.as_deref()),
                notes: non_blank(i.quick_notes.as_deref()),
                voided: i.is_voided(),
                void_qty: i.void_qty,
                checked: i.is_checked,
            })
            .collect();

        let taxes = order
            .taxes
            .iter()
            .map(|t| SnapshotTax {
                description: t.description.trim().to_string(),
                rate: t.rate,
                amount: t.tax_amount,
            })
            .collect();

        let payments = order
            .payments
            .iter()
            .filter(|p| !p.amount.is_zero())
            .map(|p| SnapshotPayment {
                mode: p.mode_of_payment.trim().to_string(),
                amount: p.amount,
            })
            .collect();

        Self {
            name: order.name.clone(),
            company: order.company.trim().to_string(),
            branch: order.branch_ref().map(str::to_string),
            order_type: order.order_type.label(),
            queue_number: order.takeaway_queue(),
            customer,
            table: non_blank(order.table.as_deref()),
            pax: order.pax.filter(|p| *p > 0),
            currency,
            posted_at: order.posted_at().format(TIMESTAMP_FORMAT).to_string(),
            remarks: non_blank(order.remarks.as_deref()),
            items,
            taxes,
            payments,
            total: order.total,
            net_total: order.net_total,
            discount_amount: order.applied_discount_amount,
            total_taxes: order.total_taxes_and_charges,
            grand_total: order.grand_total,
            rounded_total: order.rounded_total,
            paid_amount: order.paid_amount,
            change_amount: order.change_amount,
            outstanding_amount: order.outstanding_amount,
            loyalty_points: order.loyalty_points.filter(|p| *p != 0),
            loyalty_amount: order.loyalty_amount,
        }
    }

    /// Items that appear on the bill
    pub fn active_items(&self) -> impl Iterator<Item = &SnapshotItem> {
        self.items.iter().filter(|i| !i.voided)
    }

    pub fn has_voided_items(&self) -> bool {
        self.items.iter().any(|i| i.voided)
    }

    /// Sum of active quantities
    pub fn item_count(&self) -> Decimal {
        self.active_items().map(|i| i.qty).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_money::recalculate;
    use rust_decimal_macros::dec;
    use shared::order::{KitchenStatus, LineItem, OrderType, PaymentLine};

    fn order() -> Order {
        let mut order = Order::new("POSINV-0001", "");
        order.company = "Resto Nusantara".to_string();
        order.branch = Some("  ".to_string());
        order.customer = "CUST-001".to_string();
        order.order_type = OrderType::TakeAway;
        order.queue_number = Some(7);
        order.items.push(
            LineItem::new("r1", "NG", "Nasi Goreng", dec!(2), dec!(20000)).with_menu("NG-MENU"),
        );
        let mut voided = LineItem::new("r2", "ET", "Es Teh", dec!(1), dec!(5000));
        voided.status_kitchen = KitchenStatus::Voided;
        order.items.push(voided);
        order.payments.push(PaymentLine::new("Cash", dec!(0)));
        recalculate(order)
    }

    #[test]
    fn test_collect_flattens_order() {
        let snap = InvoiceSnapshot::collect(&order(), "IDR");
        assert_eq!(snap.currency, "IDR");
        assert_eq!(snap.branch, None);
        assert_eq!(snap.customer.as_deref(), Some("CUST-001"));
        assert_eq!(snap.order_type, "Take Away");
        assert_eq!(snap.queue_number, Some(7));
        assert_eq!(snap.items.len(), 2);
        assert_eq!(snap.active_items().count(), 1);
        assert_eq!(snap.item_count(), dec!(2));
        assert!(snap.items[1].voided);
        assert_eq!(snap.items[1].void_qty, dec!(1));
        assert_eq!(snap.items[0].menu.as_deref(), Some("NG-MENU"));
        // zero-amount payment rows are not printed
        assert!(snap.payments.is_empty());
        assert_eq!(snap.rounded_total, dec!(40000));
    }

    #[test]
    fn test_customer_name_preferred() {
        let mut order = order();
        order.customer_name = Some("Budi".to_string());
        let snap = InvoiceSnapshot::collect(&order, "IDR");
        assert_eq!(snap.customer.as_deref(), Some("Budi"));
    }
}
