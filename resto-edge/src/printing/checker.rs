//! Checker ticket renderer
//!
//! Delta-only audit ticket: an item is printed on a checker ticket once.
//! The caller flips `is_checked` after a successful dispatch.

use resto_printer::layout::{fit, format_qty, wrap};
use resto_printer::{EscPosBuilder, Font};

use super::snapshot::{InvoiceSnapshot, SnapshotItem};
use super::types::{RenderConfig, Staff};

/// Items not yet printed on a checker ticket
pub fn unchecked_items(snap: &InvoiceSnapshot) -> Vec<&SnapshotItem> {
    snap.items.iter().filter(|i| !i.checked).collect()
}

/// Renders checker tickets
pub struct CheckerRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> CheckerRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Render the un-checked items of `snap`
    ///
    /// Returns an empty buffer when every item has been checked already.
    pub fn render(&self, snap: &InvoiceSnapshot, staff: Option<&Staff>) -> Vec<u8> {
        let items = unchecked_items(snap);
        if items.is_empty() {
            return Vec::new();
        }

        let mut b = self.config.builder();
        b.font(Font::A).left();
        self.render_header(&mut b, snap, staff);

        for item in items {
            self.render_item(&mut b, item);
        }

        b.sep_single();
        b.feed(self.config.tail_feed());
        b.cut();
        b.build()
    }

    fn render_header(&self, b: &mut EscPosBuilder, snap: &InvoiceSnapshot, staff: Option<&Staff>) {
        let width = b.width();
        b.center().bold();
        b.line("CHECKER");
        b.bold_off().left();
        b.sep_double();

        b.line(&fit(&format!("Invoice : {}", snap.name), width));
        b.line(&fit(&format!("Tanggal : {}", snap.posted_at), width));
        if let Some(table) = &snap.table {
            b.line(&fit(&format!("Meja    : {table}"), width));
        }
        b.line(&fit(&format!("Tipe    : {}", snap.order_type), width));
        if let Some(queue) = snap.queue_number {
            b.line(&format!("Antrian : {queue}"));
        }
        if let Some(staff) = staff.filter(|s| !s.name.trim().is_empty()) {
            b.line(&fit(&format!("Staff   : {}", staff.name.trim()), width));
        }
        b.sep_single();
    }

    fn render_item(&self, b: &mut EscPosBuilder, item: &SnapshotItem) {
        let width = b.width();
        if item.voided {
            b.bold();
            b.line(&fit(
                &format!("VOID {} x {}", format_qty(item.void_qty), item.name),
                width,
            ));
            b.bold_off();
            return;
        }

        let mut lines = wrap(&format!("{} x {}", format_qty(item.qty), item.name), width).into_iter();
        if let Some(first) = lines.next() {
            b.bold();
            b.line(&first);
            b.bold_off();
        }
        for rest in lines {
            b.line(&rest);
        }
        if let Some(add_ons) = &item.add_ons {
            b.line(&fit(&format!("  + {add_ons}"), width));
        }
        if let Some(notes) = &item.notes {
            b.line(&fit(&format!("  * {notes}"), width));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_money::recalculate;
    use resto_printer::{Codepage, strip_commands};
    use rust_decimal_macros::dec;
    use shared::order::{KitchenStatus, LineItem, Order};

    fn snapshot(order: &Order) -> InvoiceSnapshot {
        InvoiceSnapshot::collect(order, "IDR")
    }

    fn order() -> Order {
        let mut order = Order::new("POSINV-0003", "IDR");
        let mut checked = LineItem::new("r1", "NG", "Nasi Goreng", dec!(1), dec!(20000));
        checked.is_checked = true;
        order.items.push(checked);
        order
            .items
            .push(LineItem::new("r2", "MG", "Mie Goreng", dec!(2), dec!(18000)));
        let mut voided = LineItem::new("r3", "ET", "Es Teh", dec!(3), dec!(5000));
        voided.status_kitchen = KitchenStatus::Voided;
        order.items.push(voided);
        recalculate(order)
    }

    #[test]
    fn test_only_unchecked_items_printed() {
        let config = RenderConfig::default();
        let order = order();
        let bytes = CheckerRenderer::new(&config).render(&snapshot(&order), Some(&Staff::new("Rina")));
        let text = strip_commands(&bytes, Codepage::Ascii);

        assert!(text.contains("CHECKER"));
        assert!(text.contains("2 x Mie Goreng"));
        assert!(text.contains("VOID 3 x Es Teh"));
        assert!(text.contains("Staff   : Rina"));
        assert!(!text.contains("Nasi Goreng"));
    }

    #[test]
    fn test_all_checked_yields_empty() {
        let config = RenderConfig::default();
        let mut order = order();
        for item in &mut order.items {
            item.is_checked = true;
        }
        let bytes = CheckerRenderer::new(&config).render(&snapshot(&order), None);
        assert!(bytes.is_empty());
    }
}
