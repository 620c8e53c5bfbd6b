//! Customer bill renderer

use resto_printer::layout::{fit, format_currency, format_number, format_qty, wrap};
use resto_printer::{EscPosBuilder, Font};
use rust_decimal::Decimal;

use super::snapshot::{InvoiceSnapshot, SnapshotItem, SnapshotTax};
use super::types::{BillOptions, RenderConfig};

/// Rounding line threshold
const ROUNDING_VISIBLE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Renders the customer bill
pub struct BillRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> BillRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Render a bill to ESC/POS bytes
    pub fn render(&self, snap: &InvoiceSnapshot, options: &BillOptions) -> Vec<u8> {
        let mut b = self.config.builder();
        b.font(Font::A).left();

        self.render_header(&mut b, snap);
        self.render_queue(&mut b, snap);
        self.render_metadata(&mut b, snap, options);

        b.sep_single();
        // Item discounts stop counting once anything is voided
        let show_discounts = !snap.has_voided_items();
        for item in snap.active_items() {
            self.render_item(&mut b, item, &snap.currency, show_discounts);
        }
        b.sep_single();
        b.line_lr("Total Item", &format_qty(snap.item_count()));

        self.render_totals(&mut b, snap);
        if !options.hide_payments {
            self.render_payments(&mut b, snap);
        }
        self.render_loyalty(&mut b, snap);
        self.render_footer(&mut b, snap, options);

        b.feed(self.config.tail_feed());
        b.cut();
        b.build()
    }

    fn render_header(&self, b: &mut EscPosBuilder, snap: &InvoiceSnapshot) {
        let width = b.width();
        b.center();

        if let Some(logo) = &self.config.logo {
            b.raster(logo);
            b.newline();
        }

        if !snap.company.is_empty() {
            b.bold();
            for line in wrap(&snap.company, width) {
                b.line(&line);
            }
            b.bold_off();
        }
        if let Some(branch) = &snap.branch {
            for line in wrap(branch, width) {
                b.line(&line);
            }
        }

        b.left();
        b.sep_double();
    }

    /// Enlarged queue number for take-away pickup
    fn render_queue(&self, b: &mut EscPosBuilder, snap: &InvoiceSnapshot) {
        let Some(queue) = snap.queue_number else {
            return;
        };
        b.center();
        b.line("NOMOR ANTRIAN");
        b.char_size(2, 2).bold();
        b.line(&queue.to_string());
        b.bold_off().reset_size();
        b.left();
        b.sep_double();
    }

    fn render_metadata(&self, b: &mut EscPosBuilder, snap: &InvoiceSnapshot, options: &BillOptions) {
        b.line_lr("Invoice", &snap.name);
        b.line_lr("Tanggal", &snap.posted_at);
        if let Some(table) = &snap.table {
            b.line_lr("Meja", table);
        }
        if let Some(pax) = snap.pax {
            b.line_lr("Pax", &pax.to_string());
        }
        b.line_lr("Tipe", snap.order_type);
        if let Some(cashier) = options.cashier.as_ref().filter(|c| !c.name.trim().is_empty()) {
            b.line_lr("Kasir", cashier.name.trim());
        }
        if let Some(customer) = &snap.customer {
            b.line_lr("Customer", customer);
        }
    }

    fn render_item(
        &self,
        b: &mut EscPosBuilder,
        item: &SnapshotItem,
        currency: &str,
        show_discount: bool,
    ) {
        let width = b.width();
        for line in wrap(&item.name, width) {
            b.line(&line);
        }

        let qty = match &item.uom {
            Some(uom) => format!("{} {}", format_qty(item.qty), uom),
            None => format_qty(item.qty),
        };
        b.line_lr(
            &format!("  {} x {}", qty, format_number(item.rate)),
            &format_number(item.amount),
        );

        if let Some(add_ons) = &item.add_ons {
            for line in wrap(add_ons, width.saturating_sub(4)) {
                b.line(&format!("  + {line}"));
            }
        }
        if let Some(notes) = &item.notes {
            for line in wrap(notes, width.saturating_sub(4)) {
                b.line(&format!("  * {line}"));
            }
        }
        if show_discount && item.has_discount() {
            let label = if item.discount_percentage.is_zero() {
                "  Diskon".to_string()
            } else {
                format!("  Diskon {}%", format_qty(item.discount_percentage))
            };
            if item.discount_amount.is_zero() {
                b.line(&fit(&label, width));
            } else {
                b.line_lr(&label, &format!("-{}", format_currency(item.discount_amount, currency)));
            }
        }
    }

    fn render_totals(&self, b: &mut EscPosBuilder, snap: &InvoiceSnapshot) {
        let cur = snap.currency.as_str();
        b.line_lr("Subtotal", &format_currency(snap.total, cur));

        if !snap.discount_amount.is_zero() {
            b.line_lr("Diskon", &format_currency(-snap.discount_amount, cur));
        }
        for tax in &snap.taxes {
            b.line_lr(&tax_label(tax), &format_currency(tax.amount, cur));
        }

        b.sep_single();
        b.bold();
        b.line_lr("Grand Total", &format_currency(snap.grand_total, cur));
        b.bold_off();
        if (snap.rounded_total - snap.grand_total).abs() >= ROUNDING_VISIBLE {
            b.bold();
            b.line_lr("Rounded", &format_currency(snap.rounded_total, cur));
            b.bold_off();
        }
    }

    fn render_payments(&self, b: &mut EscPosBuilder, snap: &InvoiceSnapshot) {
        if snap.payments.is_empty() {
            return;
        }
        let cur = snap.currency.as_str();
        b.sep_single();
        for payment in &snap.payments {
            let mode = if payment.mode.is_empty() { "Payment" } else { payment.mode.as_str() };
            b.line_lr(mode, &format_currency(payment.amount, cur));
        }
        b.line_lr("Jumlah Bayar", &format_currency(snap.paid_amount, cur));
        b.line_lr("Kembalian", &format_currency(snap.change_amount, cur));
    }

    fn render_loyalty(&self, b: &mut EscPosBuilder, snap: &InvoiceSnapshot) {
        if snap.loyalty_points.is_none() && snap.loyalty_amount.is_zero() {
            return;
        }
        b.sep_single();
        if let Some(points) = snap.loyalty_points {
            b.line_lr("Loyalty Pts", &points.to_string());
        }
        if !snap.loyalty_amount.is_zero() {
            b.line_lr("Loyalty Amt", &format_currency(snap.loyalty_amount, &snap.currency));
        }
    }

    fn render_footer(&self, b: &mut EscPosBuilder, snap: &InvoiceSnapshot, options: &BillOptions) {
        let width = b.width();
        b.sep_single();

        if let Some(remarks) = &snap.remarks {
            for line in wrap(remarks, width) {
                b.line(&line);
            }
            b.newline();
        }

        b.center();
        if !self.config.footer.trim().is_empty() {
            for line in wrap(&self.config.footer, width) {
                b.line(&line);
            }
        }
        if let Some(data) = options.qr_data.as_deref().filter(|d| !d.trim().is_empty()) {
            b.newline();
            b.qr(data);
            b.newline();
        }
        b.left();
    }
}

/// Short tax label with the rate appended ("Sc 5%", "Tax 11%")
fn tax_label(tax: &SnapshotTax) -> String {
    let lower = tax.description.to_lowercase();
    let base = if lower.contains("service") || lower.starts_with("sc") {
        "Sc"
    } else if ["vat", "ppn", "pb1", "tax", "pajak"]
        .iter()
        .any(|k| lower.contains(k))
    {
        "Tax"
    } else if tax.description.is_empty() {
        "Tax"
    } else {
        tax.description.as_str()
    };

    if tax.rate.is_zero() {
        base.to_string()
    } else {
        format!("{} {}%", base, format_qty(tax.rate))
    }
}
