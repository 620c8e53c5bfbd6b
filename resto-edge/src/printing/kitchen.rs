//! Kitchen ticket renderer
//!
//! One ticket per station. Item titles are printed enlarged so they can
//! be read from across the pass.

use resto_printer::layout::{fit, format_qty};
use resto_printer::{EscPosBuilder, Font};

use super::routing::StationGroup;
use super::snapshot::InvoiceSnapshot;
use super::types::{KitchenTicket, KitchenTicketItem, RenderConfig, Staff};

/// Width taken by the "  Menu : " style prefixes
const SUB_LINE_INDENT: usize = 9;

impl KitchenTicket {
    /// Ticket for one routed station group of an order
    pub fn for_group(
        snap: &InvoiceSnapshot,
        group: &StationGroup,
        staff: Option<&Staff>,
        title_prefix: &str,
    ) -> Self {
        let items = group
            .items
            .iter()
            .map(|routed| KitchenTicketItem {
                row_id: Some(routed.item.row_id.clone()),
                short_name: Some(routed.ticket_name.clone()),
                menu_name: routed.menu_name.clone(),
                qty: routed.item.qty,
                add_ons: routed.item.add_ons.clone().filter(|s| !s.trim().is_empty()),
                notes: routed
                    .item
                    .quick_notes
                    .clone()
                    .filter(|s| !s.trim().is_empty()),
            })
            .collect();

        Self {
            title_prefix: title_prefix.to_string(),
            station: group.station.clone(),
            printer_name: group.printer_name.clone(),
            order_ref: snap.name.clone(),
            posted_at: snap.posted_at.clone(),
            table: snap.table.clone(),
            order_type: Some(snap.order_type.to_string()),
            queue_number: snap.queue_number,
            staff: staff
                .map(|s| s.name.trim().to_string())
                .filter(|s| !s.is_empty()),
            items,
        }
    }
}

/// Renders kitchen tickets
pub struct KitchenRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> KitchenRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Render a kitchen ticket to ESC/POS bytes
    pub fn render(&self, ticket: &KitchenTicket, reprint: bool) -> Vec<u8> {
        let mut b = self.config.builder();
        b.font(Font::A).left();

        self.render_header(&mut b, ticket, reprint);
        for item in &ticket.items {
            self.render_item(&mut b, item);
        }

        b.sep_single();
        b.feed(self.config.tail_feed());
        b.cut();
        b.build()
    }

    fn render_header(&self, b: &mut EscPosBuilder, ticket: &KitchenTicket, reprint: bool) {
        let width = b.width();
        let title = if ticket.station.is_empty() {
            ticket.title_prefix.clone()
        } else {
            format!("{} - {}", ticket.title_prefix, ticket.station)
        };

        b.center().bold();
        b.line(&fit(&title, width));
        if reprint {
            b.line("** REPRINT **");
        }
        b.bold_off().left();
        b.sep_double();

        b.line(&fit(&format!("Invoice : {}", ticket.order_ref), width));
        b.line(&fit(&format!("Tanggal : {}", ticket.posted_at), width));
        if let Some(table) = &ticket.table {
            b.line(&fit(&format!("Meja    : {table}"), width));
        }
        if let Some(order_type) = &ticket.order_type {
            b.line(&fit(&format!("Tipe    : {order_type}"), width));
        }
        if let Some(queue) = ticket.queue_number {
            b.line(&format!("Antrian : {queue}"));
        }
        if let Some(staff) = &ticket.staff {
            b.line(&fit(&format!("Staff   : {staff}"), width));
        }
        b.sep_single();
    }

    fn render_item(&self, b: &mut EscPosBuilder, item: &KitchenTicketItem) {
        let width = b.width();
        let sub_width = width.saturating_sub(SUB_LINE_INDENT);
        let title = format!("{} x {}", format_qty(item.qty), item.title());

        b.char_size(0, self.config.item_height_mult).bold();
        b.line(&fit(&title, width));
        b.bold_off().reset_size();

        if !item.menu_name.is_empty() && item.menu_name != item.title() {
            b.line(&format!("  Menu : {}", fit(&item.menu_name, sub_width)));
        }
        if let Some(add_ons) = &item.add_ons {
            b.line(&format!("  Add  : {}", fit(add_ons, sub_width)));
        }
        if let Some(notes) = &item.notes {
            b.line(&format!("  Note : {}", fit(notes, sub_width)));
        }
        b.newline();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::types::KITCHEN_TITLE;
    use resto_printer::{Codepage, strip_commands};
    use rust_decimal_macros::dec;

    fn ticket() -> KitchenTicket {
        KitchenTicket {
            title_prefix: KITCHEN_TITLE.to_string(),
            station: "Hot Kitchen".to_string(),
            printer_name: "HOT".to_string(),
            order_ref: "POSINV-0001".to_string(),
            posted_at: "2025-10-10 15:23:00".to_string(),
            table: Some("T-05".to_string()),
            order_type: Some("Dine In".to_string()),
            queue_number: None,
            staff: Some("Andi".to_string()),
            items: vec![
                KitchenTicketItem {
                    row_id: Some("r1".to_string()),
                    short_name: Some("NG SPC".to_string()),
                    menu_name: "Nasi Goreng Spesial".to_string(),
                    qty: dec!(2),
                    add_ons: Some("Telur Ceplok".to_string()),
                    notes: Some("Tidak pedas".to_string()),
                },
                KitchenTicketItem {
                    row_id: Some("r2".to_string()),
                    short_name: None,
                    menu_name: "Mie Goreng".to_string(),
                    qty: dec!(1),
                    add_ons: None,
                    notes: None,
                },
            ],
        }
    }

    #[test]
    fn test_kitchen_ticket_layout() {
        let config = RenderConfig::default();
        let bytes = KitchenRenderer::new(&config).render(&ticket(), false);
        let text = strip_commands(&bytes, Codepage::Ascii);

        assert!(text.contains("KITCHEN ORDER - Hot Kitchen"));
        assert!(text.contains("Invoice : POSINV-0001"));
        assert!(text.contains("Staff   : Andi"));
        assert!(text.contains("2 x NG SPC"));
        assert!(text.contains("  Menu : Nasi Goreng Spesial"));
        assert!(text.contains("  Add  : Telur Ceplok"));
        assert!(text.contains("  Note : Tidak pedas"));
        assert!(text.contains("1 x Mie Goreng"));
        // no redundant menu line when the title already is the menu name
        assert_eq!(text.matches("Menu :").count(), 1);
        assert!(!text.contains("REPRINT"));
    }

    #[test]
    fn test_item_titles_enlarged() {
        let config = RenderConfig {
            item_height_mult: 1,
            ..Default::default()
        };
        let bytes = KitchenRenderer::new(&config).render(&ticket(), false);
        // GS ! 0x01 (double height) once per item
        let enlarged = bytes.windows(3).filter(|w| *w == [0x1D, 0x21, 0x01]).count();
        assert_eq!(enlarged, 2);
    }

    #[test]
    fn test_reprint_marker_and_long_names() {
        let mut ticket = ticket();
        ticket.items[1].menu_name = "Mie Goreng Seafood Jumbo Extra Pedas Level 5".to_string();
        let config = RenderConfig::default();
        let bytes = KitchenRenderer::new(&config).render(&ticket, true);
        let text = strip_commands(&bytes, Codepage::Ascii);

        assert!(text.contains("** REPRINT **"));
        assert!(text.lines().all(|l| l.chars().count() <= 32));
    }
}
