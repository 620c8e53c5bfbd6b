//! Order child rows: items, taxes, payments

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kitchen lifecycle of a line item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenStatus {
    /// Not yet printed to any station
    #[default]
    #[serde(alias = "Not Sent")]
    NotSent,
    /// Printed to every routed station
    #[serde(alias = "Sent")]
    Sent,
    /// Cancelled after being ordered; economically invisible
    #[serde(alias = "Void Menu")]
    Voided,
}

/// One ordered quantity of a sellable menu entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LineItem {
    /// Row identifier, unique within the order
    pub row_id: String,
    pub item_code: String,
    pub item_name: String,
    /// Menu reference used for kitchen routing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resto_menu: Option<String>,
    pub qty: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
    /// Unit price, already net of item-level discount
    pub rate: Decimal,
    pub amount: Decimal,
    pub net_amount: Decimal,
    pub base_amount: Decimal,
    pub base_net_amount: Decimal,
    /// Informational: discount already applied to `rate`
    pub discount_percentage: Decimal,
    /// Informational: discount already applied to `rate`
    pub discount_amount: Decimal,
    pub status_kitchen: KitchenStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_notes: Option<String>,
    /// Already printed on a checker ticket
    pub is_checked: bool,
    /// Quantity at void time (write-once)
    pub void_qty: Decimal,
    /// Rate at void time (write-once)
    pub void_rate: Decimal,
    /// Amount at void time (write-once)
    pub void_amount: Decimal,
}

impl LineItem {
    /// Create an un-sent item; amounts are filled in by recalculation
    pub fn new(
        row_id: impl Into<String>,
        item_code: impl Into<String>,
        item_name: impl Into<String>,
        qty: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            item_code: item_code.into(),
            item_name: item_name.into(),
            qty,
            rate,
            ..Default::default()
        }
    }

    /// Attach a menu reference (builder style)
    pub fn with_menu(mut self, menu: impl Into<String>) -> Self {
        self.resto_menu = Some(menu.into());
        self
    }

    pub fn is_voided(&self) -> bool {
        self.status_kitchen == KitchenStatus::Voided
    }

    pub fn is_active(&self) -> bool {
        !self.is_voided()
    }

    /// Whether any void snapshot field has been captured
    pub fn has_void_snapshot(&self) -> bool {
        !self.void_qty.is_zero() || !self.void_rate.is_zero() || !self.void_amount.is_zero()
    }

    /// Name for printing: item name, falling back to item code
    pub fn display_name(&self) -> &str {
        let name = self.item_name.trim();
        if name.is_empty() {
            self.item_code.trim()
        } else {
            name
        }
    }

    /// Menu reference, if non-blank
    pub fn menu_ref(&self) -> Option<&str> {
        self.resto_menu
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// How a tax row derives its amount
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeType {
    /// `rate` percent of the net total
    #[default]
    #[serde(alias = "On Net Total")]
    OnNetTotal,
    /// Any charge type this workspace does not compute; yields zero tax
    #[serde(other)]
    Unsupported,
}

/// Tax / charge row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TaxLine {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_head: Option<String>,
    pub charge_type: ChargeType,
    /// Percentage
    pub rate: Decimal,
    /// Derived, never edited directly
    pub tax_amount: Decimal,
    /// Running total: net total plus taxes up to and including this row
    pub total: Decimal,
}

impl TaxLine {
    /// Percentage-of-net-total tax row
    pub fn on_net_total(description: impl Into<String>, rate: Decimal) -> Self {
        Self {
            description: description.into(),
            charge_type: ChargeType::OnNetTotal,
            rate,
            ..Default::default()
        }
    }
}

/// Payment row (one instrument)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PaymentLine {
    pub mode_of_payment: String,
    pub amount: Decimal,
}

impl PaymentLine {
    pub fn new(mode_of_payment: impl Into<String>, amount: Decimal) -> Self {
        Self {
            mode_of_payment: mode_of_payment.into(),
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kitchen_status_aliases() {
        let s: KitchenStatus = serde_json::from_str("\"Void Menu\"").unwrap();
        assert_eq!(s, KitchenStatus::Voided);
        let s: KitchenStatus = serde_json::from_str("\"SENT\"").unwrap();
        assert_eq!(s, KitchenStatus::Sent);
    }

    #[test]
    fn test_unknown_charge_type_is_unsupported() {
        let t: TaxLine =
            serde_json::from_str(r#"{"description":"Fixed","charge_type":"Actual","rate":5}"#)
                .unwrap();
        assert_eq!(t.charge_type, ChargeType::Unsupported);
        assert_eq!(t.rate, dec!(5));
    }

    #[test]
    fn test_display_name_falls_back_to_code() {
        let mut item = LineItem::new("r1", "NGS-01", "", dec!(1), dec!(10));
        assert_eq!(item.display_name(), "NGS-01");
        item.item_name = "Nasi Goreng".to_string();
        assert_eq!(item.display_name(), "Nasi Goreng");
    }

    #[test]
    fn test_menu_ref_ignores_blank() {
        let item = LineItem::new("r1", "A", "A", dec!(1), dec!(1)).with_menu("  ");
        assert_eq!(item.menu_ref(), None);
    }
}
