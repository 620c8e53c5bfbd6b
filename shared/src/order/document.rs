//! Order aggregate (POS invoice)

use super::types::{LineItem, PaymentLine, TaxLine};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dining purpose
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    #[serde(alias = "Dine In")]
    DineIn,
    #[serde(alias = "Take Away")]
    TakeAway,
}

impl OrderType {
    /// Label printed on documents
    pub fn label(&self) -> &'static str {
        match self {
            OrderType::DineIn => "Dine In",
            OrderType::TakeAway => "Take Away",
        }
    }
}

/// Order document
///
/// Totals are derived fields; they are only meaningful after the
/// recalculation engine has run on the current items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Order {
    /// Invoice number
    pub name: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_number: Option<u32>,
    pub customer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pax: Option<u32>,
    pub currency: String,
    /// Transaction → company currency rate (0 is treated as 1)
    pub conversion_rate: Decimal,
    pub posting_date: NaiveDate,
    pub posting_time: NaiveTime,
    /// Settlement orders must be fully paid after recalculation
    pub is_settlement: bool,
    /// Header discount percentage (recomputes `discount_amount` when set)
    pub additional_discount_percentage: Decimal,
    /// Requested header discount; recalculation never clamps it
    pub discount_amount: Decimal,
    /// Cash handed over by the customer, for change calculation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loyalty_points: Option<i64>,
    pub loyalty_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    pub items: Vec<LineItem>,
    pub taxes: Vec<TaxLine>,
    pub payments: Vec<PaymentLine>,

    // === Derived totals ===
    pub total: Decimal,
    pub net_total: Decimal,
    pub total_taxes_and_charges: Decimal,
    /// Header discount actually taken off, within `[0, net + taxes]`
    pub applied_discount_amount: Decimal,
    pub grand_total: Decimal,
    pub rounded_total: Decimal,
    pub paid_amount: Decimal,
    pub outstanding_amount: Decimal,
    pub change_amount: Decimal,

    // === Company-currency mirrors ===
    pub base_total: Decimal,
    pub base_net_total: Decimal,
    pub base_grand_total: Decimal,
    pub base_rounded_total: Decimal,
}

impl Order {
    /// Create an empty order
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            name: name.into(),
            currency: currency.into(),
            conversion_rate: Decimal::ONE,
            posting_date: now.date(),
            posting_time: now.time(),
            ..Default::default()
        }
    }

    /// Items that still count economically
    pub fn active_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|i| i.is_active())
    }

    /// Items cancelled after ordering
    pub fn voided_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|i| i.is_voided())
    }

    pub fn has_voided_items(&self) -> bool {
        self.items.iter().any(|i| i.is_voided())
    }

    /// Total quantity of active items
    pub fn active_quantity(&self) -> Decimal {
        self.active_items().map(|i| i.qty).sum()
    }

    pub fn item(&self, row_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.row_id == row_id)
    }

    pub fn item_mut(&mut self, row_id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.row_id == row_id)
    }

    /// Posting date and time combined
    pub fn posted_at(&self) -> NaiveDateTime {
        self.posting_date.and_time(self.posting_time)
    }

    /// Effective conversion rate (unset counts as 1)
    pub fn effective_conversion_rate(&self) -> Decimal {
        if self.conversion_rate > Decimal::ZERO {
            self.conversion_rate
        } else {
            Decimal::ONE
        }
    }

    /// Branch, if non-blank
    pub fn branch_ref(&self) -> Option<&str> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// Take-away order carrying a queue number
    pub fn takeaway_queue(&self) -> Option<u32> {
        match self.order_type {
            OrderType::TakeAway => self.queue_number,
            OrderType::DineIn => None,
        }
    }
}
