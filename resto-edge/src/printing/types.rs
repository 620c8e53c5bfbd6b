//! Printing types

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use resto_printer::{Codepage, EscPosBuilder, Raster};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Layout settings shared by all document assemblers
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Characters per line (32 or 42)
    pub line_width: usize,
    /// Height multiplier of kitchen item titles (0-7)
    pub item_height_mult: u8,
    /// Lines fed before the cut (4-8)
    pub feed_lines: u32,
    pub footer: String,
    /// Currency used when an order carries none
    pub default_currency: String,
    pub codepage: Codepage,
    pub logo: Option<Arc<Raster>>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            line_width: 32,
            item_height_mult: 1,
            feed_lines: 5,
            footer: "Terima kasih!".to_string(),
            default_currency: "IDR".to_string(),
            codepage: Codepage::Ascii,
            logo: None,
        }
    }
}

impl RenderConfig {
    pub fn with_logo(mut self, logo: Raster) -> Self {
        self.logo = Some(Arc::new(logo));
        self
    }

    /// A fresh builder for this paper and code page
    pub fn builder(&self) -> EscPosBuilder {
        EscPosBuilder::with_codepage(self.line_width, self.codepage)
    }

    /// Feed before cut, clamped so the cutter never trims the last line
    pub fn tail_feed(&self) -> u32 {
        self.feed_lines.clamp(4, 8)
    }
}

/// Staff member printed on tickets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub name: String,
}

impl Staff {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Bill print options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillOptions {
    /// Payload of a QR block printed under the footer
    pub qr_data: Option<String>,
    /// Hide the payment breakdown (pre-payment bills)
    pub hide_payments: bool,
    /// Cashier printed in the header
    pub cashier: Option<Staff>,
}

/// Document class, for previews
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Bill,
    Kitchen,
    Checker,
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bill" | "receipt" => Ok(Self::Bill),
            "kitchen" => Ok(Self::Kitchen),
            "checker" => Ok(Self::Checker),
            other => Err(format!("unknown document kind: {other}")),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bill => f.write_str("bill"),
            Self::Kitchen => f.write_str("kitchen"),
            Self::Checker => f.write_str("checker"),
        }
    }
}

/// One item line on a kitchen ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenTicketItem {
    /// Source order row, absent for payload tickets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,
    /// Short name printed large; falls back to `menu_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub menu_name: String,
    pub qty: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl KitchenTicketItem {
    /// Title printed in the enlarged line
    pub fn title(&self) -> &str {
        self.short_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(Some(self.menu_name.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or("-")
    }
}

/// Per-station kitchen ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenTicket {
    /// Heading before the station name ("KITCHEN ORDER")
    pub title_prefix: String,
    pub station: String,
    pub printer_name: String,
    /// Parent order (invoice number)
    pub order_ref: String,
    /// Printed timestamp
    pub posted_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<String>,
    pub items: Vec<KitchenTicketItem>,
}

/// Default kitchen ticket heading
pub const KITCHEN_TITLE: &str = "KITCHEN ORDER";

/// Kitchen ticket as kept in the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedTicket {
    pub id: String,
    pub order_id: String,
    pub created_at: i64,
    pub ticket: KitchenTicket,
    pub print_count: u32,
}

/// A dispatched document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReceipt {
    pub printer: String,
    pub job_id: String,
    pub label: String,
}

/// Result of one station in a kitchen fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationOutcome {
    pub station: String,
    pub printer: String,
    pub item_count: usize,
    pub job_id: Option<String>,
    /// Audit log id of the generated ticket
    pub ticket_id: Option<String>,
    pub error: Option<String>,
}

impl StationOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Bill plus kitchen fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintReport {
    pub bill: JobReceipt,
    pub kitchen: Vec<StationOutcome>,
}

impl PrintReport {
    pub fn failed_stations(&self) -> impl Iterator<Item = &StationOutcome> {
        self.kitchen.iter().filter(|s| !s.is_ok())
    }

    pub fn job_count(&self) -> usize {
        1 + self.kitchen.iter().filter(|s| s.job_id.is_some()).count()
    }
}

/// Caller-supplied kitchen ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KitchenPayloadEntry {
    pub kitchen_station: String,
    /// Defaults to the station name
    pub printer_name: Option<String>,
    pub pos_invoice: String,
    /// Defaults to now
    pub transaction_date: Option<String>,
    pub items: Vec<KitchenPayloadItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KitchenPayloadItem {
    pub resto_menu: String,
    pub short_name: Option<String>,
    pub qty: Decimal,
    pub quick_notes: Option<String>,
    pub add_ons: Option<String>,
}

/// A dispatched payload ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenJob {
    pub station: String,
    pub printer: String,
    pub job_id: String,
    pub pos_invoice: String,
}

/// Acknowledgement of an asynchronous print request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedAck {
    pub queued: bool,
    pub name: String,
    pub printer: String,
}
