//! Shared types for the resto workspace
//!
//! Strongly-typed order documents, menu routing records and currency
//! helpers used by both the printer library and the edge service.

pub mod currency;
pub mod menu;
pub mod order;

// Re-exports
pub use currency::{currency_precision, is_zero_decimal_currency};
pub use menu::{BranchMenu, PrinterAssignment};
pub use order::{
    ChargeType, KitchenStatus, LineItem, Order, OrderType, PaymentLine, TaxLine,
};
pub use serde::{Deserialize, Serialize};
