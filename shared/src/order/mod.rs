//! Order documents
//!
//! - [`Order`]: the invoice aggregate (header, totals, child tables)
//! - [`LineItem`], [`TaxLine`], [`PaymentLine`]: child rows
//!
//! Totals on these types are written by the recalculation engine in the
//! edge service; nothing here computes money.

pub mod document;
pub mod types;

// Re-exports
pub use document::{Order, OrderType};
pub use types::*;
