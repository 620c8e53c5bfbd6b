//! Resto Edge - POS finalization and fiscal document printing
//!
//! # Overview
//!
//! - **Recalculation** (`order_money`): order totals, taxes and payments
//!   with voided items kept economically invisible
//! - **Orders** (`orders`): store boundary and per-order locks
//! - **Printing** (`printing`): bill, kitchen and checker tickets, kitchen
//!   routing, spooler dispatch, kitchen ticket log
//! - **Core** (`core`): environment configuration
//!
//! # Module layout
//!
//! ```text
//! resto-edge/src/
//! ├── core/          # Config
//! ├── order_money/   # recalculation engine
//! ├── orders/        # OrderStore, OrderLocks
//! ├── printing/      # assemblers, routing, dispatch, service, worker
//! └── utils/         # logger
//! ```

pub mod core;
pub mod order_money;
pub mod orders;
pub mod printing;
pub mod utils;

// Re-exports
pub use core::{Config, PaperProfile};
pub use order_money::{recalculate, recalculate_totals};
pub use orders::{InMemoryOrderStore, OrderLocks, OrderStore, OrderStoreError};
pub use printing::{
    BillOptions, DocumentKind, InMemoryMenuDirectory, KitchenTicketLog, MenuDirectory,
    PrintJobSender, PrintReport, PrintService, PrintServiceError, PrintServiceResult,
    RenderConfig, RoutingScope, Staff,
};
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, start logging, then read the configuration
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty());
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Config::from_env()
}
