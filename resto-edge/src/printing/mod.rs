//! Fiscal document printing
//!
//! Bills, kitchen tickets grouped by station and checker tickets:
//! - **snapshot**: order → plain printable values
//! - **bill / kitchen / checker**: ESC/POS assemblers
//! - **routing**: items → kitchen stations via branch menus
//! - **dispatcher**: byte streams → spooler jobs
//! - **service**: operational entry points
//! - **worker**: asynchronous bill path
//! - **storage**: kitchen ticket log (redb)

pub mod bill;
pub mod checker;
pub mod dispatcher;
pub mod kitchen;
pub mod routing;
pub mod service;
pub mod snapshot;
pub mod storage;
pub mod types;
pub mod worker;

pub use bill::BillRenderer;
pub use checker::CheckerRenderer;
pub use dispatcher::{DispatchError, DispatchResult, SpoolDispatcher};
pub use kitchen::KitchenRenderer;
pub use routing::{
    InMemoryMenuDirectory, KitchenRouter, MenuDirectory, RoutedItem, RoutingScope, StationGroup,
};
pub use service::{PrintService, PrintServiceError, PrintServiceResult};
pub use snapshot::InvoiceSnapshot;
pub use storage::{KitchenTicketLog, PrintStorageError, PrintStorageResult, TicketLogStats};
pub use types::*;
pub use worker::{BillJob, PrintJobSender, PrintWorker};
