//! Orders
//!
//! - **store**: [`OrderStore`] boundary to the document layer
//! - **locks**: per-order async mutexes

pub mod locks;
pub mod store;

pub use locks::{OrderGuard, OrderLocks};
pub use store::{InMemoryOrderStore, OrderStore, OrderStoreError, OrderStoreResult};
