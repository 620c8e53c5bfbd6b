//! Order store boundary
//!
//! Orders are owned by the document layer; the print path loads them,
//! recalculates, and writes the derived totals and item markers back.

use async_trait::async_trait;
use dashmap::DashMap;
use shared::order::Order;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderStoreError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order store error: {0}")]
    Backend(String),
}

pub type OrderStoreResult<T> = Result<T, OrderStoreError>;

/// Persistence of order documents
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn load(&self, order_id: &str) -> OrderStoreResult<Order>;

    /// Persist the whole document (totals and markers included)
    async fn save(&self, order: &Order) -> OrderStoreResult<()>;
}

/// Orders held in memory, keyed by name
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<String, Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: Order) {
        self.orders.insert(order.name.clone(), order);
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.orders.get(order_id).map(|o| o.clone())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn load(&self, order_id: &str) -> OrderStoreResult<Order> {
        self.get(order_id)
            .ok_or_else(|| OrderStoreError::NotFound(order_id.to_string()))
    }

    async fn save(&self, order: &Order) -> OrderStoreResult<()> {
        if order.name.trim().is_empty() {
            return Err(OrderStoreError::Backend("order has no name".to_string()));
        }
        self.insert(order.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_and_save() {
        let store = InMemoryOrderStore::new();
        assert!(matches!(
            store.load("POSINV-0001").await,
            Err(OrderStoreError::NotFound(_))
        ));

        let mut order = Order::new("POSINV-0001", "IDR");
        store.save(&order).await.unwrap();
        order.remarks = Some("no ice".to_string());
        store.save(&order).await.unwrap();

        let loaded = store.load("POSINV-0001").await.unwrap();
        assert_eq!(loaded.remarks.as_deref(), Some("no ice"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_save_requires_name() {
        let store = InMemoryOrderStore::new();
        let order = Order::new("", "IDR");
        assert!(matches!(
            store.save(&order).await,
            Err(OrderStoreError::Backend(_))
        ));
    }
}
