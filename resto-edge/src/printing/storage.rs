//! redb-based kitchen ticket log

use super::types::LoggedTicket;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Tickets table: key = ticket_id, value = JSON
const TICKETS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kitchen_tickets");

/// Index: (order_id, ticket_id) -> ()
const TICKETS_BY_ORDER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("kitchen_tickets_by_order");

#[derive(Debug, Error)]
pub enum PrintStorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Kitchen ticket not found: {0}")]
    TicketNotFound(String),
}

pub type PrintStorageResult<T> = Result<T, PrintStorageError>;

/// Log statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketLogStats {
    pub tickets: u64,
}

/// Audit trail of generated kitchen tickets
#[derive(Clone)]
pub struct KitchenTicketLog {
    db: Arc<Database>,
}

impl KitchenTicketLog {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> PrintStorageResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// Open a volatile log (tests, dry runs)
    pub fn open_in_memory() -> PrintStorageResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> PrintStorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TICKETS_TABLE)?;
            let _ = write_txn.open_table(TICKETS_BY_ORDER_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn begin_write(&self) -> PrintStorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Store a ticket
    pub fn store_ticket(&self, txn: &WriteTransaction, ticket: &LoggedTicket) -> PrintStorageResult<()> {
        let mut table = txn.open_table(TICKETS_TABLE)?;
        let value = serde_json::to_vec(ticket)?;
        table.insert(ticket.id.as_str(), value.as_slice())?;

        let mut idx_table = txn.open_table(TICKETS_BY_ORDER_TABLE)?;
        idx_table.insert((ticket.order_id.as_str(), ticket.id.as_str()), ())?;

        Ok(())
    }

    /// Store a single ticket in its own transaction
    pub fn record(&self, ticket: &LoggedTicket) -> PrintStorageResult<()> {
        let txn = self.begin_write()?;
        self.store_ticket(&txn, ticket)?;
        txn.commit()?;
        Ok(())
    }

    /// Get a ticket by ID
    pub fn get_ticket(&self, id: &str) -> PrintStorageResult<Option<LoggedTicket>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TICKETS_TABLE)?;

        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Tickets of an order, oldest first
    pub fn tickets_for_order(&self, order_id: &str) -> PrintStorageResult<Vec<LoggedTicket>> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(TICKETS_BY_ORDER_TABLE)?;
        let data_table = read_txn.open_table(TICKETS_TABLE)?;

        let mut tickets = Vec::new();
        let range_start: (&str, &str) = (order_id, "");
        let range_end: (&str, &str) = (order_id, "\u{ffff}");

        for result in idx_table.range(range_start..=range_end)? {
            let (key, _) = result?;
            let (_, ticket_id) = key.value();
            if let Some(guard) = data_table.get(ticket_id)? {
                let ticket: LoggedTicket = serde_json::from_slice(guard.value())?;
                tickets.push(ticket);
            }
        }

        tickets.sort_by_key(|t| t.created_at);
        Ok(tickets)
    }

    /// Bump the print count, returning the new value
    pub fn increment_print_count(&self, txn: &WriteTransaction, id: &str) -> PrintStorageResult<u32> {
        let mut table = txn.open_table(TICKETS_TABLE)?;

        let bytes = {
            let value = table
                .get(id)?
                .ok_or_else(|| PrintStorageError::TicketNotFound(id.to_string()))?;
            value.value().to_vec()
        };

        let mut ticket: LoggedTicket = serde_json::from_slice(&bytes)?;
        ticket.print_count += 1;

        let new_value = serde_json::to_vec(&ticket)?;
        table.insert(id, new_value.as_slice())?;

        Ok(ticket.print_count)
    }

    /// Delete tickets older than `max_age_secs`
    pub fn cleanup_old_tickets(&self, max_age_secs: i64) -> PrintStorageResult<usize> {
        let cutoff = chrono::Utc::now().timestamp() - max_age_secs;

        let txn = self.db.begin_write()?;
        let deleted = {
            let mut table = txn.open_table(TICKETS_TABLE)?;
            let mut idx_table = txn.open_table(TICKETS_BY_ORDER_TABLE)?;

            let mut to_delete = Vec::new();
            for result in table.iter()? {
                let (key, guard) = result?;
                let ticket: LoggedTicket = serde_json::from_slice(guard.value())?;
                if ticket.created_at < cutoff {
                    to_delete.push((key.value().to_string(), ticket.order_id));
                }
            }

            for (id, order_id) in &to_delete {
                table.remove(id.as_str())?;
                idx_table.remove((order_id.as_str(), id.as_str()))?;
            }
            to_delete.len()
        };
        txn.commit()?;

        if deleted > 0 {
            tracing::info!(deleted, "Cleaned up old kitchen tickets");
        }
        Ok(deleted)
    }

    pub fn stats(&self) -> PrintStorageResult<TicketLogStats> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TICKETS_TABLE)?;
        Ok(TicketLogStats {
            tickets: table.len()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::types::{KITCHEN_TITLE, KitchenTicket, KitchenTicketItem};
    use rust_decimal_macros::dec;

    fn logged(id: &str, order_id: &str, created_at: i64) -> LoggedTicket {
        LoggedTicket {
            id: id.to_string(),
            order_id: order_id.to_string(),
            created_at,
            print_count: 1,
            ticket: KitchenTicket {
                title_prefix: KITCHEN_TITLE.to_string(),
                station: "Bar".to_string(),
                printer_name: "BAR".to_string(),
                order_ref: order_id.to_string(),
                posted_at: "2025-10-10 15:23:00".to_string(),
                table: None,
                order_type: None,
                queue_number: None,
                staff: None,
                items: vec![KitchenTicketItem {
                    row_id: Some("r1".to_string()),
                    short_name: None,
                    menu_name: "Es Teh".to_string(),
                    qty: dec!(2),
                    add_ons: None,
                    notes: None,
                }],
            },
        }
    }

    #[test]
    fn test_store_and_query() {
        let log = KitchenTicketLog::open_in_memory().unwrap();
        log.record(&logged("t2", "POSINV-0001", 200)).unwrap();
        log.record(&logged("t1", "POSINV-0001", 100)).unwrap();
        log.record(&logged("t3", "POSINV-0002", 300)).unwrap();

        let tickets = log.tickets_for_order("POSINV-0001").unwrap();
        let ids: Vec<_> = tickets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);

        let t3 = log.get_ticket("t3").unwrap().unwrap();
        assert_eq!(t3.ticket.items[0].qty, dec!(2));
        assert!(log.get_ticket("missing").unwrap().is_none());
        assert_eq!(log.stats().unwrap().tickets, 3);
    }

    #[test]
    fn test_increment_print_count() {
        let log = KitchenTicketLog::open_in_memory().unwrap();
        log.record(&logged("t1", "POSINV-0001", 100)).unwrap();

        let txn = log.begin_write().unwrap();
        assert_eq!(log.increment_print_count(&txn, "t1").unwrap(), 2);
        assert!(matches!(
            log.increment_print_count(&txn, "nope"),
            Err(PrintStorageError::TicketNotFound(_))
        ));
        txn.commit().unwrap();

        assert_eq!(log.get_ticket("t1").unwrap().unwrap().print_count, 2);
    }

    #[test]
    fn test_cleanup_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kitchen_tickets.redb");
        {
            let log = KitchenTicketLog::open(&path).unwrap();
            let now = chrono::Utc::now().timestamp();
            log.record(&logged("old", "POSINV-0001", now - 7200)).unwrap();
            log.record(&logged("new", "POSINV-0001", now)).unwrap();
            assert_eq!(log.cleanup_old_tickets(3600).unwrap(), 1);
        }

        let log = KitchenTicketLog::open(&path).unwrap();
        let ids: Vec<_> = log
            .tickets_for_order("POSINV-0001")
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["new".to_string()]);
    }
}
