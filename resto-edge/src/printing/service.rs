//! Print service - operational entry points
//!
//! Every order-bound operation runs under the order's lock: load,
//! recalculate, assemble, dispatch, then write totals and item markers
//! back through the [`OrderStore`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use resto_printer::{PrintQueue, strip_commands};
use shared::order::{KitchenStatus, Order};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::bill::BillRenderer;
use super::checker::{CheckerRenderer, unchecked_items};
use super::dispatcher::{DispatchError, SpoolDispatcher};
use super::kitchen::KitchenRenderer;
use super::routing::{KitchenRouter, MenuDirectory, RoutingScope, StationGroup};
use super::snapshot::{InvoiceSnapshot, TIMESTAMP_FORMAT};
use super::storage::{KitchenTicketLog, PrintStorageError};
use super::types::{
    BillOptions, DocumentKind, JobReceipt, KITCHEN_TITLE, KitchenJob, KitchenPayloadEntry,
    KitchenTicket, KitchenTicketItem, LoggedTicket, PrintReport, RenderConfig, Staff,
    StationOutcome,
};
use super::worker::{PrintJobSender, PrintWorker};
use crate::order_money::recalculate_totals;
use crate::orders::{OrderLocks, OrderStore, OrderStoreError};

#[derive(Debug, Error)]
pub enum PrintServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Spool error: {0}")]
    Spool(String),

    #[error("Bill printed but {} kitchen station(s) failed", .0.failed_stations().count())]
    PartialFailure(Box<PrintReport>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Print queue closed")]
    QueueClosed,
}

pub type PrintServiceResult<T> = Result<T, PrintServiceError>;

impl From<DispatchError> for PrintServiceError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(msg) => PrintServiceError::Validation(msg),
            DispatchError::NotFound(name) => PrintServiceError::NotFound(format!("printer {name}")),
            DispatchError::Spool(msg) => PrintServiceError::Spool(msg),
        }
    }
}

impl From<PrintStorageError> for PrintServiceError {
    fn from(err: PrintStorageError) -> Self {
        match err {
            PrintStorageError::TicketNotFound(id) => {
                PrintServiceError::NotFound(format!("kitchen ticket {id}"))
            }
            other => PrintServiceError::Storage(other.to_string()),
        }
    }
}

impl From<OrderStoreError> for PrintServiceError {
    fn from(err: OrderStoreError) -> Self {
        match err {
            OrderStoreError::NotFound(id) => PrintServiceError::NotFound(format!("order {id}")),
            OrderStoreError::Backend(msg) => PrintServiceError::Storage(msg),
        }
    }
}

/// Print service
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct PrintService {
    config: Arc<RenderConfig>,
    orders: Arc<dyn OrderStore>,
    router: KitchenRouter,
    dispatcher: SpoolDispatcher,
    log: KitchenTicketLog,
    locks: OrderLocks,
}

impl PrintService {
    pub fn new(
        config: RenderConfig,
        orders: Arc<dyn OrderStore>,
        menus: Arc<dyn MenuDirectory>,
        queue: Arc<dyn PrintQueue>,
        log: KitchenTicketLog,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orders,
            router: KitchenRouter::new(menus),
            dispatcher: SpoolDispatcher::new(queue),
            log,
            locks: OrderLocks::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn ticket_log(&self) -> &KitchenTicketLog {
        &self.log
    }

    pub fn dispatcher(&self) -> &SpoolDispatcher {
        &self.dispatcher
    }

    /// Load and recalculate; nothing is written back
    async fn prepare(&self, order_id: &str) -> PrintServiceResult<Order> {
        let mut order = self.orders.load(order_id).await?;
        if order.currency.trim().is_empty() {
            order.currency = self.config.default_currency.clone();
        }
        recalculate_totals(&mut order);
        Ok(order)
    }

    fn snapshot(&self, order: &Order) -> InvoiceSnapshot {
        InvoiceSnapshot::collect(order, &self.config.default_currency)
    }

    // ========== Bill ==========

    /// Recalculate, persist and print the customer bill
    #[instrument(skip_all, fields(order_id = %order_id, printer = %printer))]
    pub async fn print_bill(
        &self,
        order_id: &str,
        printer: &str,
        options: &BillOptions,
    ) -> PrintServiceResult<JobReceipt> {
        let _guard = self.locks.lock(order_id).await;
        let order = self.prepare(order_id).await?;
        self.orders.save(&order).await?;
        self.dispatch_bill(&order, printer, options).await
    }

    /// Bill, then kitchen tickets for every pending item
    ///
    /// Station failures do not undo the bill: they come back as
    /// [`PrintServiceError::PartialFailure`] carrying the full report.
    #[instrument(skip_all, fields(order_id = %order_id, printer = %printer))]
    pub async fn print_now(
        &self,
        order_id: &str,
        printer: &str,
        options: &BillOptions,
    ) -> PrintServiceResult<PrintReport> {
        let _guard = self.locks.lock(order_id).await;
        let mut order = self.prepare(order_id).await?;
        self.orders.save(&order).await?;

        let bill = self.dispatch_bill(&order, printer, options).await?;
        let kitchen = self
            .fan_out(&mut order, RoutingScope::Pending, options.cashier.as_ref(), false)
            .await?;
        self.orders.save(&order).await?;

        let report = PrintReport { bill, kitchen };
        let failed = report.failed_stations().count();
        if failed > 0 {
            tracing::warn!(order_id = %order_id, failed, "Kitchen printing partially failed");
            return Err(PrintServiceError::PartialFailure(Box::new(report)));
        }
        Ok(report)
    }

    async fn dispatch_bill(
        &self,
        order: &Order,
        printer: &str,
        options: &BillOptions,
    ) -> PrintServiceResult<JobReceipt> {
        let label = format!("POS_Receipt_{}", order.name);
        let snap = self.snapshot(order);
        let job_id = self
            .dispatcher
            .dispatch_with(printer, &label, || {
                BillRenderer::new(&self.config).render(&snap, options)
            })
            .await?;

        Ok(JobReceipt {
            printer: printer.trim().to_string(),
            job_id,
            label,
        })
    }

    // ========== Kitchen ==========

    /// Route, render and dispatch kitchen tickets, one per station
    ///
    /// Fails before any dispatch only when the device registry cannot be
    /// listed. Items become `Sent` once every station they were routed
    /// to accepted its ticket.
    #[instrument(skip_all, fields(order_id = %order_id, scope = ?scope))]
    pub async fn print_kitchen(
        &self,
        order_id: &str,
        scope: RoutingScope,
        staff: Option<&Staff>,
    ) -> PrintServiceResult<Vec<StationOutcome>> {
        let _guard = self.locks.lock(order_id).await;
        let mut order = self.prepare(order_id).await?;
        let outcomes = self.fan_out(&mut order, scope, staff, true).await?;
        self.orders.save(&order).await?;
        Ok(outcomes)
    }

    /// Sequential per-station dispatch
    ///
    /// With `strict`, a registry listing failure is returned as an error;
    /// otherwise every station is reported failed.
    async fn fan_out(
        &self,
        order: &mut Order,
        scope: RoutingScope,
        staff: Option<&Staff>,
        strict: bool,
    ) -> PrintServiceResult<Vec<StationOutcome>> {
        let groups = self.router.route(order, scope).await;
        if groups.is_empty() {
            tracing::debug!(order_id = %order.name, "No items routed to kitchen stations");
            return Ok(Vec::new());
        }

        let devices = match self.dispatcher.devices().await {
            Ok(devices) => Ok(devices),
            Err(e) if strict => return Err(e.into()),
            Err(e) => Err(e.to_string()),
        };

        let snap = self.snapshot(order);
        let mut outcomes = Vec::with_capacity(groups.len());
        let mut row_ok: HashMap<String, bool> = HashMap::new();

        for group in &groups {
            let outcome = self.print_station(&snap, group, staff, &devices).await;
            for routed in &group.items {
                let ok = row_ok.entry(routed.item.row_id.clone()).or_insert(true);
                *ok &= outcome.is_ok();
            }
            outcomes.push(outcome);
        }

        for (row_id, ok) in row_ok {
            if !ok {
                continue;
            }
            if let Some(item) = order.item_mut(&row_id)
                && item.status_kitchen == KitchenStatus::NotSent
            {
                item.status_kitchen = KitchenStatus::Sent;
            }
        }

        tracing::info!(
            order_id = %order.name,
            stations = outcomes.len(),
            failed = outcomes.iter().filter(|o| !o.is_ok()).count(),
            "Kitchen fan-out finished"
        );
        Ok(outcomes)
    }

    async fn print_station(
        &self,
        snap: &InvoiceSnapshot,
        group: &StationGroup,
        staff: Option<&Staff>,
        devices: &Result<BTreeSet<String>, String>,
    ) -> StationOutcome {
        let mut outcome = StationOutcome {
            station: group.station.clone(),
            printer: group.printer_name.clone(),
            item_count: group.items.len(),
            job_id: None,
            ticket_id: None,
            error: None,
        };

        let devices = match devices {
            Ok(devices) => devices,
            Err(e) => {
                outcome.error = Some(e.clone());
                return outcome;
            }
        };
        if !devices.contains(&group.printer_name) {
            tracing::error!(
                station = %group.station,
                printer = %group.printer_name,
                "Kitchen printer not registered with the spooler"
            );
            outcome.error = Some(DispatchError::NotFound(group.printer_name.clone()).to_string());
            return outcome;
        }

        let ticket = KitchenTicket::for_group(snap, group, staff, KITCHEN_TITLE);
        let data = KitchenRenderer::new(&self.config).render(&ticket, false);
        let label = format!("KITCHEN_{}", group.station);

        match self.dispatcher.submit(&data, &group.printer_name, &label).await {
            Ok(job_id) => {
                outcome.ticket_id = self.log_ticket(&snap.name, ticket);
                outcome.job_id = Some(job_id);
            }
            Err(e) => outcome.error = Some(e.to_string()),
        }
        outcome
    }

    /// Record a dispatched ticket; log failures never fail the print
    fn log_ticket(&self, order_id: &str, ticket: KitchenTicket) -> Option<String> {
        let entry = LoggedTicket {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            created_at: chrono::Utc::now().timestamp(),
            ticket,
            print_count: 1,
        };
        match self.log.record(&entry) {
            Ok(()) => Some(entry.id),
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Failed to record kitchen ticket");
                None
            }
        }
    }

    /// Print caller-supplied kitchen tickets
    ///
    /// Every entry is validated and every printer resolved before the
    /// first job is submitted.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn print_kitchen_payload(
        &self,
        entries: &[KitchenPayloadEntry],
        title_prefix: Option<&str>,
    ) -> PrintServiceResult<Vec<KitchenJob>> {
        if entries.is_empty() {
            return Err(PrintServiceError::Validation("kitchen payload is empty".to_string()));
        }
        let title = title_prefix
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(KITCHEN_TITLE);

        let mut resolved = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            let station = entry.kitchen_station.trim();
            if station.is_empty() {
                return Err(PrintServiceError::Validation(format!(
                    "entry {idx}: kitchen_station is required"
                )));
            }
            let printer = entry
                .printer_name
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .unwrap_or(station);
            resolved.push((entry, station, printer));
        }

        let devices = self.dispatcher.devices().await?;
        if let Some((_, station, printer)) = resolved.iter().find(|(_, _, p)| !devices.contains(*p)) {
            tracing::error!(station = %station, printer = %printer, "Kitchen printer not registered");
            return Err(PrintServiceError::NotFound(format!("printer {printer}")));
        }

        let now = chrono::Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string();
        let mut jobs = Vec::with_capacity(resolved.len());

        for (entry, station, printer) in resolved {
            let invoice = entry.pos_invoice.trim();
            let ticket = KitchenTicket {
                title_prefix: title.to_string(),
                station: station.to_string(),
                printer_name: printer.to_string(),
                order_ref: invoice.to_string(),
                posted_at: entry
                    .transaction_date
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map_or_else(|| now.clone(), str::to_string),
                table: None,
                order_type: None,
                queue_number: None,
                staff: None,
                items: entry
                    .items
                    .iter()
                    .map(|i| KitchenTicketItem {
                        row_id: None,
                        short_name: i.short_name.clone().filter(|s| !s.trim().is_empty()),
                        menu_name: i.resto_menu.trim().to_string(),
                        qty: i.qty,
                        add_ons: i.add_ons.clone().filter(|s| !s.trim().is_empty()),
                        notes: i.quick_notes.clone().filter(|s| !s.trim().is_empty()),
                    })
                    .collect(),
            };

            let data = KitchenRenderer::new(&self.config).render(&ticket, false);
            let label = format!("KITCHEN_{station}");
            let job_id = self.dispatcher.submit(&data, printer, &label).await?;
            if !invoice.is_empty() {
                self.log_ticket(invoice, ticket);
            }

            jobs.push(KitchenJob {
                station: station.to_string(),
                printer: printer.to_string(),
                job_id,
                pos_invoice: invoice.to_string(),
            });
        }

        Ok(jobs)
    }

    /// Reprint a logged kitchen ticket with a reprint marker
    #[instrument(skip(self))]
    pub async fn reprint_kitchen_ticket(&self, ticket_id: &str) -> PrintServiceResult<JobReceipt> {
        let logged = self
            .log
            .get_ticket(ticket_id)?
            .ok_or_else(|| PrintServiceError::NotFound(format!("kitchen ticket {ticket_id}")))?;

        let printer = logged.ticket.printer_name.as_str();
        let label = format!("KITCHEN_{}", logged.ticket.station);
        let job_id = self
            .dispatcher
            .dispatch_with(printer, &label, || {
                KitchenRenderer::new(&self.config).render(&logged.ticket, true)
            })
            .await?;

        let txn = self.log.begin_write()?;
        let print_count = self.log.increment_print_count(&txn, ticket_id)?;
        txn.commit().map_err(PrintStorageError::from)?;

        tracing::info!(ticket_id = %ticket_id, print_count, "Kitchen ticket reprinted");
        Ok(JobReceipt {
            printer: printer.to_string(),
            job_id,
            label,
        })
    }

    // ========== Checker ==========

    /// Print un-checked items and mark them checked
    ///
    /// Returns `None` without dispatching when nothing is left to check.
    #[instrument(skip_all, fields(order_id = %order_id, printer = %printer))]
    pub async fn print_checker(
        &self,
        order_id: &str,
        printer: &str,
        staff: Option<&Staff>,
    ) -> PrintServiceResult<Option<JobReceipt>> {
        let _guard = self.locks.lock(order_id).await;
        let mut order = self.prepare(order_id).await?;
        let snap = self.snapshot(&order);

        let rows: Vec<String> = unchecked_items(&snap)
            .into_iter()
            .map(|i| i.row_id.clone())
            .collect();
        if rows.is_empty() {
            tracing::debug!(order_id = %order_id, "All items already checked");
            self.orders.save(&order).await?;
            return Ok(None);
        }

        let label = format!("CHECKER_{}", order.name);
        let job_id = self
            .dispatcher
            .dispatch_with(printer, &label, || {
                CheckerRenderer::new(&self.config).render(&snap, staff)
            })
            .await?;

        for row_id in &rows {
            if let Some(item) = order.item_mut(row_id) {
                item.is_checked = true;
            }
        }
        self.orders.save(&order).await?;

        Ok(Some(JobReceipt {
            printer: printer.trim().to_string(),
            job_id,
            label,
        }))
    }

    // ========== Preview ==========

    /// Plain-text rendering of a document; never dispatches or writes
    pub async fn preview(
        &self,
        order_id: &str,
        kind: DocumentKind,
        staff: Option<&Staff>,
    ) -> PrintServiceResult<String> {
        let order = self.prepare(order_id).await?;
        let snap = self.snapshot(&order);

        let bytes = match kind {
            DocumentKind::Bill => {
                let options = BillOptions {
                    cashier: staff.cloned(),
                    ..Default::default()
                };
                BillRenderer::new(&self.config).render(&snap, &options)
            }
            DocumentKind::Kitchen => {
                let renderer = KitchenRenderer::new(&self.config);
                let mut bytes = Vec::new();
                for group in self.router.route(&order, RoutingScope::Pending).await {
                    let ticket = KitchenTicket::for_group(&snap, &group, staff, KITCHEN_TITLE);
                    bytes.extend(renderer.render(&ticket, false));
                }
                bytes
            }
            DocumentKind::Checker => CheckerRenderer::new(&self.config).render(&snap, staff),
        };

        Ok(strip_commands(&bytes, self.config.codepage))
    }

    // ========== Async path ==========

    /// Start the background bill worker
    pub fn spawn_worker(
        &self,
        shutdown: CancellationToken,
        capacity: usize,
    ) -> (PrintJobSender, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = PrintWorker::new(self.clone());
        let handle = tokio::spawn(worker.run(rx, shutdown));
        (PrintJobSender::new(tx), handle)
    }
}
