//! Bill print worker
//!
//! Asynchronous bill path: requests are acknowledged as queued and
//! printed by a background task. The outcome is only logged.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::service::{PrintService, PrintServiceError, PrintServiceResult};
use super::types::{BillOptions, QueuedAck};

/// A queued bill print
#[derive(Debug, Clone)]
pub struct BillJob {
    pub order_id: String,
    pub printer: String,
    pub options: BillOptions,
}

/// Handle for enqueueing bill prints
#[derive(Clone)]
pub struct PrintJobSender {
    tx: mpsc::Sender<BillJob>,
}

impl PrintJobSender {
    pub(crate) fn new(tx: mpsc::Sender<BillJob>) -> Self {
        Self { tx }
    }

    /// Queue a bill print; waits while the queue is full
    pub async fn enqueue_bill(
        &self,
        order_id: &str,
        printer: &str,
        options: BillOptions,
    ) -> PrintServiceResult<QueuedAck> {
        let order_id = order_id.trim();
        let printer = printer.trim();
        if order_id.is_empty() {
            return Err(PrintServiceError::Validation("order id is required".to_string()));
        }
        if printer.is_empty() {
            return Err(PrintServiceError::Validation("printer name is required".to_string()));
        }

        self.tx
            .send(BillJob {
                order_id: order_id.to_string(),
                printer: printer.to_string(),
                options,
            })
            .await
            .map_err(|_| PrintServiceError::QueueClosed)?;

        tracing::debug!(order_id = %order_id, printer = %printer, "Bill print queued");
        Ok(QueuedAck {
            queued: true,
            name: order_id.to_string(),
            printer: printer.to_string(),
        })
    }
}

/// Background bill printer
pub struct PrintWorker {
    service: PrintService,
}

impl PrintWorker {
    pub fn new(service: PrintService) -> Self {
        Self { service }
    }

    /// Run until shutdown or until every sender is dropped
    pub async fn run(self, mut rx: mpsc::Receiver<BillJob>, shutdown: CancellationToken) {
        tracing::info!("Print worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Print worker received shutdown signal");
                    break;
                }
                job = rx.recv() => {
                    let Some(job) = job else {
                        tracing::info!("Print channel closed, print worker stopping");
                        break;
                    };
                    self.handle(job).await;
                }
            }
        }
    }

    async fn handle(&self, job: BillJob) {
        match self
            .service
            .print_bill(&job.order_id, &job.printer, &job.options)
            .await
        {
            Ok(receipt) => {
                tracing::info!(
                    order_id = %job.order_id,
                    printer = %receipt.printer,
                    job_id = %receipt.job_id,
                    "Queued bill printed"
                );
            }
            Err(e) => {
                tracing::error!(
                    order_id = %job.order_id,
                    printer = %job.printer,
                    error = %e,
                    "Queued bill print failed"
                );
            }
        }
    }
}
