//! Spool dispatcher
//!
//! Hands finished byte streams to the print queue as raw jobs. The target
//! device is resolved against the queue's registry before anything is
//! submitted.

use std::collections::BTreeSet;
use std::sync::Arc;

use resto_printer::{JobOptions, PrintError, PrintQueue};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Printer not found: {0}")]
    NotFound(String),

    #[error("Spool error: {0}")]
    Spool(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl From<PrintError> for DispatchError {
    fn from(err: PrintError) -> Self {
        match err {
            PrintError::DeviceNotFound(name) => DispatchError::NotFound(name),
            PrintError::InvalidConfig(msg) => DispatchError::Validation(msg),
            other => DispatchError::Spool(other.to_string()),
        }
    }
}

/// Submits jobs through a [`PrintQueue`]
#[derive(Clone)]
pub struct SpoolDispatcher {
    queue: Arc<dyn PrintQueue>,
}

impl SpoolDispatcher {
    pub fn new(queue: Arc<dyn PrintQueue>) -> Self {
        Self { queue }
    }

    /// Registered device names
    pub async fn devices(&self) -> DispatchResult<BTreeSet<String>> {
        self.queue.list_devices().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list print devices");
            DispatchError::from(e)
        })
    }

    /// Check that `printer` names a registered device
    pub async fn resolve(&self, printer: &str) -> DispatchResult<()> {
        let printer = validate_printer(printer)?;
        let devices = self.devices().await?;
        if !devices.contains(printer) {
            tracing::error!(printer = %printer, "Printer not registered with the spooler");
            return Err(DispatchError::NotFound(printer.to_string()));
        }
        Ok(())
    }

    /// Submit `data` to `printer`
    pub async fn dispatch(&self, data: &[u8], printer: &str, label: &str) -> DispatchResult<String> {
        self.resolve(printer).await?;
        self.submit(data, printer.trim(), label).await
    }

    /// Resolve `printer`, then build and submit the payload
    ///
    /// `build` is not called when the device cannot be resolved.
    pub async fn dispatch_with<F>(&self, printer: &str, label: &str, build: F) -> DispatchResult<String>
    where
        F: FnOnce() -> Vec<u8>,
    {
        self.resolve(printer).await?;
        let data = build();
        self.submit(&data, printer.trim(), label).await
    }

    /// Submit to a device already resolved by the caller
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn submit(&self, data: &[u8], printer: &str, label: &str) -> DispatchResult<String> {
        match self
            .queue
            .submit_job(data, printer, label, JobOptions::default())
            .await
        {
            Ok(job_id) => {
                tracing::info!(printer = %printer, job_id = %job_id, label = %label, bytes = data.len(), "Print job submitted");
                Ok(job_id)
            }
            Err(e) => {
                tracing::error!(
                    printer = %printer,
                    label = %label,
                    bytes = data.len(),
                    error = %e,
                    "Print job failed"
                );
                Err(e.into())
            }
        }
    }
}

/// Trimmed printer name, rejecting blanks
pub fn validate_printer(printer: &str) -> DispatchResult<&str> {
    let printer = printer.trim();
    if printer.is_empty() {
        return Err(DispatchError::Validation("printer name is required".to_string()));
    }
    Ok(printer)
}
