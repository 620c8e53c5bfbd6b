//! Print queue adapters
//!
//! The edge never talks to devices directly; finished byte streams are
//! handed to a spooler as raw jobs. [`LpSpooler`] drives the CUPS
//! command-line client, [`MemoryQueue`] keeps everything in process.

use std::collections::BTreeSet;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::error::{PrintError, PrintResult};

/// Per-job spooler options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOptions {
    /// Send bytes untouched (no filter chain)
    pub raw: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self { raw: true }
    }
}

/// A system print queue
#[async_trait]
pub trait PrintQueue: Send + Sync {
    /// Names of the devices currently registered
    async fn list_devices(&self) -> PrintResult<BTreeSet<String>>;

    /// Submit a job and return the spooler's job id
    async fn submit_job(
        &self,
        data: &[u8],
        device: &str,
        label: &str,
        options: JobOptions,
    ) -> PrintResult<String>;
}

/// Default spooler command timeout
pub const DEFAULT_SPOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// CUPS via `lpstat` / `lp`
#[derive(Debug, Clone)]
pub struct LpSpooler {
    lpstat: String,
    lp: String,
    /// CUPS server (`-h`), None = local scheduler
    server: Option<String>,
    timeout: Duration,
}

impl LpSpooler {
    pub fn new() -> Self {
        Self {
            lpstat: "lpstat".to_string(),
            lp: "lp".to_string(),
            server: None,
            timeout: DEFAULT_SPOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Override the client binaries (tests, non-standard installs)
    pub fn with_programs(mut self, lpstat: impl Into<String>, lp: impl Into<String>) -> Self {
        self.lpstat = lpstat.into();
        self.lp = lp.into();
        self
    }

    fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        if let Some(server) = &self.server {
            cmd.arg("-h").arg(server);
        }
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run a child to completion, optionally feeding stdin
    ///
    /// The timeout covers the stdin write as well as the wait: a spooler
    /// that never drains its input is killed on drop.
    async fn run(
        &self,
        mut cmd: Command,
        program: &str,
        stdin: Option<&[u8]>,
    ) -> PrintResult<String> {
        if stdin.is_some() {
            cmd.stdin(Stdio::piped());
        }
        let mut child = cmd.spawn()?;
        let pipe = child.stdin.take();

        let feed = async move {
            if let (Some(mut pipe), Some(data)) = (pipe, stdin) {
                pipe.write_all(data).await?;
                pipe.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let finished = async { tokio::join!(feed, child.wait_with_output()) };

        let (fed, output) = tokio::time::timeout(self.timeout, finished)
            .await
            .map_err(|_| {
                PrintError::Timeout(format!("{program} did not finish in {:?}", self.timeout))
            })?;
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrintError::Spool(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        // a clean exit after a short write still means a truncated job
        fed?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for LpSpooler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrintQueue for LpSpooler {
    #[instrument(skip(self))]
    async fn list_devices(&self) -> PrintResult<BTreeSet<String>> {
        let mut cmd = self.command(&self.lpstat);
        cmd.arg("-e");
        let stdout = self.run(cmd, &self.lpstat, None).await?;
        let devices: BTreeSet<String> = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        debug!(count = devices.len(), "listed spooler destinations");
        Ok(devices)
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn submit_job(
        &self,
        data: &[u8],
        device: &str,
        label: &str,
        options: JobOptions,
    ) -> PrintResult<String> {
        let mut cmd = self.command(&self.lp);
        cmd.arg("-d").arg(device).arg("-t").arg(label);
        if options.raw {
            cmd.arg("-o").arg("raw");
        }
        cmd.arg("-");

        let stdout = self.run(cmd, &self.lp, Some(data)).await?;
        match parse_request_id(&stdout) {
            Some(job_id) => {
                info!(printer = %device, job_id = %job_id, "job submitted");
                Ok(job_id)
            }
            None => {
                warn!(printer = %device, output = %stdout.trim(), "lp returned no request id");
                Err(PrintError::Spool(format!(
                    "unexpected lp output: {}",
                    stdout.trim()
                )))
            }
        }
    }
}

/// Extract `<dest>-<n>` from `request id is <dest>-<n> (1 file(s))`
pub fn parse_request_id(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("request id is ")?;
        rest.split_whitespace().next().map(str::to_string)
    })
}

/// A job captured by [`MemoryQueue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: String,
    pub device: String,
    pub label: String,
    pub data: Vec<u8>,
    pub raw: bool,
}

/// In-process print queue
///
/// Devices are registered explicitly; submitted jobs are kept for
/// inspection. Devices marked as failing reject every job with a spool
/// error.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    devices: Mutex<BTreeSet<String>>,
    failing: Mutex<BTreeSet<String>>,
    jobs: Mutex<Vec<SubmittedJob>>,
    next_id: AtomicU64,
    listing_broken: Mutex<bool>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue with the given devices registered
    pub fn with_devices<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = Self::new();
        for d in devices {
            queue.add_device(d);
        }
        queue
    }

    pub fn add_device(&self, name: impl Into<String>) {
        self.devices.lock().insert(name.into());
    }

    pub fn remove_device(&self, name: &str) {
        self.devices.lock().remove(name);
    }

    /// Make every job to `name` fail at submission
    pub fn fail_device(&self, name: impl Into<String>) {
        self.failing.lock().insert(name.into());
    }

    /// Make `list_devices` fail
    pub fn break_listing(&self) {
        *self.listing_broken.lock() = true;
    }

    /// Jobs submitted so far, in order
    pub fn jobs(&self) -> Vec<SubmittedJob> {
        self.jobs.lock().clone()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().len()
    }
}

#[async_trait]
impl PrintQueue for MemoryQueue {
    async fn list_devices(&self) -> PrintResult<BTreeSet<String>> {
        if *self.listing_broken.lock() {
            return Err(PrintError::Spool("device registry unavailable".to_string()));
        }
        Ok(self.devices.lock().clone())
    }

    async fn submit_job(
        &self,
        data: &[u8],
        device: &str,
        label: &str,
        options: JobOptions,
    ) -> PrintResult<String> {
        if !self.devices.lock().contains(device) {
            return Err(PrintError::DeviceNotFound(device.to_string()));
        }
        if self.failing.lock().contains(device) {
            return Err(PrintError::Spool(format!("{device}: printer jammed")));
        }

        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let job_id = format!("{device}-{n}");
        self.jobs.lock().push(SubmittedJob {
            job_id: job_id.clone(),
            device: device.to_string(),
            label: label.to_string(),
            data: data.to_vec(),
            raw: options.raw,
        });
        Ok(job_id)
    }
}
