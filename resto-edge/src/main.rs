use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use resto_edge::{
    BillOptions, Config, DocumentKind, InMemoryMenuDirectory, InMemoryOrderStore,
    KitchenTicketLog, PrintService, PrintServiceError, Staff, setup_environment,
};
use resto_printer::{LpSpooler, MemoryQueue, PrintQueue};
use shared::menu::BranchMenu;
use shared::order::Order;

#[derive(Debug, Parser)]
#[command(name = "resto-edge", version, about = "POS bill and kitchen ticket printing")]
struct Cli {
    /// Capture jobs in memory instead of sending them to CUPS
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List spooler devices
    Devices,
    /// Render a document as plain text
    Preview {
        /// Order document (JSON)
        order: PathBuf,
        #[arg(value_enum, default_value_t = Kind::Bill)]
        kind: Kind,
        /// Staff name printed on tickets
        #[arg(long)]
        staff: Option<String>,
    },
    /// Print the bill, then kitchen tickets for pending items
    Print {
        /// Order document (JSON)
        order: PathBuf,
        /// Bill printer
        printer: String,
        #[arg(long)]
        staff: Option<String>,
        /// QR payload printed under the footer
        #[arg(long)]
        qr: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Bill,
    Kitchen,
    Checker,
}

impl From<Kind> for DocumentKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Bill => DocumentKind::Bill,
            Kind::Kitchen => DocumentKind::Kitchen,
            Kind::Checker => DocumentKind::Checker,
        }
    }
}

fn load_order(path: &Path) -> anyhow::Result<Order> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading order {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing order {}", path.display()))
}

fn load_menus(config: &Config) -> anyhow::Result<Vec<BranchMenu>> {
    let Some(path) = &config.menu_file else {
        tracing::warn!("MENU_FILE not set, kitchen tickets will not be routed");
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading menus {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing menus {path}"))
}

/// Devices a dry run should accept: the bill printer and every station printer
fn dry_run_devices(menus: &[BranchMenu], printer: Option<&str>) -> BTreeSet<String> {
    menus
        .iter()
        .flat_map(|m| m.valid_assignments())
        .map(|p| p.printer_name.trim().to_string())
        .chain(printer.map(|p| p.trim().to_string()))
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = setup_environment();

    let menus = load_menus(&config)?;
    let printer = match &cli.command {
        Command::Print { printer, .. } => Some(printer.as_str()),
        _ => None,
    };

    let memory = Arc::new(MemoryQueue::with_devices(dry_run_devices(&menus, printer)));
    let queue: Arc<dyn PrintQueue> = if cli.dry_run {
        memory.clone()
    } else {
        let mut spooler = LpSpooler::new().with_timeout(config.spool_timeout());
        if let Some(server) = &config.cups_server {
            spooler = spooler.with_server(server);
        }
        Arc::new(spooler)
    };

    let log = match &cli.command {
        Command::Print { .. } if !cli.dry_run => {
            std::fs::create_dir_all(&config.work_dir)
                .with_context(|| format!("creating {}", config.work_dir))?;
            KitchenTicketLog::open(config.ticket_log_path())?
        }
        _ => KitchenTicketLog::open_in_memory()?,
    };

    let orders = Arc::new(InMemoryOrderStore::new());
    let service = PrintService::new(
        config.render_config(),
        orders.clone(),
        Arc::new(InMemoryMenuDirectory::new(menus)),
        queue.clone(),
        log,
    );

    match cli.command {
        Command::Devices => {
            for device in queue.list_devices().await? {
                println!("{device}");
            }
        }
        Command::Preview { order, kind, staff } => {
            let order = load_order(&order)?;
            let name = order.name.clone();
            orders.insert(order);
            let staff = staff.map(Staff::new);
            let text = service.preview(&name, kind.into(), staff.as_ref()).await?;
            print!("{text}");
        }
        Command::Print {
            order,
            printer,
            staff,
            qr,
        } => {
            let order = load_order(&order)?;
            let name = order.name.clone();
            orders.insert(order);
            let options = BillOptions {
                qr_data: qr,
                cashier: staff.map(Staff::new),
                ..Default::default()
            };

            let report = match service.print_now(&name, &printer, &options).await {
                Ok(report) => report,
                Err(PrintServiceError::PartialFailure(report)) => {
                    for failed in report.failed_stations() {
                        eprintln!(
                            "kitchen station {} ({}) failed: {}",
                            failed.station,
                            failed.printer,
                            failed.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    *report
                }
                Err(e) => return Err(e.into()),
            };

            println!("bill: {} on {}", report.bill.job_id, report.bill.printer);
            for station in report.kitchen.iter().filter(|s| s.is_ok()) {
                println!(
                    "kitchen {}: {} on {}",
                    station.station,
                    station.job_id.as_deref().unwrap_or("-"),
                    station.printer
                );
            }
            if cli.dry_run {
                println!("dry run: {} job(s) captured", memory.job_count());
            }
        }
    }

    Ok(())
}
