//! # resto-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building and stripping (previews)
//! - Fixed-width text layout and money formatting
//! - Single-byte code page encoding (ASCII, Windows-1252)
//! - Logo rasterization (feature `image`)
//! - Raw job submission through a print queue (CUPS `lp`, in-memory)
//!
//! Business logic (WHAT to print) stays in the edge service:
//! bills, kitchen tickets and checker tickets are assembled there.
//!
//! ## Example
//!
//! ```ignore
//! use resto_printer::{EscPosBuilder, JobOptions, LpSpooler, PrintQueue};
//!
//! let mut builder = EscPosBuilder::new(32);
//! builder.center().bold().line("KITCHEN ORDER - Bar").bold_off();
//! builder.left().line_lr("Invoice", "POSINV-0001");
//! builder.feed(5).cut();
//!
//! let spooler = LpSpooler::new();
//! let job_id = spooler
//!     .submit_job(&builder.build(), "BAR", "KITCHEN_Bar", JobOptions::default())
//!     .await?;
//! ```

mod encoding;
mod error;
mod escpos;
pub mod layout;
mod raster;
mod spooler;

// Re-exports
pub use encoding::{Codepage, decode_text, encode_text};
pub use error::{PrintError, PrintResult};
pub use escpos::{Align, EscPosBuilder, Font, QR_MAX_BYTES, strip_commands};
pub use raster::{DEFAULT_MAX_DOTS, Raster};
pub use spooler::{
    DEFAULT_SPOOL_TIMEOUT, JobOptions, LpSpooler, MemoryQueue, PrintQueue, SubmittedJob,
    parse_request_id,
};
