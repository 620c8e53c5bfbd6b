use std::path::PathBuf;
use std::time::Duration;

use resto_printer::Codepage;

use crate::printing::RenderConfig;

/// Paper roll width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperProfile {
    /// 58mm roll, 32 columns
    #[default]
    Mm58,
    /// 80mm roll, 42 columns
    Mm80,
}

impl PaperProfile {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "58" | "58mm" => Some(Self::Mm58),
            "80" | "80mm" => Some(Self::Mm80),
            _ => None,
        }
    }

    /// Characters per line in font A
    pub fn line_width(&self) -> usize {
        match self {
            Self::Mm58 => 32,
            Self::Mm80 => 42,
        }
    }
}

/// Supported explicit line widths
const LINE_WIDTHS: [usize; 2] = [32, 42];

/// Edge print configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/resto/edge | kitchen ticket log location |
/// | PAPER_PROFILE | 58mm | `58mm` (32 cols) or `80mm` (42 cols) |
/// | LINE_WIDTH | from profile | explicit override, 32 or 42 |
/// | ITEM_HEIGHT_MULT | 1 | kitchen item height multiplier (0-7) |
/// | FEED_LINES | 5 | feed before cut (4-8) |
/// | DEFAULT_CURRENCY | IDR | currency for orders that carry none |
/// | CODEPAGE | ascii | `ascii` or `cp1252` |
/// | RECEIPT_FOOTER | Terima kasih! | bill footer |
/// | LOGO_PATH | - | logo printed on bills |
/// | SPOOL_TIMEOUT_MS | 10000 | spooler command timeout |
/// | CUPS_SERVER | - | remote CUPS scheduler |
/// | PRINT_QUEUE_CAPACITY | 64 | async bill queue size |
/// | MENU_FILE | - | branch menu JSON (CLI) |
/// | LOG_LEVEL | info | log level |
/// | LOG_DIR | - | daily rolling log directory |
///
/// # Example
///
/// ```ignore
/// PAPER_PROFILE=80mm CODEPAGE=cp1252 resto-edge preview order.json
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub paper_profile: PaperProfile,
    pub line_width: usize,
    pub item_height_mult: u8,
    pub feed_lines: u32,
    pub default_currency: String,
    pub codepage: Codepage,
    pub receipt_footer: String,
    pub logo_path: Option<String>,
    pub spool_timeout_ms: u64,
    pub cups_server: Option<String>,
    pub print_queue_capacity: usize,
    pub menu_file: Option<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let paper_profile = non_empty("PAPER_PROFILE")
            .and_then(|p| {
                let parsed = PaperProfile::parse(&p);
                if parsed.is_none() {
                    tracing::warn!(value = %p, "Unknown PAPER_PROFILE, using 58mm");
                }
                parsed
            })
            .unwrap_or_default();

        let line_width = non_empty("LINE_WIDTH")
            .and_then(|w| w.parse::<usize>().ok())
            .filter(|w| {
                let ok = LINE_WIDTHS.contains(w);
                if !ok {
                    tracing::warn!(line_width = w, "LINE_WIDTH must be 32 or 42, ignoring");
                }
                ok
            })
            .unwrap_or_else(|| paper_profile.line_width());

        let codepage = non_empty("CODEPAGE")
            .and_then(|c| match c.parse::<Codepage>() {
                Ok(cp) => Some(cp),
                Err(e) => {
                    tracing::warn!(error = %e, "Falling back to ascii codepage");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            work_dir: non_empty("WORK_DIR").unwrap_or_else(|| "/var/lib/resto/edge".into()),
            paper_profile,
            line_width,
            item_height_mult: non_empty("ITEM_HEIGHT_MULT")
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(1)
                .min(7),
            feed_lines: non_empty("FEED_LINES")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(5)
                .clamp(4, 8),
            default_currency: non_empty("DEFAULT_CURRENCY").unwrap_or_else(|| "IDR".into()),
            codepage,
            receipt_footer: non_empty("RECEIPT_FOOTER").unwrap_or_else(|| "Terima kasih!".into()),
            logo_path: non_empty("LOGO_PATH"),
            spool_timeout_ms: non_empty("SPOOL_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10000),
            cups_server: non_empty("CUPS_SERVER"),
            print_queue_capacity: non_empty("PRINT_QUEUE_CAPACITY")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(64)
                .max(1),
            menu_file: non_empty("MENU_FILE"),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: non_empty("LOG_DIR"),
        }
    }

    /// Kitchen ticket log database file
    pub fn ticket_log_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("kitchen_tickets.redb")
    }

    pub fn spool_timeout(&self) -> Duration {
        Duration::from_millis(self.spool_timeout_ms)
    }

    /// Layout settings for the document assemblers
    ///
    /// A logo that fails to load is logged and skipped.
    pub fn render_config(&self) -> RenderConfig {
        let config = RenderConfig {
            line_width: self.line_width,
            item_height_mult: self.item_height_mult,
            feed_lines: self.feed_lines,
            footer: self.receipt_footer.clone(),
            default_currency: self.default_currency.clone(),
            codepage: self.codepage,
            logo: None,
        };
        self.attach_logo(config)
    }

    #[cfg(feature = "logo")]
    fn attach_logo(&self, config: RenderConfig) -> RenderConfig {
        let Some(path) = &self.logo_path else {
            return config;
        };
        match resto_printer::Raster::load(path, resto_printer::DEFAULT_MAX_DOTS) {
            Ok(raster) => config.with_logo(raster),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Logo not loaded");
                config
            }
        }
    }

    #[cfg(not(feature = "logo"))]
    fn attach_logo(&self, config: RenderConfig) -> RenderConfig {
        if self.logo_path.is_some() {
            tracing::warn!("LOGO_PATH set but logo support is not compiled in");
        }
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
