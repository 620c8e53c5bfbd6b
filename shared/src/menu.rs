//! Menu → kitchen station routing records
//!
//! Supplied by the menu catalogue; this workspace only reads them.

use serde::{Deserialize, Serialize};

/// One station/printer pair attached to a branch menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrinterAssignment {
    /// Kitchen station (e.g. "Hot Kitchen")
    pub station: String,
    /// Spooler device name the station prints to
    pub printer_name: String,
}

/// Branch-scoped sellable menu entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BranchMenu {
    /// Record name
    pub name: String,
    /// Menu identifier referenced by order items
    pub menu: String,
    /// Owning branch (None = not branch-scoped)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Full menu name
    pub menu_name: String,
    /// Short name printed on kitchen tickets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Station assignments
    #[serde(default)]
    pub printers: Vec<PrinterAssignment>,
}

impl BranchMenu {
    /// Name to print on a kitchen ticket: short name when set, else menu name
    pub fn ticket_name(&self) -> &str {
        self.short_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.menu_name)
    }

    /// Assignments with both station and printer filled in
    pub fn valid_assignments(&self) -> impl Iterator<Item = &PrinterAssignment> {
        self.printers
            .iter()
            .filter(|p| !p.station.trim().is_empty() && !p.printer_name.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(short: Option<&str>) -> BranchMenu {
        BranchMenu {
            name: "BM-0001".to_string(),
            menu: "Nasi Goreng Spesial".to_string(),
            branch: Some("Jakarta".to_string()),
            menu_name: "Nasi Goreng Spesial".to_string(),
            short_name: short.map(str::to_string),
            printers: vec![
                PrinterAssignment {
                    station: "Hot Kitchen".to_string(),
                    printer_name: "HOTKITCHEN".to_string(),
                },
                PrinterAssignment {
                    station: "".to_string(),
                    printer_name: "ORPHAN".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_ticket_name_prefers_short_name() {
        assert_eq!(menu(Some("NGS")).ticket_name(), "NGS");
        assert_eq!(menu(Some("  ")).ticket_name(), "Nasi Goreng Spesial");
        assert_eq!(menu(None).ticket_name(), "Nasi Goreng Spesial");
    }

    #[test]
    fn test_valid_assignments_skip_blank_station() {
        let m = menu(None);
        let valid: Vec<_> = m.valid_assignments().collect();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].printer_name, "HOTKITCHEN");
    }
}
