//! Kitchen routing
//!
//! Maps order items to kitchen stations through their branch menu's
//! printer assignments. Gaps in the menu configuration never fail an
//! order: unroutable items are skipped and logged at debug level.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::menu::{BranchMenu, PrinterAssignment};
use shared::order::{KitchenStatus, LineItem, Order};

/// Read access to branch menus
#[async_trait]
pub trait MenuDirectory: Send + Sync {
    /// Branch menu for `menu`, scoped to `branch` when given
    async fn branch_menu(&self, menu: &str, branch: Option<&str>) -> Option<BranchMenu>;
}

/// Branch menus held in memory
#[derive(Debug, Default)]
pub struct InMemoryMenuDirectory {
    menus: RwLock<Vec<BranchMenu>>,
}

impl InMemoryMenuDirectory {
    pub fn new(menus: Vec<BranchMenu>) -> Self {
        Self {
            menus: RwLock::new(menus),
        }
    }

    pub fn insert(&self, menu: BranchMenu) {
        self.menus.write().push(menu);
    }

    pub fn len(&self) -> usize {
        self.menus.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.read().is_empty()
    }
}

#[async_trait]
impl MenuDirectory for InMemoryMenuDirectory {
    async fn branch_menu(&self, menu: &str, branch: Option<&str>) -> Option<BranchMenu> {
        let menus = self.menus.read();
        let matches = |m: &&BranchMenu| m.menu == menu || m.name == menu;

        match branch {
            Some(branch) => menus
                .iter()
                .filter(matches)
                .find(|m| m.branch.as_deref() == Some(branch))
                .cloned(),
            // Unscoped: prefer a record without a branch, else the first one
            None => menus
                .iter()
                .filter(matches)
                .min_by_key(|m| m.branch.is_some())
                .cloned(),
        }
    }
}

/// Which items a routing pass considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingScope {
    /// Active items not yet sent to the kitchen
    #[default]
    Pending,
    /// Every active item (explicit reprint)
    All,
}

impl RoutingScope {
    fn includes(&self, item: &LineItem) -> bool {
        match self {
            RoutingScope::Pending => item.status_kitchen == KitchenStatus::NotSent,
            RoutingScope::All => item.is_active(),
        }
    }
}

/// An item routed to a station
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedItem {
    pub item: LineItem,
    /// Name printed large on the ticket
    pub ticket_name: String,
    pub menu_name: String,
}

/// Items bound for one station printer
#[derive(Debug, Clone, PartialEq)]
pub struct StationGroup {
    pub station: String,
    pub printer_name: String,
    pub items: Vec<RoutedItem>,
}

/// Groups order items by kitchen station
#[derive(Clone)]
pub struct KitchenRouter {
    menus: Arc<dyn MenuDirectory>,
}

impl KitchenRouter {
    pub fn new(menus: Arc<dyn MenuDirectory>) -> Self {
        Self { menus }
    }

    /// Route the items of `order` selected by `scope`
    pub async fn route(&self, order: &Order, scope: RoutingScope) -> Vec<StationGroup> {
        let items: Vec<&LineItem> = order.items.iter().filter(|i| scope.includes(i)).collect();
        self.route_items(order, &items).await
    }

    /// Route an explicit item subset; stations come out sorted by name
    pub async fn route_items(&self, order: &Order, items: &[&LineItem]) -> Vec<StationGroup> {
        let branch = order.branch_ref();
        let mut cache: HashMap<String, Option<BranchMenu>> = HashMap::new();
        let mut groups: BTreeMap<PrinterAssignment, Vec<RoutedItem>> = BTreeMap::new();

        for item in items.iter().filter(|i| i.is_active()) {
            let Some(menu_ref) = item.menu_ref() else {
                tracing::debug!(order_id = %order.name, row_id = %item.row_id, "Item has no menu, not routed");
                continue;
            };

            if !cache.contains_key(menu_ref) {
                let found = self.menus.branch_menu(menu_ref, branch).await;
                if found.is_none() {
                    tracing::debug!(
                        order_id = %order.name,
                        menu = %menu_ref,
                        branch = ?branch,
                        "No branch menu found, item not routed"
                    );
                }
                cache.insert(menu_ref.to_string(), found);
            }
            let Some(menu) = cache.get(menu_ref).and_then(Option::as_ref) else {
                continue;
            };

            let targets: BTreeSet<PrinterAssignment> = menu
                .valid_assignments()
                .map(|p| PrinterAssignment {
                    station: p.station.trim().to_string(),
                    printer_name: p.printer_name.trim().to_string(),
                })
                .collect();
            if targets.is_empty() {
                tracing::debug!(
                    order_id = %order.name,
                    menu = %menu_ref,
                    "Branch menu has no printer assignment, item not routed"
                );
                continue;
            }

            for target in targets {
                groups.entry(target).or_default().push(RoutedItem {
                    item: (*item).clone(),
                    ticket_name: menu.ticket_name().to_string(),
                    menu_name: menu.menu_name.clone(),
                });
            }
        }

        groups
            .into_iter()
            .map(|(target, items)| StationGroup {
                station: target.station,
                printer_name: target.printer_name,
                items,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn assignment(station: &str, printer: &str) -> PrinterAssignment {
        PrinterAssignment {
            station: station.to_string(),
            printer_name: printer.to_string(),
        }
    }

    fn branch_menu(menu: &str, branch: Option<&str>, printers: Vec<PrinterAssignment>) -> BranchMenu {
        BranchMenu {
            name: format!("BM-{menu}"),
            menu: menu.to_string(),
            branch: branch.map(str::to_string),
            menu_name: format!("{menu} full"),
            short_name: Some(menu.to_string()),
            printers,
        }
    }

    fn router(menus: Vec<BranchMenu>) -> KitchenRouter {
        KitchenRouter::new(Arc::new(InMemoryMenuDirectory::new(menus)))
    }

    #[tokio::test]
    async fn test_groups_by_station_sorted() {
        let router = router(vec![
            branch_menu(
                "STEAK",
                Some("Kemang"),
                vec![assignment("Hot Kitchen", "HOT"), assignment("Cold Kitchen", "COLD")],
            ),
            branch_menu("SOUP", Some("Kemang"), vec![assignment("Hot Kitchen", "HOT")]),
        ]);

        let mut order = Order::new("POSINV-0001", "IDR");
        order.branch = Some("Kemang".to_string());
        order.items.push(LineItem::new("r1", "S", "Steak", dec!(1), dec!(90000)).with_menu("STEAK"));
        order.items.push(LineItem::new("r2", "P", "Soup", dec!(2), dec!(30000)).with_menu("SOUP"));

        let groups = router.route(&order, RoutingScope::Pending).await;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].station, "Cold Kitchen");
        assert_eq!(groups[0].items.len(), 1);
        assert_eq!(groups[0].items[0].item.row_id, "r1");
        assert_eq!(groups[1].station, "Hot Kitchen");
        let rows: Vec<_> = groups[1].items.iter().map(|r| r.item.row_id.as_str()).collect();
        assert_eq!(rows, vec!["r1", "r2"]);
    }

    #[tokio::test]
    async fn test_duplicate_assignments_collapse() {
        let router = router(vec![branch_menu(
            "TEA",
            None,
            vec![
                assignment("Bar", "BAR"),
                assignment(" Bar ", "BAR"),
                assignment("", "BAR"),
            ],
        )]);
        let mut order = Order::new("POSINV-0002", "IDR");
        order.items.push(LineItem::new("r1", "T", "Tea", dec!(1), dec!(8000)).with_menu("TEA"));

        let groups = router.route(&order, RoutingScope::All).await;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 1);
        assert_eq!(groups[0].items[0].ticket_name, "TEA");
    }

    #[tokio::test]
    async fn test_gaps_are_skipped() {
        let router = router(vec![
            branch_menu("NOPRINT", None, vec![]),
            branch_menu("OTHER", Some("Senopati"), vec![assignment("Hot Kitchen", "HOT")]),
        ]);
        let mut order = Order::new("POSINV-0003", "IDR");
        order.branch = Some("Kemang".to_string());
        order.items.push(LineItem::new("r1", "A", "No menu", dec!(1), dec!(1)));
        order.items.push(LineItem::new("r2", "B", "Unknown", dec!(1), dec!(1)).with_menu("MISSING"));
        order.items.push(LineItem::new("r3", "C", "No printer", dec!(1), dec!(1)).with_menu("NOPRINT"));
        // another branch's menu is never used for a branch-scoped order
        order.items.push(LineItem::new("r4", "D", "Other branch", dec!(1), dec!(1)).with_menu("OTHER"));

        assert!(router.route(&order, RoutingScope::All).await.is_empty());
    }

    #[tokio::test]
    async fn test_scope_filters_sent_and_voided() {
        let router = router(vec![branch_menu("TEA", None, vec![assignment("Bar", "BAR")])]);
        let mut order = Order::new("POSINV-0004", "IDR");
        let mut sent = LineItem::new("r1", "T", "Tea", dec!(1), dec!(8000)).with_menu("TEA");
        sent.status_kitchen = KitchenStatus::Sent;
        let mut voided = LineItem::new("r2", "T", "Tea", dec!(1), dec!(8000)).with_menu("TEA");
        voided.status_kitchen = KitchenStatus::Voided;
        order.items.extend([sent, voided]);

        assert!(router.route(&order, RoutingScope::Pending).await.is_empty());
        let all = router.route(&order, RoutingScope::All).await;
        assert_eq!(all[0].items.len(), 1);
        assert_eq!(all[0].items[0].item.row_id, "r1");
    }

    #[tokio::test]
    async fn test_unscoped_lookup_prefers_unbranched_record() {
        let directory = InMemoryMenuDirectory::new(vec![
            branch_menu("TEA", Some("Kemang"), vec![assignment("Bar", "BAR-K")]),
            branch_menu("TEA", None, vec![assignment("Bar", "BAR")]),
        ]);
        let found = directory.branch_menu("TEA", None).await.unwrap();
        assert_eq!(found.branch, None);
        let found = directory.branch_menu("BM-TEA", Some("Kemang")).await.unwrap();
        assert_eq!(found.printers[0].printer_name, "BAR-K");
    }
}
