//! Whole-restaurant JSON snapshot.
//!
//! Used to seed in-memory gateways (the `report` command, demos, tests) and to
//! export what the caches currently hold. Every section is optional in the file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Address, Assignment, Category, Combo, Customer, Employee, MenuItem, Order, Table,
};
use crate::entity::Domain;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSnapshot {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub combos: Vec<Combo>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl RestaurantSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid snapshot {}", path.display()))
    }

    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse snapshot JSON")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create directory {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))
    }

    /// Record count per domain, in [`Domain::ALL`] order.
    pub fn counts(&self) -> Vec<(Domain, usize)> {
        Domain::ALL
            .into_iter()
            .map(|domain| {
                let count = match domain {
                    Domain::Orders => self.orders.len(),
                    Domain::Customers => self.customers.len(),
                    Domain::Employees => self.employees.len(),
                    Domain::MenuItems => self.menu_items.len(),
                    Domain::Categories => self.categories.len(),
                    Domain::Combos => self.combos.len(),
                    Domain::Assignments => self.assignments.len(),
                    Domain::Tables => self.tables.len(),
                    Domain::Addresses => self.addresses.len(),
                };
                (domain, count)
            })
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.counts().iter().map(|(_, n)| n).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PARTIAL: &str = r#"{
        "categories": [
            {"id": 1, "name": "Entradas", "created_at": "2026-05-04T12:00:00Z"}
        ],
        "tables": [
            {"id": 1, "number": 1, "capacity": 4, "status": "occupied",
             "current_order_id": 10, "created_at": "2026-05-04T12:00:00Z"}
        ]
    }"#;

    #[test]
    fn missing_sections_default_to_empty() {
        let snapshot = RestaurantSnapshot::parse(PARTIAL).unwrap();
        assert_eq!(snapshot.categories.len(), 1);
        assert_eq!(snapshot.tables[0].current_order_id, Some(10));
        assert!(snapshot.orders.is_empty());
        assert_eq!(snapshot.record_count(), 2);
    }

    #[test]
    fn counts_follow_domain_order() {
        let snapshot = RestaurantSnapshot::parse(PARTIAL).unwrap();
        let counts = snapshot.counts();
        assert_eq!(counts.len(), 9);
        assert_eq!(counts[0], (Domain::Orders, 0));
        assert!(counts.contains(&(Domain::Tables, 1)));
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exports").join("snapshot.json");
        let snapshot = RestaurantSnapshot::parse(PARTIAL).unwrap();

        snapshot.save(&path).unwrap();
        let loaded = RestaurantSnapshot::load(&path).unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn load_reports_path_on_bad_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = RestaurantSnapshot::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }

    #[test]
    fn load_missing_file_fails() {
        let err = RestaurantSnapshot::load(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot"));
    }
}
