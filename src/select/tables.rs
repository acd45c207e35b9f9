use serde::Serialize;

use super::{sorted, with_status};
use crate::cache::CacheState;
use crate::domain::{Table, TableStatus};

pub fn tables_by_status(tables: &CacheState<Table>, status: TableStatus) -> Vec<&Table> {
    sorted(with_status(tables.values(), status))
}

/// Floor summary shown above the table map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableOccupancy {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub seats: u32,
    pub seats_in_use: u32,
    /// Occupied tables over all tables, 0.0 to 1.0.
    pub rate: f64,
}

pub fn table_occupancy(tables: &CacheState<Table>) -> TableOccupancy {
    let mut occupancy = TableOccupancy::default();
    for table in tables.values() {
        occupancy.total += 1;
        occupancy.seats += table.capacity;
        match table.status {
            TableStatus::Available => occupancy.available += 1,
            TableStatus::Occupied => {
                occupancy.occupied += 1;
                occupancy.seats_in_use += table.capacity;
            }
            TableStatus::Reserved => occupancy.reserved += 1,
        }
    }
    if occupancy.total > 0 {
        occupancy.rate = occupancy.occupied as f64 / occupancy.total as f64;
    }
    occupancy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntityCache;
    use chrono::Utc;

    fn table(id: i64, number: u32, capacity: u32, status: TableStatus) -> Table {
        Table {
            id,
            number,
            capacity,
            status,
            current_order_id: None,
            created_at: Utc::now(),
        }
    }

    fn floor() -> EntityCache<Table> {
        let cache = EntityCache::new();
        cache.set_all(vec![
            table(1, 5, 4, TableStatus::Occupied),
            table(2, 1, 2, TableStatus::Available),
            table(3, 3, 6, TableStatus::Occupied),
            table(4, 2, 4, TableStatus::Reserved),
        ]);
        cache
    }

    #[test]
    fn by_status_sorted_by_number() {
        let floor = floor();
        let snap = floor.snapshot();
        let numbers: Vec<u32> = tables_by_status(&snap, TableStatus::Occupied)
            .iter()
            .map(|t| t.number)
            .collect();
        assert_eq!(numbers, vec![3, 5]);
    }

    #[test]
    fn occupancy_counts_tables_and_seats() {
        let occupancy = table_occupancy(&floor().snapshot());
        assert_eq!(occupancy.total, 4);
        assert_eq!(occupancy.occupied, 2);
        assert_eq!(occupancy.reserved, 1);
        assert_eq!(occupancy.seats, 16);
        assert_eq!(occupancy.seats_in_use, 10);
        assert_eq!(occupancy.rate, 0.5);
    }

    #[test]
    fn empty_floor_has_zero_rate() {
        let cache = EntityCache::<Table>::new();
        assert_eq!(table_occupancy(&cache.snapshot()), TableOccupancy::default());
    }
}
