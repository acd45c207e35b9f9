//! Derived view selectors.
//!
//! Pure projections over cache snapshots. Nothing here mutates a cache, keeps
//! state between calls, or reads the clock except the `*_today` helpers.
//! Cross-domain joins look ids up in a second snapshot and fall back to
//! [`NOT_AVAILABLE`] when the referenced record is not cached.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::cache::CacheState;
use crate::domain::{
    Address, Assignment, AssignmentStatus, Category, Combo, Customer, Employee, MenuItem, Order,
    OrderStatus, Table, TableStatus,
};
use crate::entity::Entity;

pub mod delivery;
pub mod menu;
pub mod orders;
pub mod tables;

pub use delivery::{DeliveryRow, customer_addresses, delivery_board};
pub use menu::{MenuSection, available_combos, available_menu, combo_contents, menu_by_category};
pub use orders::{
    DailyIncome, OrderStats, income_by_day, kitchen_queue, order_stats, stats_on, today_stats,
};
pub use tables::{TableOccupancy, table_occupancy, tables_by_status};

/// Rendered in place of a reference that is missing from its cache.
pub const NOT_AVAILABLE: &str = "N/A";

/// Records with a creation timestamp.
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

/// Records with a single status enum.
pub trait HasStatus {
    type Status: Copy + Eq;

    fn status(&self) -> Self::Status;
}

macro_rules! timestamped {
    ($($ty:ty),* $(,)?) => {
        $(impl Timestamped for $ty {
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        })*
    };
}

timestamped!(Order, Customer, Employee, MenuItem, Category, Combo, Table, Assignment, Address);

impl HasStatus for Order {
    type Status = OrderStatus;

    fn status(&self) -> OrderStatus {
        self.status
    }
}

impl HasStatus for Table {
    type Status = TableStatus;

    fn status(&self) -> TableStatus {
        self.status
    }
}

impl HasStatus for Assignment {
    type Status = AssignmentStatus;

    fn status(&self) -> AssignmentStatus {
        self.status
    }
}

/// Calendar day of `at` in `tz`.
pub fn local_day<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Today's date in `tz`.
pub fn today<Tz: TimeZone>(tz: &Tz) -> NaiveDate {
    local_day(Utc::now(), tz)
}

/// Records whose creation falls on `day` (midnight to midnight in `tz`, inclusive).
pub fn created_on<'a, E, Tz>(
    records: impl IntoIterator<Item = &'a E>,
    day: NaiveDate,
    tz: &Tz,
) -> Vec<&'a E>
where
    E: Timestamped + 'a,
    Tz: TimeZone,
{
    records
        .into_iter()
        .filter(|r| local_day(r.created_at(), tz) == day)
        .collect()
}

pub fn created_today<'a, E, Tz>(records: impl IntoIterator<Item = &'a E>, tz: &Tz) -> Vec<&'a E>
where
    E: Timestamped + 'a,
    Tz: TimeZone,
{
    created_on(records, today(tz), tz)
}

pub fn with_status<'a, E>(records: impl IntoIterator<Item = &'a E>, status: E::Status) -> Vec<&'a E>
where
    E: HasStatus + 'a,
{
    records
        .into_iter()
        .filter(|r| r.status() == status)
        .collect()
}

/// Records in their domain's display order.
pub fn sorted<'a, E: Entity>(records: impl IntoIterator<Item = &'a E>) -> Vec<&'a E> {
    let mut records: Vec<&E> = records.into_iter().collect();
    records.sort_by(|a, b| E::display_order(a, b));
    records
}

/// Join helper: project the record at `id`, or [`NOT_AVAILABLE`].
pub fn lookup_or<E: Entity>(
    state: &CacheState<E>,
    id: Option<&E::Id>,
    project: impl FnOnce(&E) -> String,
) -> String {
    id.and_then(|id| state.get(id))
        .map(project)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::domain::{Order, OrderLine, OrderStatus, OrderType};

    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    pub fn order(id: i64, total: f64, status: OrderStatus, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            customer_id: None,
            table_id: Some(1),
            order_type: OrderType::DineIn,
            status,
            items: vec![OrderLine {
                menu_item_id: 1,
                name: "Lomo saltado".into(),
                quantity: 1,
                unit_price: total,
            }],
            total,
            notes: None,
            created_at,
            updated_at: created_at,
        }
    }
}
