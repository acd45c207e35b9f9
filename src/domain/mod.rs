//! Restaurant domain records.
//!
//! | Module        | Records                            | Id      | Delete |
//! |---------------|------------------------------------|---------|--------|
//! | `orders`      | `Order`, `OrderLine`               | `i64`   | hard   |
//! | `customers`   | `Customer`                         | `i64`   | hard   |
//! | `employees`   | `Employee`                         | `Uuid`  | hard   |
//! | `menu`        | `MenuItem`, `Category`, `Combo`    | `i64`   | soft for items and combos |
//! | `assignments` | `Assignment` (delivery hand-off)   | `i64`   | hard   |
//! | `tables`      | `Table`                            | `i64`   | hard   |
//! | `addresses`   | `Address`                          | `i64`   | hard   |
//!
//! Each record comes with a `*Draft` (create payload), a `*Patch` (partial
//! update, only `Some` fields change) and a `*Filter` (filtered loads).

use std::cmp::Ordering;

pub mod addresses;
pub mod assignments;
pub mod customers;
pub mod employees;
pub mod menu;
pub mod orders;
pub mod tables;

pub use addresses::{Address, AddressDraft, AddressFilter, AddressPatch};
pub use assignments::{
    Assignment, AssignmentDraft, AssignmentFilter, AssignmentPatch, AssignmentStatus,
};
pub use customers::{Customer, CustomerDraft, CustomerFilter, CustomerPatch};
pub use employees::{Employee, EmployeeDraft, EmployeeFilter, EmployeePatch, EmployeeRole};
pub use menu::{
    Category, CategoryDraft, CategoryPatch, Combo, ComboDraft, ComboFilter, ComboPatch, MenuItem,
    MenuItemDraft, MenuItemFilter, MenuItemPatch,
};
pub use orders::{Order, OrderDraft, OrderFilter, OrderLine, OrderPatch, OrderStatus, OrderType};
pub use tables::{Table, TableDraft, TableFilter, TablePatch, TableStatus};

/// Case-insensitive name comparison used by alphabetical listings.
pub(crate) fn cmp_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmp_names_ignores_case() {
        assert_eq!(cmp_names("apple", "Banana"), Ordering::Less);
        assert_eq!(cmp_names("Soup", "soup"), Ordering::Equal);
    }
}
