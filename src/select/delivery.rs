use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{lookup_or, sorted};
use crate::cache::CacheState;
use crate::domain::{Address, Assignment, AssignmentStatus, Customer, Employee};

/// One line of the delivery board, with every reference resolved to text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRow {
    pub assignment_id: i64,
    pub order_id: i64,
    pub status: AssignmentStatus,
    pub customer: String,
    pub courier: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl DeliveryRow {
    /// Still on the road or waiting for pickup.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            AssignmentStatus::Assigned | AssignmentStatus::InTransit
        )
    }
}

/// Assignments joined with customer, courier and address, newest first.
///
/// Missing references render as `"N/A"`; the join never fails.
pub fn delivery_board(
    assignments: &CacheState<Assignment>,
    customers: &CacheState<Customer>,
    employees: &CacheState<Employee>,
    addresses: &CacheState<Address>,
) -> Vec<DeliveryRow> {
    sorted(assignments.values())
        .into_iter()
        .map(|a| DeliveryRow {
            assignment_id: a.id,
            order_id: a.order_id,
            status: a.status,
            customer: lookup_or(customers, Some(&a.customer_id), |c| c.name.clone()),
            courier: lookup_or(employees, Some(&a.delivery_person_id), |e| e.name.clone()),
            address: lookup_or(addresses, a.address_id.as_ref(), Address::label),
            created_at: a.created_at,
        })
        .collect()
}

/// A customer's saved addresses, default first.
pub fn customer_addresses(addresses: &CacheState<Address>, customer_id: i64) -> Vec<&Address> {
    sorted(addresses.values().filter(|a| a.customer_id == customer_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntityCache;
    use crate::domain::EmployeeRole;
    use crate::select::NOT_AVAILABLE;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, h, 0, 0).unwrap()
    }

    fn assignment(id: i64, customer_id: i64, courier: Uuid, address_id: Option<i64>) -> Assignment {
        Assignment {
            id,
            order_id: id * 10,
            customer_id,
            delivery_person_id: courier,
            address_id,
            status: AssignmentStatus::Assigned,
            created_at: at(10 + id as u32),
            delivered_at: None,
        }
    }

    fn customer(id: i64, name: &str) -> Customer {
        Customer {
            id,
            name: name.into(),
            phone: "999".into(),
            email: None,
            notes: None,
            created_at: at(8),
        }
    }

    fn address(id: i64, customer_id: i64, street: &str, is_default: bool) -> Address {
        Address {
            id,
            customer_id,
            street: street.into(),
            city: "Lima".into(),
            reference: None,
            is_default,
            created_at: at(8),
        }
    }

    fn courier(id: Uuid, name: &str) -> Employee {
        Employee {
            id,
            user_id: None,
            name: name.into(),
            email: "rider@example.com".into(),
            role: EmployeeRole::Delivery,
            active: true,
            created_at: at(8),
        }
    }

    #[test]
    fn board_resolves_references() {
        let rider = Uuid::new_v4();
        let assignments = EntityCache::new();
        assignments.set_all(vec![assignment(1, 7, rider, Some(3))]);
        let customers = EntityCache::new();
        customers.set_all(vec![customer(7, "Lucía")]);
        let employees = EntityCache::new();
        employees.set_all(vec![courier(rider, "Mateo")]);
        let addresses = EntityCache::new();
        addresses.set_all(vec![address(3, 7, "Av. Pardo 500", true)]);

        let board = delivery_board(
            &assignments.snapshot(),
            &customers.snapshot(),
            &employees.snapshot(),
            &addresses.snapshot(),
        );

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].customer, "Lucía");
        assert_eq!(board[0].courier, "Mateo");
        assert_eq!(board[0].address, "Av. Pardo 500, Lima");
        assert!(board[0].is_active());
    }

    #[test]
    fn missing_customer_renders_sentinel() {
        let assignments = EntityCache::new();
        assignments.set_all(vec![
            assignment(1, 404, Uuid::new_v4(), None),
            assignment(2, 7, Uuid::new_v4(), Some(99)),
        ]);
        let customers = EntityCache::new();
        customers.set_all(vec![customer(7, "Lucía")]);
        let employees = EntityCache::<Employee>::new();
        let addresses = EntityCache::<Address>::new();

        let board = delivery_board(
            &assignments.snapshot(),
            &customers.snapshot(),
            &employees.snapshot(),
            &addresses.snapshot(),
        );

        // Newest first.
        assert_eq!(board[0].assignment_id, 2);
        assert_eq!(board[0].customer, "Lucía");
        assert_eq!(board[0].address, NOT_AVAILABLE);
        assert_eq!(board[1].customer, NOT_AVAILABLE);
        assert_eq!(board[1].courier, NOT_AVAILABLE);
        assert_eq!(board[1].address, NOT_AVAILABLE);
    }

    #[test]
    fn customer_addresses_default_first() {
        let addresses = EntityCache::new();
        addresses.set_all(vec![
            address(1, 7, "Jr. Ucayali 12", false),
            address(2, 8, "Av. Grau 1", true),
            address(3, 7, "Calle Colón 3", true),
        ]);
        let snap = addresses.snapshot();
        let streets: Vec<&str> = customer_addresses(&snap, 7)
            .iter()
            .map(|a| a.street.as_str())
            .collect();
        assert_eq!(streets, vec!["Calle Colón 3", "Jr. Ucayali 12"]);
    }
}
