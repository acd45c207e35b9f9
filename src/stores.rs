//! Composition root.
//!
//! [`Gateways`] carries one injected gateway per domain; [`Stores`] wraps each
//! in its own [`SyncController`]. Nothing here is global: build as many
//! independent `Stores` as needed (one per test, one per process).

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{AuthController, Credentials};
use crate::domain::{
    Address, Assignment, Category, Combo, Customer, Employee, EmployeeDraft, MenuItem, Order,
    Table,
};
use crate::entity::{Domain, Entity};
use crate::errors::{HireError, SyncError};
use crate::gateway::{Gateway, Materialize, MemoryGateway};
use crate::snapshot::RestaurantSnapshot;
use crate::sync::{ResponseOrdering, SyncController, SyncSubscription};
use crate::validate::Validate;

pub struct Gateways {
    pub orders: Arc<dyn Gateway<Order>>,
    pub customers: Arc<dyn Gateway<Customer>>,
    pub employees: Arc<dyn Gateway<Employee>>,
    pub menu_items: Arc<dyn Gateway<MenuItem>>,
    pub categories: Arc<dyn Gateway<Category>>,
    pub combos: Arc<dyn Gateway<Combo>>,
    pub assignments: Arc<dyn Gateway<Assignment>>,
    pub tables: Arc<dyn Gateway<Table>>,
    pub addresses: Arc<dyn Gateway<Address>>,
}

fn seeded<E: Materialize>(records: Vec<E>) -> Arc<dyn Gateway<E>> {
    Arc::new(MemoryGateway::with_records(records))
}

impl Gateways {
    /// Empty in-process gateways.
    pub fn in_memory() -> Self {
        Self::from_snapshot(RestaurantSnapshot::default())
    }

    /// In-process gateways seeded from a snapshot.
    pub fn from_snapshot(snapshot: RestaurantSnapshot) -> Self {
        Self {
            orders: seeded(snapshot.orders),
            customers: seeded(snapshot.customers),
            employees: seeded(snapshot.employees),
            menu_items: seeded(snapshot.menu_items),
            categories: seeded(snapshot.categories),
            combos: seeded(snapshot.combos),
            assignments: seeded(snapshot.assignments),
            tables: seeded(snapshot.tables),
            addresses: seeded(snapshot.addresses),
        }
    }
}

/// Outcome of [`Stores::load_all`]. Domains load independently.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: Vec<(Domain, usize)>,
    pub failed: Vec<SyncError>,
}

impl LoadSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.loaded.iter().map(|(_, n)| n).sum()
    }

    fn record<E: Entity>(&mut self, result: Result<usize, SyncError>) {
        match result {
            Ok(count) => self.loaded.push((E::DOMAIN, count)),
            Err(err) => self.failed.push(err),
        }
    }
}

/// Change-feed subscriptions for several domains; dropping it cancels all.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<SyncSubscription>,
}

impl SubscriptionSet {
    pub fn push(&mut self, subscription: SyncSubscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn domains(&self) -> Vec<Domain> {
        self.subscriptions.iter().map(|s| s.domain()).collect()
    }

    /// Cancel every subscription in the set.
    pub fn cancel_all(self) {
        for subscription in self.subscriptions {
            subscription.cancel();
        }
    }
}

/// One controller (and so one cache) per domain.
#[derive(Clone)]
pub struct Stores {
    pub orders: SyncController<Order>,
    pub customers: SyncController<Customer>,
    pub employees: SyncController<Employee>,
    pub menu_items: SyncController<MenuItem>,
    pub categories: SyncController<Category>,
    pub combos: SyncController<Combo>,
    pub assignments: SyncController<Assignment>,
    pub tables: SyncController<Table>,
    pub addresses: SyncController<Address>,
}

impl Stores {
    pub fn new(gateways: Gateways, ordering: ResponseOrdering) -> Self {
        Self {
            orders: SyncController::with_ordering(gateways.orders, ordering),
            customers: SyncController::with_ordering(gateways.customers, ordering),
            employees: SyncController::with_ordering(gateways.employees, ordering),
            menu_items: SyncController::with_ordering(gateways.menu_items, ordering),
            categories: SyncController::with_ordering(gateways.categories, ordering),
            combos: SyncController::with_ordering(gateways.combos, ordering),
            assignments: SyncController::with_ordering(gateways.assignments, ordering),
            tables: SyncController::with_ordering(gateways.tables, ordering),
            addresses: SyncController::with_ordering(gateways.addresses, ordering),
        }
    }

    pub fn in_memory(ordering: ResponseOrdering) -> Self {
        Self::new(Gateways::in_memory(), ordering)
    }

    pub fn from_snapshot(snapshot: RestaurantSnapshot, ordering: ResponseOrdering) -> Self {
        Self::new(Gateways::from_snapshot(snapshot), ordering)
    }

    /// Load every domain concurrently. A failing domain does not stop the others.
    pub async fn load_all(&self) -> LoadSummary {
        let (
            orders,
            customers,
            employees,
            menu_items,
            categories,
            combos,
            assignments,
            tables,
            addresses,
        ) = futures::join!(
            self.orders.load(),
            self.customers.load(),
            self.employees.load(),
            self.menu_items.load(),
            self.categories.load(),
            self.combos.load(),
            self.assignments.load(),
            self.tables.load(),
            self.addresses.load(),
        );

        let mut summary = LoadSummary::default();
        summary.record::<Order>(orders);
        summary.record::<Customer>(customers);
        summary.record::<Employee>(employees);
        summary.record::<MenuItem>(menu_items);
        summary.record::<Category>(categories);
        summary.record::<Combo>(combos);
        summary.record::<Assignment>(assignments);
        summary.record::<Table>(tables);
        summary.record::<Address>(addresses);

        if summary.is_complete() {
            info!(records = summary.record_count(), "all domains loaded");
        } else {
            warn!(failed = summary.failed.len(), "some domains failed to load");
        }
        summary
    }

    /// Subscribe every domain except addresses, which are subscribed per
    /// customer through `addresses.subscribe_filtered`.
    pub async fn subscribe_all(&self) -> Result<SubscriptionSet, SyncError> {
        let mut set = SubscriptionSet::default();
        set.push(self.orders.subscribe().await?);
        set.push(self.customers.subscribe().await?);
        set.push(self.employees.subscribe().await?);
        set.push(self.menu_items.subscribe().await?);
        set.push(self.categories.subscribe().await?);
        set.push(self.combos.subscribe().await?);
        set.push(self.assignments.subscribe().await?);
        set.push(self.tables.subscribe().await?);
        info!(domains = set.len(), "subscribed to change feeds");
        Ok(set)
    }

    /// Create the staff account (with sign-up backoff), then the employee
    /// record bound to the new user id.
    ///
    /// `auth` stays signed in as the caller. If the record cannot be saved the
    /// account already exists; the error carries no rollback.
    pub async fn hire_employee(
        &self,
        auth: &AuthController,
        credentials: &Credentials,
        mut draft: EmployeeDraft,
    ) -> Result<Employee, HireError> {
        draft.validate()?;
        credentials.validate()?;
        let account = auth.create_account(credentials).await?;
        draft.user_id = Some(account.user_id);
        let employee = self.employees.create(draft).await.inspect_err(|e| {
            warn!(
                user_id = %account.user_id,
                email = %account.email,
                error = %e,
                "account created without an employee record"
            );
        })?;
        info!(employee = %employee.id, role = %employee.role, "employee hired");
        Ok(employee)
    }

    /// What the caches currently hold, as a snapshot.
    pub fn export(&self) -> RestaurantSnapshot {
        fn records<E: Entity>(controller: &SyncController<E>) -> Vec<E> {
            controller.snapshot().sorted().into_iter().cloned().collect()
        }
        RestaurantSnapshot {
            orders: records(&self.orders),
            customers: records(&self.customers),
            employees: records(&self.employees),
            menu_items: records(&self.menu_items),
            categories: records(&self.categories),
            combos: records(&self.combos),
            assignments: records(&self.assignments),
            tables: records(&self.tables),
            addresses: records(&self.addresses),
        }
    }
}
