//! Orders taken at the tables, at the counter (pickup) or for delivery.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Criteria, Domain, Entity, Patch};
use crate::errors::ValidationError;
use crate::gateway::memory::Materialize;
use crate::validate::{Validate, require_positive};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Orders the kitchen still has to work on.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Preparing)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Pickup,
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DineIn => "dine_in",
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dine_in" => Ok(Self::DineIn),
            "pickup" => Ok(Self::Pickup),
            "delivery" => Ok(Self::Delivery),
            _ => Err(format!("Invalid order type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderLine {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

fn lines_total(items: &[OrderLine]) -> f64 {
    items.iter().map(OrderLine::subtotal).sum()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub table_id: Option<i64>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub total: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_id: Option<i64>,
    pub table_id: Option<i64>,
    pub order_type: OrderType,
    pub items: Vec<OrderLine>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Patch<Order> for OrderPatch {
    fn apply_to(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(items) = &self.items {
            order.items = items.clone();
            order.total = lines_total(items);
        }
        if let Some(total) = self.total {
            order.total = total;
        }
        if let Some(notes) = &self.notes {
            order.notes = Some(notes.clone());
        }
        if let Some(table_id) = self.table_id {
            order.table_id = Some(table_id);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub customer_id: Option<i64>,
    pub created_since: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn by_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Criteria<Order> for OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| order.status == s)
            && self.order_type.is_none_or(|t| order.order_type == t)
            && self.customer_id.is_none_or(|c| order.customer_id == Some(c))
            && self.created_since.is_none_or(|since| order.created_at >= since)
    }
}

impl Entity for Order {
    type Id = i64;
    type Draft = OrderDraft;
    type Patch = OrderPatch;
    type Filter = OrderFilter;

    const DOMAIN: Domain = Domain::Orders;

    fn id(&self) -> &i64 {
        &self.id
    }

    /// Newest first.
    fn display_order(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

impl Materialize for Order {
    fn materialize(draft: OrderDraft, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: seq as i64,
            customer_id: draft.customer_id,
            table_id: draft.table_id,
            order_type: draft.order_type,
            status: OrderStatus::Pending,
            total: lines_total(&draft.items),
            items: draft.items,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(self.id).ok()
    }
}

impl Validate for OrderDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::new("items", "an order needs at least one item"));
        }
        for line in &self.items {
            if line.quantity == 0 {
                return Err(ValidationError::new("items", format!("{} has quantity 0", line.name)));
            }
            require_positive("items", line.unit_price)?;
        }
        match self.order_type {
            OrderType::DineIn if self.table_id.is_none() => {
                Err(ValidationError::new("table_id", "dine-in orders need a table"))
            }
            OrderType::Delivery if self.customer_id.is_none() => Err(ValidationError::new(
                "customer_id",
                "delivery orders need a customer",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(price: f64, quantity: u32) -> OrderLine {
        OrderLine {
            menu_item_id: 1,
            name: "Ceviche".to_string(),
            quantity,
            unit_price: price,
        }
    }

    fn order(id: i64, status: OrderStatus) -> Order {
        let at = Utc.with_ymd_and_hms(2026, 5, 4, 13, 0, 0).unwrap();
        Order {
            id,
            customer_id: Some(7),
            table_id: None,
            order_type: OrderType::Pickup,
            status,
            items: vec![line(10.0, 2)],
            total: 20.0,
            notes: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn status_round_trips() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("served".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_type_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&OrderType::DineIn).unwrap(), "\"dine_in\"");
    }

    #[test]
    fn patch_items_recomputes_total() {
        let mut o = order(1, OrderStatus::Pending);
        let patch = OrderPatch {
            items: Some(vec![line(12.5, 2), line(5.0, 1)]),
            ..Default::default()
        };
        patch.apply_to(&mut o);
        assert_eq!(o.total, 30.0);
        assert_eq!(o.status, OrderStatus::Pending);
    }

    #[test]
    fn patch_status_only_touches_status() {
        let mut o = order(1, OrderStatus::Pending);
        OrderPatch::status(OrderStatus::Preparing).apply_to(&mut o);
        assert_eq!(o.status, OrderStatus::Preparing);
        assert_eq!(o.total, 20.0);
    }

    #[test]
    fn filter_combines_fields() {
        let o = order(1, OrderStatus::Ready);
        assert!(OrderFilter::by_status(OrderStatus::Ready).matches(&o));
        assert!(!OrderFilter::by_status(OrderStatus::Pending).matches(&o));
        let filter = OrderFilter {
            customer_id: Some(8),
            ..Default::default()
        };
        assert!(!filter.matches(&o));
    }

    #[test]
    fn materialize_starts_pending_with_line_total() {
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
        let draft = OrderDraft {
            customer_id: None,
            table_id: Some(3),
            order_type: OrderType::DineIn,
            items: vec![line(8.0, 3)],
            notes: None,
        };
        let o = Order::materialize(draft, 17, now);
        assert_eq!(o.id, 17);
        assert_eq!(o.status, OrderStatus::Pending);
        assert_eq!(o.total, 24.0);
        assert_eq!(o.created_at, now);
    }

    #[test]
    fn delivery_draft_requires_customer() {
        let draft = OrderDraft {
            customer_id: None,
            table_id: None,
            order_type: OrderType::Delivery,
            items: vec![line(8.0, 1)],
            notes: None,
        };
        assert_eq!(draft.validate().unwrap_err().field, "customer_id");
    }

    #[test]
    fn empty_draft_is_rejected() {
        let draft = OrderDraft {
            customer_id: None,
            table_id: None,
            order_type: OrderType::Pickup,
            items: vec![],
            notes: None,
        };
        assert_eq!(draft.validate().unwrap_err().field, "items");
    }

    #[test]
    fn orders_sort_newest_first() {
        let mut older = order(1, OrderStatus::Pending);
        older.created_at = Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap();
        let newer = order(2, OrderStatus::Pending);
        assert_eq!(Order::display_order(&newer, &older), Ordering::Less);
    }
}
