use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use super::{Timestamped, created_on, created_today, local_day};
use crate::cache::CacheState;
use crate::domain::{Order, OrderStatus, OrderType};

/// Counts per status and type, plus revenue over non-cancelled orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub preparing: usize,
    pub ready: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub dine_in: usize,
    pub pickup: usize,
    pub delivery: usize,
    pub revenue: f64,
    pub avg_ticket: f64,
}

pub fn order_stats<'a>(orders: impl IntoIterator<Item = &'a Order>) -> OrderStats {
    let mut stats = OrderStats::default();
    for order in orders {
        stats.total += 1;
        match order.status {
            OrderStatus::Pending => stats.pending += 1,
            OrderStatus::Preparing => stats.preparing += 1,
            OrderStatus::Ready => stats.ready += 1,
            OrderStatus::Completed => stats.completed += 1,
            OrderStatus::Cancelled => stats.cancelled += 1,
        }
        match order.order_type {
            OrderType::DineIn => stats.dine_in += 1,
            OrderType::Pickup => stats.pickup += 1,
            OrderType::Delivery => stats.delivery += 1,
        }
        if order.status != OrderStatus::Cancelled {
            stats.revenue += order.total;
        }
    }
    let billed = stats.total - stats.cancelled;
    if billed > 0 {
        stats.avg_ticket = stats.revenue / billed as f64;
    }
    stats
}

pub fn stats_on<Tz: TimeZone>(orders: &CacheState<Order>, day: NaiveDate, tz: &Tz) -> OrderStats {
    order_stats(created_on(orders.values(), day, tz))
}

pub fn today_stats<Tz: TimeZone>(orders: &CacheState<Order>, tz: &Tz) -> OrderStats {
    order_stats(created_today(orders.values(), tz))
}

/// Orders the kitchen still has to work on, oldest first.
pub fn kitchen_queue<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<&'a Order> {
    let mut queue: Vec<&Order> = orders.into_iter().filter(|o| o.status.is_open()).collect();
    queue.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    queue
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyIncome {
    pub day: NaiveDate,
    pub orders: usize,
    pub revenue: f64,
}

/// Non-cancelled order count and revenue per local day, oldest day first.
pub fn income_by_day<'a, Tz: TimeZone>(
    orders: impl IntoIterator<Item = &'a Order>,
    tz: &Tz,
) -> Vec<DailyIncome> {
    let mut days: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for order in orders {
        if order.status == OrderStatus::Cancelled {
            continue;
        }
        let entry = days.entry(local_day(order.created_at(), tz)).or_default();
        entry.0 += 1;
        entry.1 += order.total;
    }
    days.into_iter()
        .map(|(day, (orders, revenue))| DailyIncome {
            day,
            orders,
            revenue,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntityCache;
    use crate::select::fixtures::{at, order};
    use chrono::Utc;

    #[test]
    fn stats_for_three_orders() {
        let t = at(2026, 5, 4, 12, 0, 0);
        let orders = vec![
            order(1, 100.0, OrderStatus::Pending, t),
            order(2, 250.0, OrderStatus::Preparing, t),
            order(3, 75.0, OrderStatus::Completed, t),
        ];

        let stats = order_stats(&orders);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.preparing, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.ready, 0);
        assert_eq!(stats.dine_in, 3);
        assert_eq!(stats.revenue, 425.0);
        assert!((stats.avg_ticket - 141.666_666).abs() < 1e-5);
    }

    #[test]
    fn cancelled_orders_do_not_count_as_revenue() {
        let t = at(2026, 5, 4, 12, 0, 0);
        let orders = vec![
            order(1, 100.0, OrderStatus::Completed, t),
            order(2, 900.0, OrderStatus::Cancelled, t),
        ];

        let stats = order_stats(&orders);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.revenue, 100.0);
        assert_eq!(stats.avg_ticket, 100.0);
    }

    #[test]
    fn empty_stats_have_zero_average() {
        let stats = order_stats(&Vec::<Order>::new());
        assert_eq!(stats, OrderStats::default());
    }

    #[test]
    fn stats_on_only_counts_that_day() {
        let cache = EntityCache::<Order>::new();
        cache.set_all(vec![
            order(1, 100.0, OrderStatus::Completed, at(2026, 5, 4, 23, 59, 59)),
            order(2, 40.0, OrderStatus::Completed, at(2026, 5, 5, 0, 0, 0)),
        ]);
        let day = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();

        let stats = stats_on(&cache.snapshot(), day, &Utc);

        assert_eq!(stats.total, 1);
        assert_eq!(stats.revenue, 100.0);
    }

    #[test]
    fn today_stats_ignore_older_orders() {
        let cache = EntityCache::<Order>::new();
        cache.set_all(vec![
            order(1, 30.0, OrderStatus::Pending, Utc::now()),
            order(2, 60.0, OrderStatus::Pending, at(2020, 1, 1, 12, 0, 0)),
        ]);
        let stats = today_stats(&cache.snapshot(), &Utc);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.revenue, 30.0);
    }

    #[test]
    fn kitchen_queue_is_open_orders_oldest_first() {
        let orders = vec![
            order(1, 10.0, OrderStatus::Preparing, at(2026, 5, 4, 12, 30, 0)),
            order(2, 10.0, OrderStatus::Ready, at(2026, 5, 4, 12, 0, 0)),
            order(3, 10.0, OrderStatus::Pending, at(2026, 5, 4, 12, 10, 0)),
            order(4, 10.0, OrderStatus::Cancelled, at(2026, 5, 4, 11, 0, 0)),
        ];
        let ids: Vec<i64> = kitchen_queue(&orders).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn income_groups_by_day() {
        let orders = vec![
            order(1, 50.0, OrderStatus::Completed, at(2026, 5, 4, 13, 0, 0)),
            order(2, 20.0, OrderStatus::Completed, at(2026, 5, 3, 20, 0, 0)),
            order(3, 30.0, OrderStatus::Ready, at(2026, 5, 4, 19, 0, 0)),
            order(4, 99.0, OrderStatus::Cancelled, at(2026, 5, 4, 19, 0, 0)),
        ];

        let income = income_by_day(&orders, &Utc);

        assert_eq!(income.len(), 2);
        assert_eq!(income[0].day, NaiveDate::from_ymd_opt(2026, 5, 3).unwrap());
        assert_eq!(income[0].orders, 1);
        assert_eq!(income[1].orders, 2);
        assert_eq!(income[1].revenue, 80.0);
    }
}
