//! Daily restaurant report: `mise report`.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Offset, TimeZone, Utc};
use console::style;
use serde::Serialize;

use mise::config::{MiseConfig, ReportZone};
use mise::domain::{Order, OrderStatus, OrderType};
use mise::select::{
    self, DeliveryRow, OrderStats, TableOccupancy, delivery_board, kitchen_queue, local_day,
    lookup_or, stats_on, table_occupancy,
};
use mise::snapshot::RestaurantSnapshot;
use mise::stores::Stores;

#[derive(Debug, Serialize)]
pub struct QueueEntry {
    pub order_id: i64,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub table: String,
    pub items: u32,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub offset: String,
    pub stats: OrderStats,
    pub kitchen_queue: Vec<QueueEntry>,
    pub tables: TableOccupancy,
    pub deliveries: Vec<DeliveryRow>,
}

impl DailyReport {
    /// Report on `date` as a calendar day in `tz`.
    pub fn build<Tz: TimeZone>(stores: &Stores, date: NaiveDate, tz: &Tz) -> Self {
        let orders = stores.orders.snapshot();
        let tables = stores.tables.snapshot();

        let todays: Vec<&Order> = select::created_on(orders.values(), date, tz);
        let kitchen_queue = kitchen_queue(todays)
            .into_iter()
            .map(|order| QueueEntry {
                order_id: order.id,
                status: order.status,
                order_type: order.order_type,
                table: lookup_or(&tables, order.table_id.as_ref(), |t| t.number.to_string()),
                items: order.items.iter().map(|line| line.quantity).sum(),
                total: order.total,
                created_at: order.created_at,
            })
            .collect();

        let deliveries = delivery_board(
            &stores.assignments.snapshot(),
            &stores.customers.snapshot(),
            &stores.employees.snapshot(),
            &stores.addresses.snapshot(),
        )
        .into_iter()
        .filter(|row| local_day(row.created_at, tz) == date)
        .collect();

        Self {
            date,
            offset: tz.offset_from_utc_date(&date).fix().to_string(),
            stats: stats_on(&orders, date, tz),
            kitchen_queue,
            tables: table_occupancy(&tables),
            deliveries,
        }
    }
}

pub async fn cmd_report(
    config: &MiseConfig,
    snapshot_path: &Path,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let snapshot = RestaurantSnapshot::load(snapshot_path)?;
    let stores = Stores::from_snapshot(snapshot, config.response_ordering());

    let summary = stores.load_all().await;
    if let Some(err) = summary.failed.first() {
        return Err(err.clone()).context("Failed to load restaurant data");
    }

    let report = match config.report_zone() {
        ReportZone::Local => report_for(&stores, date, &Local),
        ReportZone::Utc => report_for(&stores, date, &Utc),
        ReportZone::Fixed(offset) => report_for(&stores, date, &offset),
    };

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn report_for<Tz: TimeZone>(stores: &Stores, date: Option<NaiveDate>, tz: &Tz) -> DailyReport {
    let date = date.unwrap_or_else(|| select::today(tz));
    DailyReport::build(stores, date, tz)
}

fn print_report(report: &DailyReport) {
    let stats = &report.stats;

    println!();
    println!(
        "{}",
        style(format!("Daily report for {} (UTC{})", report.date, report.offset))
            .bold()
            .cyan()
    );
    println!();

    println!("{}", style("Orders").bold());
    println!(
        "  total {}   pending {}   preparing {}   ready {}   completed {}   cancelled {}",
        stats.total, stats.pending, stats.preparing, stats.ready, stats.completed, stats.cancelled
    );
    println!(
        "  dine-in {}   pickup {}   delivery {}",
        stats.dine_in, stats.pickup, stats.delivery
    );
    println!(
        "  revenue {:.2}   average ticket {:.2}",
        stats.revenue, stats.avg_ticket
    );
    println!();

    println!("{}", style("Kitchen queue").bold());
    if report.kitchen_queue.is_empty() {
        println!("  {}", style("nothing waiting").dim());
    }
    for entry in &report.kitchen_queue {
        println!(
            "  #{:<5} {:<10} {:<9} table {:<4} {:>3} items {:>9.2}",
            entry.order_id,
            entry.status.as_str(),
            entry.order_type.as_str(),
            entry.table,
            entry.items,
            entry.total
        );
    }
    println!();

    let tables = &report.tables;
    println!("{}", style("Tables").bold());
    println!(
        "  {}/{} occupied ({:.0}%), {} reserved, {}/{} seats in use",
        tables.occupied,
        tables.total,
        tables.rate * 100.0,
        tables.reserved,
        tables.seats_in_use,
        tables.seats
    );
    println!();

    println!("{}", style("Deliveries").bold());
    if report.deliveries.is_empty() {
        println!("  {}", style("no deliveries").dim());
    }
    for row in &report.deliveries {
        let status = format!("{:<10}", row.status.as_str());
        let status = if row.is_active() {
            style(status).yellow()
        } else {
            style(status).dim()
        };
        println!(
            "  order {:<5} {} {} -> {} (courier {})",
            row.order_id, status, row.customer, row.address, row.courier
        );
    }
    println!();
}
