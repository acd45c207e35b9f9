use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Criteria, Domain, Entity, Patch};
use crate::errors::ValidationError;
use crate::gateway::memory::Materialize;
use crate::validate::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "reserved" => Ok(Self::Reserved),
            _ => Err(format!("Invalid table status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub id: i64,
    pub number: u32,
    pub capacity: u32,
    pub status: TableStatus,
    #[serde(default)]
    pub current_order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDraft {
    pub number: u32,
    pub capacity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TablePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
    /// `Some(None)` frees the table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_order_id: Option<Option<i64>>,
}

impl TablePatch {
    pub fn seat(order_id: i64) -> Self {
        Self {
            status: Some(TableStatus::Occupied),
            current_order_id: Some(Some(order_id)),
            ..Default::default()
        }
    }

    pub fn release() -> Self {
        Self {
            status: Some(TableStatus::Available),
            current_order_id: Some(None),
            ..Default::default()
        }
    }
}

impl Patch<Table> for TablePatch {
    fn apply_to(&self, table: &mut Table) {
        if let Some(number) = self.number {
            table.number = number;
        }
        if let Some(capacity) = self.capacity {
            table.capacity = capacity;
        }
        if let Some(status) = self.status {
            table.status = status;
        }
        if let Some(order_id) = self.current_order_id {
            table.current_order_id = order_id;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableFilter {
    pub status: Option<TableStatus>,
}

impl Criteria<Table> for TableFilter {
    fn matches(&self, table: &Table) -> bool {
        self.status.is_none_or(|s| table.status == s)
    }
}

impl Entity for Table {
    type Id = i64;
    type Draft = TableDraft;
    type Patch = TablePatch;
    type Filter = TableFilter;

    const DOMAIN: Domain = Domain::Tables;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn display_order(a: &Self, b: &Self) -> Ordering {
        a.number.cmp(&b.number)
    }
}

impl Materialize for Table {
    fn materialize(draft: TableDraft, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: seq as i64,
            number: draft.number,
            capacity: draft.capacity,
            status: TableStatus::Available,
            current_order_id: None,
            created_at: now,
        }
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(self.id).ok()
    }
}

impl Validate for TableDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.number == 0 {
            return Err(ValidationError::new("number", "table numbers start at 1"));
        }
        if self.capacity == 0 {
            return Err(ValidationError::new("capacity", "must seat at least one guest"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::materialize(TableDraft { number: 4, capacity: 6 }, 1, Utc::now())
    }

    #[test]
    fn seat_then_release() {
        let mut t = table();
        TablePatch::seat(99).apply_to(&mut t);
        assert_eq!(t.status, TableStatus::Occupied);
        assert_eq!(t.current_order_id, Some(99));

        TablePatch::release().apply_to(&mut t);
        assert_eq!(t.status, TableStatus::Available);
        assert_eq!(t.current_order_id, None);
    }

    #[test]
    fn tables_sort_by_number() {
        let mut ten = table();
        ten.number = 10;
        let two = Table {
            number: 2,
            ..table()
        };
        assert_eq!(Table::display_order(&two, &ten), Ordering::Less);
    }

    #[test]
    fn draft_rejects_zero_capacity() {
        let draft = TableDraft {
            number: 3,
            capacity: 0,
        };
        assert_eq!(draft.validate().unwrap_err().field, "capacity");
    }
}
