//! The entity contract shared by every domain.
//!
//! A domain record only has to say how it is identified, what its create,
//! update and filter payloads look like, and how it is deleted. Everything
//! else (caching, synchronization, derived views) is generic over [`Entity`].

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One entity family of the restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Orders,
    Customers,
    Employees,
    MenuItems,
    Categories,
    Combos,
    Assignments,
    Tables,
    Addresses,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Orders,
        Domain::Customers,
        Domain::Employees,
        Domain::MenuItems,
        Domain::Categories,
        Domain::Combos,
        Domain::Assignments,
        Domain::Tables,
        Domain::Addresses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Customers => "customers",
            Self::Employees => "employees",
            Self::MenuItems => "menu_items",
            Self::Categories => "categories",
            Self::Combos => "combos",
            Self::Assignments => "assignments",
            Self::Tables => "tables",
            Self::Addresses => "addresses",
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("Invalid domain: {}", s))
    }
}

/// How a domain removes records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// The record is physically removed from the gateway and the cache.
    Hard,
    /// The record stays, flagged unavailable through a patch.
    Soft,
}

/// Partial update of an entity. Only the fields set on the patch change.
pub trait Patch<E> {
    fn apply_to(&self, entity: &mut E);
}

/// Filter criteria for a filtered load.
pub trait Criteria<E> {
    fn matches(&self, entity: &E) -> bool;
}

/// Filter for domains that are only ever loaded whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllRecords;

impl<E> Criteria<E> for AllRecords {
    fn matches(&self, _entity: &E) -> bool {
        true
    }
}

/// A flat, serializable domain record with a stable identifier.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static;
    /// Payload for creating a record; the gateway assigns id and timestamps.
    type Draft: Debug + Send + Sync + 'static;
    type Patch: Patch<Self> + Clone + Debug + Send + Sync + 'static;
    type Filter: Criteria<Self> + Clone + Debug + Send + Sync + 'static;

    const DOMAIN: Domain;

    fn id(&self) -> &Self::Id;

    /// Patch that retires a record instead of removing it.
    ///
    /// Domains returning `Some` are soft-deleted.
    fn soft_delete_patch() -> Option<Self::Patch> {
        None
    }

    fn delete_policy() -> DeletePolicy {
        if Self::soft_delete_patch().is_some() {
            DeletePolicy::Soft
        } else {
            DeletePolicy::Hard
        }
    }

    /// Read-time ordering for listings of this domain.
    fn display_order(_a: &Self, _b: &Self) -> Ordering {
        Ordering::Equal
    }
}
