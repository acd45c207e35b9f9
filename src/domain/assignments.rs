//! Delivery assignments: which courier takes which order to which customer.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Criteria, Domain, Entity, Patch};
use crate::errors::ValidationError;
use crate::gateway::memory::Materialize;
use crate::validate::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    InTransit,
    Delivered,
    Cancelled,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(Self::Assigned),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid assignment status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    pub delivery_person_id: Uuid,
    #[serde(default)]
    pub address_id: Option<i64>,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDraft {
    pub order_id: i64,
    pub customer_id: i64,
    pub delivery_person_id: Uuid,
    pub address_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AssignmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_person_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl AssignmentPatch {
    pub fn delivered(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(AssignmentStatus::Delivered),
            delivered_at: Some(at),
            ..Default::default()
        }
    }
}

impl Patch<Assignment> for AssignmentPatch {
    fn apply_to(&self, assignment: &mut Assignment) {
        if let Some(status) = self.status {
            assignment.status = status;
        }
        if let Some(person) = self.delivery_person_id {
            assignment.delivery_person_id = person;
        }
        if let Some(at) = self.delivered_at {
            assignment.delivered_at = Some(at);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentFilter {
    pub status: Option<AssignmentStatus>,
    pub delivery_person_id: Option<Uuid>,
    pub order_id: Option<i64>,
}

impl Criteria<Assignment> for AssignmentFilter {
    fn matches(&self, assignment: &Assignment) -> bool {
        self.status.is_none_or(|s| assignment.status == s)
            && self
                .delivery_person_id
                .is_none_or(|p| assignment.delivery_person_id == p)
            && self.order_id.is_none_or(|o| assignment.order_id == o)
    }
}

impl Entity for Assignment {
    type Id = i64;
    type Draft = AssignmentDraft;
    type Patch = AssignmentPatch;
    type Filter = AssignmentFilter;

    const DOMAIN: Domain = Domain::Assignments;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn display_order(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

impl Materialize for Assignment {
    fn materialize(draft: AssignmentDraft, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: seq as i64,
            order_id: draft.order_id,
            customer_id: draft.customer_id,
            delivery_person_id: draft.delivery_person_id,
            address_id: draft.address_id,
            status: AssignmentStatus::Assigned,
            created_at: now,
            delivered_at: None,
        }
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(self.id).ok()
    }
}

impl Validate for AssignmentDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.delivery_person_id.is_nil() {
            return Err(ValidationError::new("delivery_person_id", "is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_patch_stamps_time() {
        let now = Utc::now();
        let mut a = Assignment::materialize(
            AssignmentDraft {
                order_id: 1,
                customer_id: 2,
                delivery_person_id: Uuid::new_v4(),
                address_id: None,
            },
            1,
            now,
        );
        assert_eq!(a.status, AssignmentStatus::Assigned);
        AssignmentPatch::delivered(now).apply_to(&mut a);
        assert_eq!(a.status, AssignmentStatus::Delivered);
        assert_eq!(a.delivered_at, Some(now));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AssignmentStatus::InTransit).unwrap(),
            "\"in_transit\""
        );
        assert_eq!(
            "in_transit".parse::<AssignmentStatus>().unwrap(),
            AssignmentStatus::InTransit
        );
    }

    #[test]
    fn draft_requires_courier() {
        let draft = AssignmentDraft {
            order_id: 1,
            customer_id: 2,
            delivery_person_id: Uuid::nil(),
            address_id: None,
        };
        assert_eq!(draft.validate().unwrap_err().field, "delivery_person_id");
    }
}
