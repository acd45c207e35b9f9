use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cmp_names;
use crate::entity::{Criteria, Domain, Entity, Patch};
use crate::errors::ValidationError;
use crate::gateway::memory::Materialize;
use crate::validate::{Validate, require_email, require_non_empty};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Admin,
    Manager,
    Waiter,
    Cook,
    Cashier,
    Delivery,
}

impl EmployeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Waiter => "waiter",
            Self::Cook => "cook",
            Self::Cashier => "cashier",
            Self::Delivery => "delivery",
        }
    }
}

impl std::fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "waiter" => Ok(Self::Waiter),
            "cook" => Ok(Self::Cook),
            "cashier" => Ok(Self::Cashier),
            "delivery" => Ok(Self::Delivery),
            _ => Err(format!("Invalid employee role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: Uuid,
    /// Auth account bound to this employee, if one was created.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: EmployeeRole,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDraft {
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: EmployeeRole,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<EmployeeRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Patch<Employee> for EmployeePatch {
    fn apply_to(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(role) = self.role {
            employee.role = role;
        }
        if let Some(active) = self.active {
            employee.active = active;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeFilter {
    pub role: Option<EmployeeRole>,
    pub active: Option<bool>,
}

impl Criteria<Employee> for EmployeeFilter {
    fn matches(&self, employee: &Employee) -> bool {
        self.role.is_none_or(|r| employee.role == r)
            && self.active.is_none_or(|a| employee.active == a)
    }
}

impl Entity for Employee {
    type Id = Uuid;
    type Draft = EmployeeDraft;
    type Patch = EmployeePatch;
    type Filter = EmployeeFilter;

    const DOMAIN: Domain = Domain::Employees;

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn display_order(a: &Self, b: &Self) -> Ordering {
        cmp_names(&a.name, &b.name)
    }
}

impl Materialize for Employee {
    fn materialize(draft: EmployeeDraft, _seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            name: draft.name,
            email: draft.email,
            role: draft.role,
            active: true,
            created_at: now,
        }
    }
}

impl Validate for EmployeeDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_email("email", &self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        for role in ["admin", "manager", "waiter", "cook", "cashier", "delivery"] {
            assert_eq!(role.parse::<EmployeeRole>().unwrap().as_str(), role);
        }
        assert!("chef".parse::<EmployeeRole>().is_err());
    }

    #[test]
    fn materialize_assigns_fresh_uuid_and_activates() {
        let draft = EmployeeDraft {
            user_id: None,
            name: "Iván".into(),
            email: "ivan@bistro.pe".into(),
            role: EmployeeRole::Delivery,
        };
        let a = Employee::materialize(draft.clone(), 1, Utc::now());
        let b = Employee::materialize(draft, 2, Utc::now());
        assert_ne!(a.id, b.id);
        assert!(a.active);
    }

    #[test]
    fn filter_by_role_and_active() {
        let employee = Employee::materialize(
            EmployeeDraft {
                user_id: None,
                name: "Iván".into(),
                email: "ivan@bistro.pe".into(),
                role: EmployeeRole::Delivery,
            },
            1,
            Utc::now(),
        );
        let couriers = EmployeeFilter {
            role: Some(EmployeeRole::Delivery),
            active: Some(true),
        };
        assert!(couriers.matches(&employee));
        let cooks = EmployeeFilter {
            role: Some(EmployeeRole::Cook),
            active: None,
        };
        assert!(!cooks.matches(&employee));
    }

    #[test]
    fn missing_active_defaults_to_true() {
        let json = r#"{"id":"6f1c7a1e-31d4-4c59-9a4e-8a1c1b5a2f10","name":"Ana","email":"ana@bistro.pe","role":"cook","created_at":"2026-01-01T00:00:00Z"}"#;
        let employee: Employee = serde_json::from_str(json).unwrap();
        assert!(employee.active);
        assert!(employee.user_id.is_none());
    }
}
