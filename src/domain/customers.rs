use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cmp_names;
use crate::entity::{Criteria, Domain, Entity, Patch};
use crate::errors::ValidationError;
use crate::gateway::memory::Materialize;
use crate::validate::{Validate, require_email, require_non_empty};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Patch<Customer> for CustomerPatch {
    fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            customer.phone = phone.clone();
        }
        if let Some(email) = &self.email {
            customer.email = Some(email.clone());
        }
        if let Some(notes) = &self.notes {
            customer.notes = Some(notes.clone());
        }
    }
}

/// Case-insensitive search over name and phone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerFilter {
    pub search: Option<String>,
}

impl Criteria<Customer> for CustomerFilter {
    fn matches(&self, customer: &Customer) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.trim().to_lowercase();
                customer.name.to_lowercase().contains(&term) || customer.phone.contains(&term)
            }
        }
    }
}

impl Entity for Customer {
    type Id = i64;
    type Draft = CustomerDraft;
    type Patch = CustomerPatch;
    type Filter = CustomerFilter;

    const DOMAIN: Domain = Domain::Customers;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn display_order(a: &Self, b: &Self) -> Ordering {
        cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id))
    }
}

impl Materialize for Customer {
    fn materialize(draft: CustomerDraft, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: seq as i64,
            name: draft.name,
            phone: draft.phone,
            email: draft.email,
            notes: draft.notes,
            created_at: now,
        }
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(self.id).ok()
    }
}

impl Validate for CustomerDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("phone", &self.phone)?;
        if let Some(email) = &self.email {
            require_email("email", email)?;
        }
        Ok(())
    }
}
