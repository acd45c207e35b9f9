//! Delivery addresses, always owned by one customer.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Criteria, Domain, Entity, Patch};
use crate::errors::ValidationError;
use crate::gateway::memory::Materialize;
use crate::validate::{Validate, require_non_empty};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub id: i64,
    pub customer_id: i64,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// One-line form used on delivery tickets.
    pub fn label(&self) -> String {
        match &self.reference {
            Some(reference) => format!("{}, {} ({})", self.street, self.city, reference),
            None => format!("{}, {}", self.street, self.city),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressDraft {
    pub customer_id: i64,
    pub street: String,
    pub city: String,
    pub reference: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl Patch<Address> for AddressPatch {
    fn apply_to(&self, address: &mut Address) {
        if let Some(street) = &self.street {
            address.street = street.clone();
        }
        if let Some(city) = &self.city {
            address.city = city.clone();
        }
        if let Some(reference) = &self.reference {
            address.reference = Some(reference.clone());
        }
        if let Some(is_default) = self.is_default {
            address.is_default = is_default;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressFilter {
    pub customer_id: Option<i64>,
}

impl AddressFilter {
    pub fn for_customer(customer_id: i64) -> Self {
        Self {
            customer_id: Some(customer_id),
        }
    }
}

impl Criteria<Address> for AddressFilter {
    fn matches(&self, address: &Address) -> bool {
        self.customer_id.is_none_or(|c| address.customer_id == c)
    }
}

impl Entity for Address {
    type Id = i64;
    type Draft = AddressDraft;
    type Patch = AddressPatch;
    type Filter = AddressFilter;

    const DOMAIN: Domain = Domain::Addresses;

    fn id(&self) -> &i64 {
        &self.id
    }

    /// Default address first, then by street.
    fn display_order(a: &Self, b: &Self) -> Ordering {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.street.cmp(&b.street))
    }
}

impl Materialize for Address {
    fn materialize(draft: AddressDraft, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: seq as i64,
            customer_id: draft.customer_id,
            street: draft.street,
            city: draft.city,
            reference: draft.reference,
            is_default: draft.is_default,
            created_at: now,
        }
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(self.id).ok()
    }
}

impl Validate for AddressDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("street", &self.street)?;
        require_non_empty("city", &self.city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(street: &str, is_default: bool) -> Address {
        Address::materialize(
            AddressDraft {
                customer_id: 3,
                street: street.into(),
                city: "Lima".into(),
                reference: None,
                is_default,
            },
            1,
            Utc::now(),
        )
    }

    #[test]
    fn default_address_sorts_first() {
        let home = address("Av. Brasil 120", true);
        let work = address("Jr. Amazonas 45", false);
        assert_eq!(Address::display_order(&home, &work), Ordering::Less);
    }

    #[test]
    fn label_includes_reference() {
        let mut a = address("Av. Brasil 120", true);
        assert_eq!(a.label(), "Av. Brasil 120, Lima");
        a.reference = Some("green door".into());
        assert_eq!(a.label(), "Av. Brasil 120, Lima (green door)");
    }

    #[test]
    fn filter_scopes_to_customer() {
        let a = address("Av. Brasil 120", true);
        assert!(AddressFilter::for_customer(3).matches(&a));
        assert!(!AddressFilter::for_customer(4).matches(&a));
    }
}
