//! Menu items, the categories that group them, and combos.
//!
//! Menu items and combos are never physically deleted: deleting one flips
//! `available` to `false` so historical orders keep resolving.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cmp_names;
use crate::entity::{AllRecords, Criteria, Domain, Entity, Patch};
use crate::errors::ValidationError;
use crate::gateway::memory::Materialize;
use crate::validate::{Validate, require_non_empty, require_positive};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemDraft {
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Patch<MenuItem> for MenuItemPatch {
    fn apply_to(&self, item: &mut MenuItem) {
        if let Some(category_id) = self.category_id {
            item.category_id = category_id;
        }
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(available) = self.available {
            item.available = available;
        }
        if let Some(image_url) = &self.image_url {
            item.image_url = Some(image_url.clone());
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemFilter {
    pub category_id: Option<i64>,
    pub available: Option<bool>,
}

impl MenuItemFilter {
    pub fn in_category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            available: None,
        }
    }
}

impl Criteria<MenuItem> for MenuItemFilter {
    fn matches(&self, item: &MenuItem) -> bool {
        self.category_id.is_none_or(|c| item.category_id == c)
            && self.available.is_none_or(|a| item.available == a)
    }
}

impl Entity for MenuItem {
    type Id = i64;
    type Draft = MenuItemDraft;
    type Patch = MenuItemPatch;
    type Filter = MenuItemFilter;

    const DOMAIN: Domain = Domain::MenuItems;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn soft_delete_patch() -> Option<MenuItemPatch> {
        Some(MenuItemPatch {
            available: Some(false),
            ..Default::default()
        })
    }

    fn display_order(a: &Self, b: &Self) -> Ordering {
        cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id))
    }
}

impl Materialize for MenuItem {
    fn materialize(draft: MenuItemDraft, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: seq as i64,
            category_id: draft.category_id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            available: true,
            image_url: draft.image_url,
            created_at: now,
        }
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(self.id).ok()
    }
}

impl Validate for MenuItemDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_positive("price", self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Patch<Category> for CategoryPatch {
    fn apply_to(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(description) = &self.description {
            category.description = Some(description.clone());
        }
    }
}

impl Entity for Category {
    type Id = i64;
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;
    type Filter = AllRecords;

    const DOMAIN: Domain = Domain::Categories;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn display_order(a: &Self, b: &Self) -> Ordering {
        cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id))
    }
}

impl Materialize for Category {
    fn materialize(draft: CategoryDraft, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: seq as i64,
            name: draft.name,
            description: draft.description,
            created_at: now,
        }
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(self.id).ok()
    }
}

impl Validate for CategoryDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Combo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub menu_item_ids: Vec<i64>,
    #[serde(default = "default_true")]
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub menu_item_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_item_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Patch<Combo> for ComboPatch {
    fn apply_to(&self, combo: &mut Combo) {
        if let Some(name) = &self.name {
            combo.name = name.clone();
        }
        if let Some(description) = &self.description {
            combo.description = description.clone();
        }
        if let Some(price) = self.price {
            combo.price = price;
        }
        if let Some(ids) = &self.menu_item_ids {
            combo.menu_item_ids = ids.clone();
        }
        if let Some(available) = self.available {
            combo.available = available;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboFilter {
    pub available: Option<bool>,
}

impl Criteria<Combo> for ComboFilter {
    fn matches(&self, combo: &Combo) -> bool {
        self.available.is_none_or(|a| combo.available == a)
    }
}

impl Entity for Combo {
    type Id = i64;
    type Draft = ComboDraft;
    type Patch = ComboPatch;
    type Filter = ComboFilter;

    const DOMAIN: Domain = Domain::Combos;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn soft_delete_patch() -> Option<ComboPatch> {
        Some(ComboPatch {
            available: Some(false),
            ..Default::default()
        })
    }

    fn display_order(a: &Self, b: &Self) -> Ordering {
        cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id))
    }
}

impl Materialize for Combo {
    fn materialize(draft: ComboDraft, seq: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: seq as i64,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            menu_item_ids: draft.menu_item_ids,
            available: true,
            created_at: now,
        }
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(self.id).ok()
    }
}

impl Validate for ComboDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_positive("price", self.price)?;
        if self.menu_item_ids.is_empty() {
            return Err(ValidationError::new("menu_item_ids", "a combo needs at least one item"));
        }
        Ok(())
    }
}
