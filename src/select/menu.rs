use serde::Serialize;

use super::{NOT_AVAILABLE, lookup_or, sorted};
use crate::cache::CacheState;
use crate::domain::{Category, Combo, MenuItem};

/// Items that can currently be ordered, alphabetically.
pub fn available_menu(items: &CacheState<MenuItem>) -> Vec<&MenuItem> {
    sorted(items.values().filter(|i| i.available))
}

pub fn available_combos(combos: &CacheState<Combo>) -> Vec<&Combo> {
    sorted(combos.values().filter(|c| c.available))
}

/// One heading of the printed menu.
#[derive(Debug, Clone, Serialize)]
pub struct MenuSection<'a> {
    pub category_id: i64,
    pub category: String,
    pub items: Vec<&'a MenuItem>,
}

/// Available items grouped under their category.
///
/// Sections follow the category order; items whose category is not cached
/// are collected last under [`NOT_AVAILABLE`].
pub fn menu_by_category<'a>(
    categories: &CacheState<Category>,
    items: &'a CacheState<MenuItem>,
) -> Vec<MenuSection<'a>> {
    let available = available_menu(items);
    let mut sections: Vec<MenuSection<'a>> = categories
        .sorted()
        .into_iter()
        .map(|category| MenuSection {
            category_id: category.id,
            category: category.name.clone(),
            items: available
                .iter()
                .copied()
                .filter(|i| i.category_id == category.id)
                .collect(),
        })
        .filter(|section| !section.items.is_empty())
        .collect();

    let orphans: Vec<&MenuItem> = available
        .iter()
        .copied()
        .filter(|i| !categories.contains(&i.category_id))
        .collect();
    if !orphans.is_empty() {
        sections.push(MenuSection {
            category_id: 0,
            category: NOT_AVAILABLE.to_string(),
            items: orphans,
        });
    }
    sections
}

/// Names of the items bundled in `combo`, in combo order.
pub fn combo_contents(combo: &Combo, items: &CacheState<MenuItem>) -> Vec<String> {
    combo
        .menu_item_ids
        .iter()
        .map(|id| lookup_or(items, Some(id), |i| i.name.clone()))
        .collect()
}
