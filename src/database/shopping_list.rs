//! Sum-by-ingredient aggregation behind the shopping list download.
//!
//! Rows come from `recipe_ingredients` restricted to the recipes in one
//! user's cart. Every ingredient appears once with its amounts summed, and
//! the list is ordered by ingredient name, then unit, then id, so repeated
//! downloads of an unchanged cart are byte-identical.

use std::collections::HashMap;

use crate::schema::{RecipePart, ShoppingListItem, Uuid};

pub fn aggregate(parts: Vec<RecipePart>) -> Vec<ShoppingListItem> {
    let mut totals: HashMap<Uuid, ShoppingListItem> = HashMap::new();

    parts.into_iter().for_each(|part| match totals.get_mut(&part.ingredient_id) {
        Some(item) => item.total += i64::from(part.amount),
        None => {
            totals.insert(
                part.ingredient_id,
                ShoppingListItem {
                    ingredient_id: part.ingredient_id,
                    name: part.name,
                    measurement_unit: part.measurement_unit,
                    total: i64::from(part.amount),
                },
            );
        }
    });

    let mut items: Vec<ShoppingListItem> = totals.into_values().collect();
    sort_items(&mut items);
    items
}

pub fn sort_items(items: &mut [ShoppingListItem]) {
    items.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
            .then_with(|| a.ingredient_id.cmp(&b.ingredient_id))
    });
}

/// One `<name> (<unit>) — <total>` line per item. An empty list renders as
/// an empty document.
pub fn render(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} ({}) — {}\n", item.name, item.measurement_unit, item.total))
        .collect()
}
