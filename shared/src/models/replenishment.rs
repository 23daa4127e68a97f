//! Reorder suggestions toward par level

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AutofillChange, DraftLine, Ingredient, OrderDraft};

/// Suggested reorder for one ingredient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReorderSuggestion {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit: String,
    pub supplier_id: Option<Uuid>,
    pub current_stock: Decimal,
    pub min_stock_level: Decimal,
    pub par_level: Decimal,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

impl ReorderSuggestion {
    pub fn for_ingredient(ingredient: &Ingredient) -> Self {
        Self {
            ingredient_id: ingredient.id,
            ingredient_name: ingredient.name.clone(),
            unit: ingredient.unit.clone(),
            supplier_id: ingredient.supplier_id,
            current_stock: ingredient.current_stock,
            min_stock_level: ingredient.min_stock_level,
            par_level: ingredient.par_level(),
            quantity: ingredient.suggested_reorder(),
            unit_cost: ingredient.cost_per_unit,
        }
    }

    pub fn to_draft_line(&self) -> DraftLine {
        DraftLine {
            ingredient_id: self.ingredient_id,
            ingredient_name: self.ingredient_name.clone(),
            unit: self.unit.clone(),
            quantity: self.quantity,
            unit_cost: self.unit_cost,
        }
    }
}

/// Suggestions for every ingredient at or under its minimum that is below par
pub fn reorder_suggestions(ingredients: &[Ingredient]) -> Vec<ReorderSuggestion> {
    ingredients
        .iter()
        .filter(|i| i.needs_reorder())
        .map(ReorderSuggestion::for_ingredient)
        .filter(|s| s.quantity > Decimal::ZERO)
        .collect()
}

/// Suggestions split by supplier, plus those with no supplier assigned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierGroups {
    pub by_supplier: BTreeMap<Uuid, Vec<ReorderSuggestion>>,
    pub unassigned: Vec<ReorderSuggestion>,
}

pub fn group_by_supplier(suggestions: Vec<ReorderSuggestion>) -> SupplierGroups {
    let mut groups = SupplierGroups::default();
    for suggestion in suggestions {
        match suggestion.supplier_id {
            Some(supplier_id) => groups
                .by_supplier
                .entry(supplier_id)
                .or_default()
                .push(suggestion),
            None => groups.unassigned.push(suggestion),
        }
    }
    groups
}

/// Overwrite every line quantity of a draft with the par suggestion.
///
/// Lines whose ingredient is missing from `ingredients` are left untouched.
/// Returns one entry per line that was recomputed, including unchanged ones,
/// so the caller can show the full bulk overwrite.
pub fn autofill_to_par(
    draft: &mut OrderDraft,
    ingredients: &HashMap<Uuid, Ingredient>,
) -> Vec<AutofillChange> {
    let mut changes = Vec::with_capacity(draft.lines.len());
    for line in draft.lines.iter_mut() {
        let Some(ingredient) = ingredients.get(&line.ingredient_id) else {
            continue;
        };
        let new_quantity = ingredient.suggested_reorder();
        changes.push(AutofillChange {
            ingredient_id: line.ingredient_id,
            ingredient_name: line.ingredient_name.clone(),
            previous_quantity: line.quantity,
            new_quantity,
        });
        line.quantity = new_quantity;
    }
    changes
}
