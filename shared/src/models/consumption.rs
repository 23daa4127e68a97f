//! Bill-of-materials resolution and per-sale consumption aggregation
//!
//! Everything here is pure and in-memory. The backend loads the recipes,
//! hands them over as a [`RecipeBook`], and persists the resulting map as the
//! sale's deduction journal.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{RecipeBook, RecipeOwner, SaleLineItem};

/// One ingredient quantity to deduct
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionEntry {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
}

/// Total quantity to deduct per ingredient for one sale, in ingredient id order
pub type ConsumptionMap = BTreeMap<Uuid, Decimal>;

/// A sold item (or add-on) that could not be resolved to ingredients.
///
/// Gaps never block a sale; they are carried back to the caller as warnings.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionGap {
    #[error("No recipe linked to menu item {name} ({menu_item_id}); stock not deducted for this item")]
    MissingMenuItemRecipe { menu_item_id: Uuid, name: String },

    #[error("No recipe linked to add-on {name} ({add_on_id}) on {menu_item_id}; stock not deducted for this add-on")]
    MissingAddOnRecipe {
        menu_item_id: Uuid,
        add_on_id: Uuid,
        name: String,
    },
}

/// Resolver output for a line whose menu item has a recipe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineConsumption {
    pub entries: Vec<ConsumptionEntry>,
    /// Add-ons that were skipped for lack of a recipe
    pub gaps: Vec<ResolutionGap>,
}

/// Resolver output across every line of a sale
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleResolution {
    pub entries: Vec<ConsumptionEntry>,
    pub warnings: Vec<ResolutionGap>,
}

impl SaleResolution {
    pub fn aggregate(&self) -> ConsumptionMap {
        aggregate(&self.entries)
    }
}

/// Expand one line item into flat consumption entries.
///
/// Each recipe component consumes `quantity_per_serving x item.quantity`.
/// Each add-on consumes `quantity_per_serving x add_on.quantity x item.quantity`,
/// so an add-on picked once on an item sold three times is consumed three times.
pub fn resolve_line_item(
    item: &SaleLineItem,
    recipes: &RecipeBook,
) -> Result<LineConsumption, ResolutionGap> {
    let recipe = recipes
        .get(&RecipeOwner::menu_item(item.menu_item_id))
        .ok_or_else(|| ResolutionGap::MissingMenuItemRecipe {
            menu_item_id: item.menu_item_id,
            name: item.name.clone(),
        })?;

    let mut line = LineConsumption::default();
    line.entries
        .extend(recipe.components.iter().map(|c| ConsumptionEntry {
            ingredient_id: c.ingredient_id,
            quantity: c.quantity_per_serving * item.quantity,
        }));

    for add_on in &item.add_ons {
        match recipes.get(&RecipeOwner::add_on(add_on.add_on_id)) {
            Some(add_on_recipe) => {
                let servings = add_on.quantity * item.quantity;
                line.entries
                    .extend(add_on_recipe.components.iter().map(|c| ConsumptionEntry {
                        ingredient_id: c.ingredient_id,
                        quantity: c.quantity_per_serving * servings,
                    }));
            }
            None => line.gaps.push(ResolutionGap::MissingAddOnRecipe {
                menu_item_id: item.menu_item_id,
                add_on_id: add_on.add_on_id,
                name: add_on.name.clone(),
            }),
        }
    }

    Ok(line)
}

/// Resolve every line of a sale, collecting gaps as warnings
pub fn resolve_sale(lines: &[SaleLineItem], recipes: &RecipeBook) -> SaleResolution {
    let mut resolution = SaleResolution::default();
    for item in lines {
        match resolve_line_item(item, recipes) {
            Ok(line) => {
                resolution.entries.extend(line.entries);
                resolution.warnings.extend(line.gaps);
            }
            Err(gap) => resolution.warnings.push(gap),
        }
    }
    resolution
}

/// Sum entries per ingredient. Ingredients that net to zero are left out.
pub fn aggregate(entries: &[ConsumptionEntry]) -> ConsumptionMap {
    let mut totals = ConsumptionMap::new();
    for entry in entries {
        *totals.entry(entry.ingredient_id).or_insert(Decimal::ZERO) += entry.quantity;
    }
    totals.retain(|_, quantity| !quantity.is_zero());
    totals
}
