//! Recipe (bill-of-materials) models

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of sellable thing a recipe belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeKind {
    MenuItem,
    AddOn,
}

impl RecipeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeKind::MenuItem => "menu_item",
            RecipeKind::AddOn => "add_on",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "menu_item" => Some(RecipeKind::MenuItem),
            "add_on" => Some(RecipeKind::AddOn),
            _ => None,
        }
    }
}

/// Identity of a recipe's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeOwner {
    pub kind: RecipeKind,
    pub id: Uuid,
}

impl RecipeOwner {
    pub fn menu_item(id: Uuid) -> Self {
        Self {
            kind: RecipeKind::MenuItem,
            id,
        }
    }

    pub fn add_on(id: Uuid) -> Self {
        Self {
            kind: RecipeKind::AddOn,
            id,
        }
    }
}

/// One ingredient line of a recipe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeComponent {
    pub ingredient_id: Uuid,
    pub quantity_per_serving: Decimal,
}

/// Fixed mapping from a sellable item to what one serving consumes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeLink {
    pub owner: RecipeOwner,
    pub name: String,
    pub components: Vec<RecipeComponent>,
}

/// Recipes loaded for one resolution pass, keyed by owner
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: HashMap<RecipeOwner, RecipeLink>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, recipe: RecipeLink) {
        self.recipes.insert(recipe.owner, recipe);
    }

    pub fn get(&self, owner: &RecipeOwner) -> Option<&RecipeLink> {
        self.recipes.get(owner)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl FromIterator<RecipeLink> for RecipeBook {
    fn from_iter<T: IntoIterator<Item = RecipeLink>>(iter: T) -> Self {
        let mut book = RecipeBook::new();
        for recipe in iter {
            book.insert(recipe);
        }
        book
    }
}
