//! Inventory setup service: suppliers, ingredients, recipes and stock levels

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    validate_non_negative_amount, validate_recipe_components, validate_stock_levels,
    validate_stock_quantity, Ingredient, RecipeComponent, RecipeKind, RecipeLink, RecipeOwner,
    StockAlert, StockBand, Supplier,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::{
    AlertFilter, IngredientFilter, InventoryStore, NewIngredient, NewSupplier,
};

/// Inventory service for managing the stock ledger's reference data
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
}

/// Input for creating a supplier
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 200, message = "Supplier name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub contact_email: String,
    pub phone: Option<String>,
}

/// Input for creating an ingredient
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIngredientInput {
    #[validate(length(min = 1, max = 200, message = "Ingredient name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "Unit is required"))]
    pub unit: String,
    #[serde(default)]
    pub current_stock: Decimal,
    #[serde(default)]
    pub min_stock_level: Decimal,
    pub max_stock_level: Option<Decimal>,
    #[serde(default)]
    pub cost_per_unit: Decimal,
    pub supplier_id: Option<Uuid>,
}

/// Input for linking a recipe to a menu item or add-on
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertRecipeInput {
    pub kind: RecipeKind,
    pub owner_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Recipe name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Recipe must have at least one ingredient"))]
    pub components: Vec<RecipeComponent>,
}

/// Current level of one ingredient
#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub band: StockBand,
    pub par_level: Decimal,
    pub suggested_reorder: Decimal,
}

impl From<Ingredient> for StockLevel {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            band: ingredient.band(),
            par_level: ingredient.par_level(),
            suggested_reorder: ingredient.suggested_reorder(),
            ingredient,
        }
    }
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Suppliers
    // ========================================================================

    pub async fn create_supplier(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        input.validate()?;

        let supplier = self
            .store
            .create_supplier(NewSupplier {
                name: input.name.trim().to_string(),
                contact_email: input.contact_email,
                phone: input.phone,
            })
            .await?;

        tracing::info!(supplier_id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_supplier(&self, supplier_id: Uuid) -> AppResult<Supplier> {
        Ok(self.store.get_supplier(supplier_id).await?)
    }

    // ========================================================================
    // Ingredients
    // ========================================================================

    pub async fn create_ingredient(&self, input: CreateIngredientInput) -> AppResult<Ingredient> {
        input.validate()?;
        validate_stock_quantity(input.current_stock).map_err(|msg| {
            AppError::validation("current_stock", msg, "จำนวนสต็อกไม่ถูกต้อง")
        })?;
        validate_stock_levels(input.min_stock_level, input.max_stock_level).map_err(|msg| {
            AppError::validation("min_stock_level", msg, "ระดับสต็อกไม่ถูกต้อง")
        })?;
        validate_non_negative_amount(input.cost_per_unit).map_err(|msg| {
            AppError::validation("cost_per_unit", msg, "ราคาต่อหน่วยต้องไม่ติดลบ")
        })?;

        let ingredient = self
            .store
            .create_ingredient(NewIngredient {
                name: input.name.trim().to_string(),
                unit: input.unit.trim().to_string(),
                current_stock: input.current_stock,
                min_stock_level: input.min_stock_level,
                max_stock_level: input.max_stock_level,
                cost_per_unit: input.cost_per_unit,
                supplier_id: input.supplier_id,
            })
            .await?;

        tracing::info!(ingredient_id = %ingredient.id, name = %ingredient.name, "Ingredient created");
        Ok(ingredient)
    }

    pub async fn get_ingredient(&self, ingredient_id: Uuid) -> AppResult<Ingredient> {
        Ok(self.store.get_ingredient(ingredient_id).await?)
    }

    pub async fn list_ingredients(&self, filter: IngredientFilter) -> AppResult<Vec<Ingredient>> {
        Ok(self.store.list_ingredients(filter).await?)
    }

    /// Remove an ingredient that no recipe uses
    pub async fn delete_ingredient(&self, ingredient_id: Uuid) -> AppResult<()> {
        self.store
            .delete_ingredient(ingredient_id)
            .await
            .map_err(|e| match e {
                crate::store::StoreError::Precondition(msg) => AppError::Conflict {
                    resource: "ingredient".to_string(),
                    message: msg,
                    message_th: "วัตถุดิบนี้ถูกใช้ในสูตรอยู่".to_string(),
                },
                other => other.into(),
            })
    }

    /// Every ingredient with its band and par suggestion
    pub async fn stock_overview(&self) -> AppResult<Vec<StockLevel>> {
        let ingredients = self.store.list_ingredients(IngredientFilter::default()).await?;
        Ok(ingredients.into_iter().map(StockLevel::from).collect())
    }

    // ========================================================================
    // Recipes
    // ========================================================================

    pub async fn upsert_recipe(&self, input: UpsertRecipeInput) -> AppResult<RecipeLink> {
        input.validate()?;
        validate_recipe_components(&input.components).map_err(|msg| {
            AppError::validation("components", msg, "ส่วนประกอบสูตรไม่ถูกต้อง")
        })?;

        let recipe = self
            .store
            .upsert_recipe(RecipeLink {
                owner: RecipeOwner {
                    kind: input.kind,
                    id: input.owner_id,
                },
                name: input.name.trim().to_string(),
                components: input.components,
            })
            .await?;

        tracing::info!(
            owner_id = %recipe.owner.id,
            kind = recipe.owner.kind.as_str(),
            components = recipe.components.len(),
            "Recipe saved"
        );
        Ok(recipe)
    }

    pub async fn get_recipe(&self, owner: RecipeOwner) -> AppResult<RecipeLink> {
        self.store
            .get_recipes(&[owner])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Recipe".to_string()))
    }

    // ========================================================================
    // Alerts
    // ========================================================================

    pub async fn list_alerts(&self, filter: AlertFilter) -> AppResult<Vec<StockAlert>> {
        Ok(self.store.list_alerts(filter).await?)
    }
}
