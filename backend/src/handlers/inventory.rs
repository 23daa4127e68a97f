//! HTTP handlers for suppliers, ingredients and recipes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{Ingredient, RecipeKind, RecipeLink, RecipeOwner, Supplier};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::inventory::{
    CreateIngredientInput, CreateSupplierInput, StockLevel, UpsertRecipeInput,
};
use crate::store::IngredientFilter;
use crate::AppState;

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    let supplier = state.inventory_service().create_supplier(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// Get a supplier by ID
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Supplier>> {
    let supplier = state.inventory_service().get_supplier(supplier_id).await?;
    Ok(Json(supplier))
}

/// Create an ingredient
pub async fn create_ingredient(
    State(state): State<AppState>,
    Json(input): Json<CreateIngredientInput>,
) -> AppResult<(StatusCode, Json<Ingredient>)> {
    let ingredient = state.inventory_service().create_ingredient(input).await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// List ingredients, optionally for one supplier
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(filter): Query<IngredientFilter>,
) -> AppResult<Json<Vec<Ingredient>>> {
    let ingredients = state.inventory_service().list_ingredients(filter).await?;
    Ok(Json(ingredients))
}

/// Get an ingredient by ID
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    let ingredient = state.inventory_service().get_ingredient(ingredient_id).await?;
    Ok(Json(ingredient))
}

/// Delete an unused ingredient
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.inventory_service().delete_ingredient(ingredient_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Every ingredient with its stock band and par suggestion
pub async fn stock_overview(State(state): State<AppState>) -> AppResult<Json<Vec<StockLevel>>> {
    let overview = state.inventory_service().stock_overview().await?;
    Ok(Json(overview))
}

/// Insert or replace a recipe
pub async fn upsert_recipe(
    State(state): State<AppState>,
    Json(input): Json<UpsertRecipeInput>,
) -> AppResult<Json<RecipeLink>> {
    let recipe = state.inventory_service().upsert_recipe(input).await?;
    Ok(Json(recipe))
}

/// Get the recipe of a menu item or add-on
pub async fn get_recipe(
    State(state): State<AppState>,
    Path((kind, owner_id)): Path<(String, Uuid)>,
) -> AppResult<Json<RecipeLink>> {
    let kind = RecipeKind::from_str(&kind).ok_or_else(|| AppError::Validation {
        field: "kind".to_string(),
        message: "Recipe kind must be menu_item or add_on".to_string(),
        message_th: "ประเภทสูตรต้องเป็น menu_item หรือ add_on".to_string(),
    })?;
    let recipe = state
        .inventory_service()
        .get_recipe(RecipeOwner { kind, id: owner_id })
        .await?;
    Ok(Json(recipe))
}
