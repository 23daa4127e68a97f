//! Inventory setup tests
//!
//! Tests for suppliers, ingredients and recipes including:
//! - Input validation with bilingual messages
//! - Stock overview bands and par suggestions
//! - Recipe component rules
//! - Ingredients in use cannot be removed

mod common;

use common::*;
use ks_server::error::AppError;
use ks_server::services::inventory::{
    CreateIngredientInput, CreateSupplierInput, UpsertRecipeInput,
};
use ks_server::store::IngredientFilter;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{validate_stock_levels, RecipeComponent, RecipeKind, RecipeOwner, StockBand};
use uuid::Uuid;

fn ingredient_input(name: &str, current: &str, min: &str) -> CreateIngredientInput {
    CreateIngredientInput {
        name: name.to_string(),
        unit: "kg".to_string(),
        current_stock: dec(current),
        min_stock_level: dec(min),
        max_stock_level: None,
        cost_per_unit: dec("1.00"),
        supplier_id: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_supplier_trims_name() {
        let kitchen = Kitchen::new();
        let supplier = kitchen
            .state
            .inventory_service()
            .create_supplier(CreateSupplierInput {
                name: "  Bakery Hub ".to_string(),
                contact_email: "orders@bakery.example".to_string(),
                phone: Some("02-555-0100".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(supplier.name, "Bakery Hub");
        let fetched = kitchen
            .state
            .inventory_service()
            .get_supplier(supplier.id)
            .await
            .unwrap();
        assert_eq!(fetched.contact_email, "orders@bakery.example");
    }

    #[tokio::test]
    async fn test_create_supplier_rejects_bad_email() {
        let kitchen = Kitchen::new();
        let err = kitchen
            .state
            .inventory_service()
            .create_supplier(CreateSupplierInput {
                name: "Bakery Hub".to_string(),
                contact_email: "bakery".to_string(),
                phone: None,
            })
            .await
            .unwrap_err();

        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "contact_email"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingredient_levels_validated() {
        let kitchen = Kitchen::new();
        let service = kitchen.state.inventory_service();

        let mut input = ingredient_input("Flour", "10", "5");
        input.max_stock_level = Some(dec("3"));
        assert!(matches!(
            service.create_ingredient(input).await.unwrap_err(),
            AppError::Validation { .. }
        ));

        let mut input = ingredient_input("Flour", "10", "5");
        input.cost_per_unit = dec("-1");
        assert!(matches!(
            service.create_ingredient(input).await.unwrap_err(),
            AppError::Validation { .. }
        ));

        let mut input = ingredient_input("Flour", "10", "5");
        input.current_stock = Decimal::MIN;
        match service.create_ingredient(input).await.unwrap_err() {
            AppError::Validation { field, .. } => assert_eq!(field, "current_stock"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingredient_with_unknown_supplier_not_found() {
        let kitchen = Kitchen::new();
        let mut input = ingredient_input("Flour", "10", "5");
        input.supplier_id = Some(Uuid::new_v4());

        let err = kitchen
            .state
            .inventory_service()
            .create_ingredient(input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_ingredients_by_supplier() {
        let kitchen = Kitchen::new();
        let dairy = kitchen.supplier("Dairy Co").await;
        kitchen.ingredient("Milk", "10", "5", None, Some(dairy.id)).await;
        kitchen.ingredient("Cream", "10", "5", None, Some(dairy.id)).await;
        kitchen.ingredient("Flour", "10", "5", None, None).await;

        let listed = kitchen
            .state
            .inventory_service()
            .list_ingredients(IngredientFilter {
                supplier_id: Some(dairy.id),
                ids: None,
            })
            .await
            .unwrap();

        let names: Vec<&str> = listed.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Cream", "Milk"]);
    }

    #[tokio::test]
    async fn test_stock_overview_reports_bands() {
        let kitchen = Kitchen::new();
        kitchen.ingredient("Butter", "0", "2", None, None).await;
        kitchen.ingredient("Eggs", "2", "2", None, None).await;
        kitchen.ingredient("Flour", "9", "2", None, None).await;

        let overview = kitchen.state.inventory_service().stock_overview().await.unwrap();

        assert_eq!(overview.len(), 3);
        assert_eq!(overview[0].band, StockBand::Out);
        assert_eq!(overview[0].suggested_reorder, dec("4"));
        assert_eq!(overview[1].band, StockBand::Low);
        assert_eq!(overview[1].par_level, dec("4"));
        assert_eq!(overview[2].band, StockBand::Ok);
        assert_eq!(overview[2].suggested_reorder, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_recipe_upsert_replaces_components() {
        let kitchen = Kitchen::new();
        let beans = kitchen.ingredient("Beans", "5", "1", None, None).await.id;
        let milk = kitchen.ingredient("Milk", "5", "1", None, None).await.id;
        let service = kitchen.state.inventory_service();
        let latte = Uuid::new_v4();

        for components in [vec![(beans, "0.018")], vec![(beans, "0.018"), (milk, "0.2")]] {
            service
                .upsert_recipe(UpsertRecipeInput {
                    kind: RecipeKind::MenuItem,
                    owner_id: latte,
                    name: "Latte".to_string(),
                    components: components
                        .into_iter()
                        .map(|(id, qty)| RecipeComponent {
                            ingredient_id: id,
                            quantity_per_serving: dec(qty),
                        })
                        .collect(),
                })
                .await
                .unwrap();
        }

        let recipe = service.get_recipe(RecipeOwner::menu_item(latte)).await.unwrap();
        assert_eq!(recipe.components.len(), 2);

        let err = service
            .get_recipe(RecipeOwner::add_on(latte))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recipe_rejects_duplicate_and_zero_components() {
        let kitchen = Kitchen::new();
        let beans = kitchen.ingredient("Beans", "5", "1", None, None).await.id;
        let service = kitchen.state.inventory_service();

        let duplicate = UpsertRecipeInput {
            kind: RecipeKind::MenuItem,
            owner_id: Uuid::new_v4(),
            name: "Doppio".to_string(),
            components: vec![
                RecipeComponent {
                    ingredient_id: beans,
                    quantity_per_serving: dec("0.018"),
                },
                RecipeComponent {
                    ingredient_id: beans,
                    quantity_per_serving: dec("0.018"),
                },
            ],
        };
        assert!(matches!(
            service.upsert_recipe(duplicate).await.unwrap_err(),
            AppError::Validation { .. }
        ));

        let zero = UpsertRecipeInput {
            kind: RecipeKind::AddOn,
            owner_id: Uuid::new_v4(),
            name: "Nothing".to_string(),
            components: vec![RecipeComponent {
                ingredient_id: beans,
                quantity_per_serving: Decimal::ZERO,
            }],
        };
        assert!(matches!(
            service.upsert_recipe(zero).await.unwrap_err(),
            AppError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_ingredient_in_recipe_cannot_be_deleted() {
        let kitchen = Kitchen::new();
        let beans = kitchen.ingredient("Beans", "5", "1", None, None).await.id;
        let spare = kitchen.ingredient("Spare", "5", "1", None, None).await.id;
        kitchen
            .recipe(RecipeOwner::menu_item(Uuid::new_v4()), &[(beans, "0.018")])
            .await;
        let service = kitchen.state.inventory_service();

        assert!(matches!(
            service.delete_ingredient(beans).await.unwrap_err(),
            AppError::Conflict { .. }
        ));

        service.delete_ingredient(spare).await.unwrap();
        assert!(matches!(
            service.get_ingredient(spare).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn level_strategy() -> impl Strategy<Value = Decimal> {
        (-100i64..=1000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Accepted levels are never negative and any positive maximum covers the minimum
        #[test]
        fn prop_accepted_levels_are_consistent(
            min in level_strategy(),
            max in prop::option::of(level_strategy())
        ) {
            if validate_stock_levels(min, max).is_ok() {
                prop_assert!(min >= Decimal::ZERO);
                if let Some(max) = max {
                    prop_assert!(max >= Decimal::ZERO);
                    prop_assert!(max.is_zero() || max >= min);
                }
            }
        }
    }
}
