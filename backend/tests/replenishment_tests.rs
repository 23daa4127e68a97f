//! Replenishment drafter tests
//!
//! Tests for reorder suggestions including:
//! - Par level derivation and suggested quantity
//! - Fresh draft generation grouped by supplier
//! - Auto-fill overwrites manual quantities and reports them

mod common;

use common::*;
use ks_server::error::AppError;
use ks_server::services::order_draft::{CreateDraftInput, DraftLineInput};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{par_level, suggested_quantity, OrderStatus};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_par_from_minimum_when_no_maximum() {
        // current 2, min 5, no max -> par 10, order 8
        let par = par_level(dec("5"), None);
        assert_eq!(par, dec("10"));
        assert_eq!(suggested_quantity(dec("2"), par), dec("8"));
    }

    #[test]
    fn test_par_prefers_positive_maximum() {
        assert_eq!(par_level(dec("5"), Some(dec("30"))), dec("30"));
        assert_eq!(par_level(dec("5"), Some(dec("0"))), dec("10"));
        assert_eq!(par_level(dec("0"), None), dec("0"));
    }

    #[test]
    fn test_negative_stock_raises_suggestion() {
        assert_eq!(suggested_quantity(dec("-2"), dec("10")), dec("12"));
        assert_eq!(suggested_quantity(dec("15"), dec("10")), dec("0"));
    }

    #[tokio::test]
    async fn test_generate_groups_by_supplier() {
        let kitchen = Kitchen::new();
        let dairy = kitchen.supplier("Dairy Co").await;
        let roaster = kitchen.supplier("Roaster").await;
        let milk = kitchen.ingredient("Milk", "2", "5", None, Some(dairy.id)).await;
        let cream = kitchen.ingredient("Cream", "1", "2", Some("6"), Some(dairy.id)).await;
        kitchen.ingredient("Beans", "9", "3", None, Some(roaster.id)).await;
        let napkins = kitchen.ingredient("Napkins", "0", "10", None, None).await;

        let generated = kitchen
            .state
            .replenishment_service()
            .generate_drafts(None)
            .await
            .unwrap();

        // beans are above their minimum, so the roaster gets nothing
        assert_eq!(generated.drafts.len(), 1);
        let draft = &generated.drafts[0].draft;
        assert_eq!(draft.supplier_id, dairy.id);
        assert_eq!(draft.status, OrderStatus::Draft);
        assert_eq!(draft.line(milk.id).unwrap().quantity, dec("8"));
        assert_eq!(draft.line(cream.id).unwrap().quantity, dec("5"));
        assert_eq!(draft.line(milk.id).unwrap().unit_cost, dec("2.50"));
        assert_eq!(generated.drafts[0].total, dec("32.50"));

        assert_eq!(generated.unassigned.len(), 1);
        assert_eq!(generated.unassigned[0].ingredient_id, napkins.id);
        assert_eq!(generated.unassigned[0].quantity, dec("20"));
    }

    #[tokio::test]
    async fn test_generate_for_one_supplier() {
        let kitchen = Kitchen::new();
        let dairy = kitchen.supplier("Dairy Co").await;
        let roaster = kitchen.supplier("Roaster").await;
        kitchen.ingredient("Milk", "2", "5", None, Some(dairy.id)).await;
        kitchen.ingredient("Beans", "1", "3", None, Some(roaster.id)).await;
        kitchen.ingredient("Napkins", "0", "10", None, None).await;

        let generated = kitchen
            .state
            .replenishment_service()
            .generate_drafts(Some(roaster.id))
            .await
            .unwrap();

        assert_eq!(generated.drafts.len(), 1);
        assert_eq!(generated.drafts[0].draft.supplier_id, roaster.id);
        assert!(generated.unassigned.is_empty());
    }

    #[tokio::test]
    async fn test_autofill_overwrites_and_reports() {
        let kitchen = Kitchen::new();
        let dairy = kitchen.supplier("Dairy Co").await;
        let milk = kitchen.ingredient("Milk", "2", "5", None, Some(dairy.id)).await;
        let cream = kitchen.ingredient("Cream", "12", "2", Some("6"), Some(dairy.id)).await;

        let draft = kitchen
            .state
            .order_draft_service()
            .create_draft(CreateDraftInput {
                supplier_id: dairy.id,
                lines: vec![
                    DraftLineInput {
                        ingredient_id: milk.id,
                        quantity: dec("50"),
                        unit_cost: None,
                    },
                    DraftLineInput {
                        ingredient_id: cream.id,
                        quantity: dec("3"),
                        unit_cost: Some(dec("4")),
                    },
                ],
                notes: None,
            })
            .await
            .unwrap();

        let report = kitchen
            .state
            .replenishment_service()
            .autofill(draft.draft.id)
            .await
            .unwrap();

        assert_eq!(report.changes.len(), 2);
        let milk_change = report
            .changes
            .iter()
            .find(|c| c.ingredient_id == milk.id)
            .unwrap();
        assert_eq!(milk_change.previous_quantity, dec("50"));
        assert_eq!(milk_change.new_quantity, dec("8"));

        // cream is above par; the line is kept at zero
        let cream_line = report.draft.draft.line(cream.id).unwrap();
        assert_eq!(cream_line.quantity, dec("0"));
        assert_eq!(cream_line.unit_cost, dec("4"));
        assert_eq!(report.draft.total, dec("20"));
    }

    #[tokio::test]
    async fn test_autofill_rejected_after_placement() {
        let kitchen = Kitchen::new();
        let dairy = kitchen.supplier("Dairy Co").await;
        kitchen.ingredient("Milk", "2", "5", None, Some(dairy.id)).await;

        let generated = kitchen
            .state
            .replenishment_service()
            .generate_drafts(None)
            .await
            .unwrap();
        let draft_id = generated.drafts[0].draft.id;
        kitchen
            .state
            .order_draft_service()
            .place_draft(draft_id)
            .await
            .unwrap();

        let err = kitchen
            .state
            .replenishment_service()
            .autofill(draft_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidDraftTransition(_)));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating stock levels, negatives included
    fn stock_strategy() -> impl Strategy<Value = Decimal> {
        (-1000i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for generating configured levels
    fn level_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=5000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Suggestion is never negative and tops stock up to exactly par
        #[test]
        fn prop_suggestion_reaches_par(
            current in stock_strategy(),
            min in level_strategy(),
            max in prop::option::of(level_strategy())
        ) {
            let par = par_level(min, max);
            let suggestion = suggested_quantity(current, par);
            prop_assert!(suggestion >= Decimal::ZERO);
            if current < par {
                prop_assert_eq!(current + suggestion, par);
            } else {
                prop_assert_eq!(suggestion, Decimal::ZERO);
            }
        }

        /// Par is never below the minimum unless an explicit maximum says so
        #[test]
        fn prop_derived_par_covers_minimum(min in level_strategy()) {
            prop_assert!(par_level(min, None) >= min);
        }
    }
}
