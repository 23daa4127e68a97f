//! Threshold monitor tests
//!
//! Tests for low-stock alerting including:
//! - Band boundaries (min -> high, 0 -> critical, min + 1 -> none)
//! - One alert per band entry
//! - Replayed deductions raise nothing

mod common;

use common::*;
use ks_server::services::sale::SubmitSaleInput;
use ks_server::services::ThresholdMonitor;
use ks_server::store::{AlertFilter, InventoryStore};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{evaluate_change, AlertSeverity, RecipeOwner, StockBand, StockChange};
use uuid::Uuid;

fn change(previous: &str, new: &str, min: &str) -> StockChange {
    StockChange {
        ingredient_id: Uuid::new_v4(),
        ingredient_name: "Oat milk".to_string(),
        unit: "l".to_string(),
        previous_stock: dec(previous),
        new_stock: dec(new),
        delta: dec(previous) - dec(new),
        min_stock_level: dec(min),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(StockBand::classify(dec("5"), dec("5")), StockBand::Low);
        assert_eq!(StockBand::classify(dec("0"), dec("5")), StockBand::Out);
        assert_eq!(StockBand::classify(dec("6"), dec("5")), StockBand::Ok);
        assert_eq!(StockBand::classify(dec("-3"), dec("5")), StockBand::Out);
    }

    #[test]
    fn test_reaching_minimum_is_high_severity() {
        let alert = evaluate_change(&change("7", "5", "5"), None).unwrap();
        assert_eq!(alert.severity, AlertSeverity::High);
        assert!(alert.message.contains("running low"));
    }

    #[test]
    fn test_reaching_zero_is_critical() {
        let alert = evaluate_change(&change("7", "0", "5"), None).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert!(alert.message.contains("out of stock"));
    }

    #[test]
    fn test_staying_above_minimum_raises_nothing() {
        assert!(evaluate_change(&change("7", "6", "5"), None).is_none());
    }

    #[test]
    fn test_staying_in_band_raises_nothing() {
        assert!(evaluate_change(&change("4", "3", "5"), None).is_none());
        assert!(evaluate_change(&change("0", "-1", "5"), None).is_none());
    }

    #[tokio::test]
    async fn test_monitor_persists_alerts_with_sale() {
        let kitchen = Kitchen::new();
        let ingredient = kitchen.ingredient("Oat milk", "7", "5", None, None).await;
        let sale_id = None;
        let monitor = ThresholdMonitor::new(kitchen.store.clone());

        let mut low = change("7", "5", "5");
        low.ingredient_id = ingredient.id;
        let outcome = monitor.record(&[low], sale_id).await;

        assert_eq!(outcome.alerts.len(), 1);
        assert!(outcome.warnings.is_empty());
        let stored = kitchen
            .store
            .list_alerts(AlertFilter {
                ingredient_id: Some(ingredient.id),
                sale_id: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].stock_level, dec("5"));
    }

    /// Deducting through Ok -> Low -> Low -> Out raises exactly two alerts
    #[tokio::test]
    async fn test_one_alert_per_band_entry_across_sales() {
        let kitchen = Kitchen::new();
        let cream = kitchen.ingredient("Cream", "6", "5", None, None).await.id;
        let scoop = Uuid::new_v4();
        kitchen
            .recipe(RecipeOwner::menu_item(scoop), &[(cream, "1")])
            .await;
        let service = kitchen.state.sale_service();

        let mut raised = Vec::new();
        for quantity in ["1", "1", "4"] {
            let outcome = service
                .submit_sale(SubmitSaleInput {
                    line_items: vec![line(scoop, quantity, "3")],
                    discount: None,
                })
                .await
                .unwrap();
            raised.push(outcome.alerts.len());
        }

        assert_eq!(raised, vec![1, 0, 1]);
        assert_eq!(kitchen.stock(cream).await, dec("0"));

        let alerts = kitchen
            .store
            .list_alerts(AlertFilter {
                ingredient_id: Some(cream),
                sale_id: None,
                limit: 10,
            })
            .await
            .unwrap();
        // newest first
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[1].severity, AlertSeverity::High);
    }

    #[tokio::test]
    async fn test_replayed_deduction_raises_no_alert() {
        let kitchen = Kitchen::new();
        let cream = kitchen.ingredient("Cream", "1", "5", None, None).await.id;
        let scoop = Uuid::new_v4();
        kitchen
            .recipe(RecipeOwner::menu_item(scoop), &[(cream, "1")])
            .await;
        let service = kitchen.state.sale_service();

        let outcome = service
            .submit_sale(SubmitSaleInput {
                line_items: vec![line(scoop, "1", "3")],
                discount: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome.alerts.len(), 1);

        let report = service.process_deduction(outcome.sale.id).await.unwrap();
        assert!(report.alerts.is_empty());

        let alerts = kitchen
            .store
            .list_alerts(AlertFilter {
                ingredient_id: Some(cream),
                sale_id: Some(outcome.sale.id),
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
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
        (-500i64..=2000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for generating minimum stock levels
    fn min_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// An alert is raised exactly when the band gets worse
        #[test]
        fn prop_alert_iff_band_worsens(
            previous in stock_strategy(),
            new in stock_strategy(),
            min in min_strategy()
        ) {
            let c = StockChange {
                ingredient_id: Uuid::new_v4(),
                ingredient_name: "Butter".to_string(),
                unit: "kg".to_string(),
                previous_stock: previous,
                new_stock: new,
                delta: previous - new,
                min_stock_level: min,
            };
            let worse = StockBand::classify(new, min) > StockBand::classify(previous, min);
            let alert = evaluate_change(&c, None);
            prop_assert_eq!(alert.is_some(), worse);
            if let Some(alert) = alert {
                prop_assert_eq!(Some(alert.severity), StockBand::classify(new, min).severity());
            }
        }

        /// Out of stock means at or below zero, whatever the minimum
        #[test]
        fn prop_out_band_is_non_positive(stock in stock_strategy(), min in min_strategy()) {
            prop_assert_eq!(
                StockBand::classify(stock, min) == StockBand::Out,
                stock <= Decimal::ZERO
            );
        }
    }
}
