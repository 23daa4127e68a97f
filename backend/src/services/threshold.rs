//! Threshold monitor: turns applied stock changes into alerts

use std::sync::Arc;

use shared::{evaluate_change, StockAlert, StockChange};
use uuid::Uuid;

use crate::store::InventoryStore;

/// Alerts raised for a batch of changes
#[derive(Debug, Clone, Default)]
pub struct ThresholdOutcome {
    pub alerts: Vec<StockAlert>,
    /// Alert writes that failed; stock effects stand regardless
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct ThresholdMonitor {
    store: Arc<dyn InventoryStore>,
}

impl ThresholdMonitor {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Evaluate each change and persist an alert for every band entry.
    ///
    /// Only pass changes applied by the current call; replayed rows must not
    /// raise a second alert.
    pub async fn record(&self, changes: &[StockChange], sale_id: Option<Uuid>) -> ThresholdOutcome {
        let mut outcome = ThresholdOutcome::default();

        for change in changes {
            let Some(alert) = evaluate_change(change, sale_id) else {
                continue;
            };

            match self.store.create_alert(alert).await {
                Ok(saved) => {
                    tracing::info!(
                        ingredient_id = %saved.ingredient_id,
                        severity = saved.severity.as_str(),
                        stock_level = %saved.stock_level,
                        "Stock alert raised"
                    );
                    outcome.alerts.push(saved);
                }
                Err(e) => {
                    tracing::warn!(
                        ingredient_id = %change.ingredient_id,
                        error = %e,
                        "Failed to persist stock alert"
                    );
                    outcome.warnings.push(format!(
                        "alert for {} not recorded: {}",
                        change.ingredient_name, e
                    ));
                }
            }
        }

        outcome
    }
}
