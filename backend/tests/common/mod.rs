//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ks_server::config::Config;
use ks_server::services::notification::{NotifyError, SupplierMessage, SupplierNotifier};
use ks_server::services::LogNotifier;
use ks_server::store::{InventoryStore, MemoryStore, NewIngredient, NewSupplier};
use ks_server::AppState;
use rust_decimal::Decimal;
use shared::{
    Ingredient, RecipeComponent, RecipeLink, RecipeOwner, SaleLineItem, SelectedAddOn, Supplier,
};
use tokio::sync::Mutex;
use uuid::Uuid;

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Notifier that records every message and can be told to fail
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SupplierMessage>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl SupplierNotifier for RecordingNotifier {
    async fn notify(&self, message: &SupplierMessage) -> Result<(), NotifyError> {
        self.sent.lock().await.push(message.clone());
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 503,
                body: "supplier inbox unavailable".to_string(),
            });
        }
        Ok(())
    }
}

pub struct Kitchen {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl Kitchen {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(LogNotifier))
    }

    pub fn with_notifier(notifier: Arc<dyn SupplierNotifier>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut config = Config::in_memory();
        config.inventory.retry_backoff_ms = 1;
        let state = AppState::new(store.clone(), notifier, config);
        Self { store, state }
    }

    pub async fn supplier(&self, name: &str) -> Supplier {
        self.store
            .create_supplier(NewSupplier {
                name: name.to_string(),
                contact_email: format!("{}@suppliers.example", name.to_lowercase().replace(' ', ".")),
                phone: None,
            })
            .await
            .unwrap()
    }

    pub async fn ingredient(
        &self,
        name: &str,
        current: &str,
        min: &str,
        max: Option<&str>,
        supplier_id: Option<Uuid>,
    ) -> Ingredient {
        self.store
            .create_ingredient(NewIngredient {
                name: name.to_string(),
                unit: "kg".to_string(),
                current_stock: dec(current),
                min_stock_level: dec(min),
                max_stock_level: max.map(dec),
                cost_per_unit: dec("2.50"),
                supplier_id,
            })
            .await
            .unwrap()
    }

    pub async fn recipe(&self, owner: RecipeOwner, components: &[(Uuid, &str)]) -> RecipeLink {
        self.store
            .upsert_recipe(RecipeLink {
                owner,
                name: "recipe".to_string(),
                components: components
                    .iter()
                    .map(|(id, qty)| RecipeComponent {
                        ingredient_id: *id,
                        quantity_per_serving: dec(qty),
                    })
                    .collect(),
            })
            .await
            .unwrap()
    }

    pub async fn stock(&self, ingredient_id: Uuid) -> Decimal {
        self.store
            .get_ingredient(ingredient_id)
            .await
            .unwrap()
            .current_stock
    }
}

pub fn line(menu_item_id: Uuid, quantity: &str, unit_price: &str) -> SaleLineItem {
    SaleLineItem {
        menu_item_id,
        name: "Latte".to_string(),
        quantity: dec(quantity),
        unit_price: dec(unit_price),
        add_ons: Vec::new(),
    }
}

pub fn add_on(add_on_id: Uuid, quantity: &str, unit_price: &str) -> SelectedAddOn {
    SelectedAddOn {
        add_on_id,
        name: "Extra shot".to_string(),
        quantity: dec(quantity),
        unit_price: dec(unit_price),
    }
}
