//! Kitchen Stock service
//!
//! Records point-of-sale transactions, deducts the ingredients their recipes
//! consume, raises low-stock alerts and drafts replenishment orders for
//! suppliers.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use services::{
    DeductionEngine, InventoryService, OrderDraftService, ReplenishmentService, RetryPolicy,
    SaleService, SupplierNotifier,
};
use store::InventoryStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub notifier: Arc<dyn SupplierNotifier>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        notifier: Arc<dyn SupplierNotifier>,
        config: Config,
    ) -> Self {
        Self {
            store,
            notifier,
            config: Arc::new(config),
        }
    }

    pub fn deduction_engine(&self) -> DeductionEngine {
        DeductionEngine::new(
            self.store.clone(),
            RetryPolicy::from_config(&self.config.inventory),
        )
    }

    pub fn inventory_service(&self) -> InventoryService {
        InventoryService::new(self.store.clone())
    }

    pub fn sale_service(&self) -> SaleService {
        SaleService::new(self.store.clone(), self.deduction_engine())
    }

    pub fn replenishment_service(&self) -> ReplenishmentService {
        ReplenishmentService::new(self.store.clone())
    }

    pub fn order_draft_service(&self) -> OrderDraftService {
        OrderDraftService::new(
            self.store.clone(),
            self.notifier.clone(),
            self.config.notification.sender_name.clone(),
        )
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Kitchen Stock API v1.0"
}
