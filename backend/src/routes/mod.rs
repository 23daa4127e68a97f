//! Route definitions for the Kitchen Stock service

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Suppliers
        .nest("/suppliers", supplier_routes())
        // Ingredients and stock levels
        .nest("/ingredients", ingredient_routes())
        // Recipes
        .nest("/recipes", recipe_routes())
        // Sales and deduction
        .nest("/sales", sale_routes())
        // Stock alerts
        .route("/alerts", get(handlers::list_alerts))
        // Replenishment drafts
        .nest("/drafts", draft_routes())
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_supplier))
        .route("/:supplier_id", get(handlers::get_supplier))
}

fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
        .route("/overview", get(handlers::stock_overview))
        .route(
            "/:ingredient_id",
            get(handlers::get_ingredient).delete(handlers::delete_ingredient),
        )
}

fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", put(handlers::upsert_recipe))
        .route("/:kind/:owner_id", get(handlers::get_recipe))
}

fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::submit_sale))
        .route("/unfinished", get(handlers::list_unfinished_sales))
        .route("/:sale_id", get(handlers::get_sale))
        .route("/:sale_id/journal", get(handlers::get_journal))
        .route("/:sale_id/deduct", post(handlers::process_deduction))
}

fn draft_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_drafts).post(handlers::create_draft))
        .route("/generate", post(handlers::generate_drafts))
        .route(
            "/:draft_id",
            get(handlers::get_draft).delete(handlers::delete_draft),
        )
        .route("/:draft_id/lines", put(handlers::upsert_line))
        .route(
            "/:draft_id/lines/:ingredient_id",
            delete(handlers::remove_line),
        )
        .route("/:draft_id/autofill", post(handlers::autofill_draft))
        .route("/:draft_id/place", post(handlers::place_draft))
}
