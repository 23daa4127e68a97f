//! WebAssembly module for Kitchen Stock Platform
//!
//! Provides client-side computation for:
//! - Stock band classification
//! - Reorder quantity suggestions
//! - Draft order totals
//! - Previewing what a cart will consume before it is submitted

use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, String> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("Invalid {}: {}", field, e))
}

/// Classify a stock level into "ok", "low" or "out"
#[wasm_bindgen]
pub fn classify_stock_level(current_stock: &str, min_stock_level: &str) -> Result<String, JsValue> {
    let current = parse_decimal("current_stock", current_stock).map_err(js_error)?;
    let min = parse_decimal("min_stock_level", min_stock_level).map_err(js_error)?;
    Ok(StockBand::classify(current, min).as_str().to_string())
}

/// Quantity needed to bring stock back up to par.
///
/// `max_stock_level` may be empty when the ingredient has no configured maximum.
#[wasm_bindgen]
pub fn suggest_reorder_quantity(
    current_stock: &str,
    min_stock_level: &str,
    max_stock_level: &str,
) -> Result<String, JsValue> {
    let current = parse_decimal("current_stock", current_stock).map_err(js_error)?;
    let min = parse_decimal("min_stock_level", min_stock_level).map_err(js_error)?;
    let max = if max_stock_level.trim().is_empty() {
        None
    } else {
        Some(parse_decimal("max_stock_level", max_stock_level).map_err(js_error)?)
    };

    let par = par_level(min, max);
    Ok(suggested_quantity(current, par).to_string())
}

/// Total of a draft from its lines JSON
#[wasm_bindgen]
pub fn calculate_draft_total(lines_json: &str) -> Result<String, JsValue> {
    draft_total_from_json(lines_json).map_err(js_error)
}

fn draft_total_from_json(lines_json: &str) -> Result<String, String> {
    let lines: Vec<DraftLine> = serde_json::from_str(lines_json)
        .map_err(|e| format!("Invalid lines JSON: {}", e))?;
    Ok(draft_total(&lines).to_string())
}

#[derive(Debug, Serialize)]
struct ConsumptionPreview {
    consumption: Vec<ConsumptionEntry>,
    warnings: Vec<String>,
}

/// Preview the ingredient consumption of a cart.
///
/// Takes the cart's line items and the recipes the client has cached, both as
/// JSON, and returns `{ consumption, warnings }` as JSON. Items without a
/// recipe are reported as warnings, matching what the server will do.
#[wasm_bindgen]
pub fn preview_sale_consumption(lines_json: &str, recipes_json: &str) -> Result<String, JsValue> {
    let preview = consumption_preview(lines_json, recipes_json).map_err(js_error)?;
    for warning in &preview.warnings {
        web_sys::console::warn_1(&JsValue::from_str(warning));
    }
    serde_json::to_string(&preview).map_err(|e| js_error(e.to_string()))
}

fn consumption_preview(lines_json: &str, recipes_json: &str) -> Result<ConsumptionPreview, String> {
    let lines: Vec<SaleLineItem> = serde_json::from_str(lines_json)
        .map_err(|e| format!("Invalid line items JSON: {}", e))?;
    validate_sale_lines(&lines)?;

    let recipes: Vec<RecipeLink> = serde_json::from_str(recipes_json)
        .map_err(|e| format!("Invalid recipes JSON: {}", e))?;
    let mut book = RecipeBook::new();
    for recipe in recipes {
        book.insert(recipe);
    }

    let resolution = resolve_sale(&lines, &book);
    Ok(ConsumptionPreview {
        consumption: resolution
            .aggregate()
            .into_iter()
            .map(|(ingredient_id, quantity)| ConsumptionEntry {
                ingredient_id,
                quantity,
            })
            .collect(),
        warnings: resolution.warnings.iter().map(ToString::to_string).collect(),
    })
}
