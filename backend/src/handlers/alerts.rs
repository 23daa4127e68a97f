//! HTTP handlers for stock alerts

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{ListLimit, StockAlert};
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::AlertFilter;
use crate::AppState;

/// Query parameters for listing alerts
#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub ingredient_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub limit: Option<u32>,
}

/// List alerts, newest first
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> AppResult<Json<Vec<StockAlert>>> {
    let filter = AlertFilter {
        ingredient_id: query.ingredient_id,
        sale_id: query.sale_id,
        limit: ListLimit { limit: query.limit }.effective(),
    };
    let alerts = state.inventory_service().list_alerts(filter).await?;
    Ok(Json(alerts))
}
