//! HTTP handlers for replenishment order drafts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{ListLimit, OrderDraftView, OrderStatus};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::order_draft::{CreateDraftInput, DraftLineInput, PlacementOutcome};
use crate::services::replenishment::{AutofillReport, GeneratedDrafts};
use crate::AppState;

/// Create a draft by hand
pub async fn create_draft(
    State(state): State<AppState>,
    Json(input): Json<CreateDraftInput>,
) -> AppResult<(StatusCode, Json<OrderDraftView>)> {
    let draft = state.order_draft_service().create_draft(input).await?;
    Ok((StatusCode::CREATED, Json(draft)))
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateDraftsRequest {
    pub supplier_id: Option<Uuid>,
}

/// Generate fresh drafts from ingredients at or under their minimum
pub async fn generate_drafts(
    State(state): State<AppState>,
    body: Option<Json<GenerateDraftsRequest>>,
) -> AppResult<(StatusCode, Json<GeneratedDrafts>)> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let generated = state
        .replenishment_service()
        .generate_drafts(request.supplier_id)
        .await?;
    Ok((StatusCode::CREATED, Json(generated)))
}

/// Query parameters for listing drafts
#[derive(Debug, Deserialize)]
pub struct ListDraftsQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

/// List drafts, newest first
pub async fn list_drafts(
    State(state): State<AppState>,
    Query(query): Query<ListDraftsQuery>,
) -> AppResult<Json<Vec<OrderDraftView>>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(OrderStatus::from_str(s).ok_or_else(|| AppError::Validation {
            field: "status".to_string(),
            message: format!("Unknown order status: {}", s),
            message_th: format!("ไม่รู้จักสถานะใบสั่งซื้อ: {}", s),
        })?),
        None => None,
    };
    let drafts = state
        .order_draft_service()
        .list_drafts(status, ListLimit { limit: query.limit }.effective())
        .await?;
    Ok(Json(drafts))
}

/// Get a draft by ID
pub async fn get_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> AppResult<Json<OrderDraftView>> {
    let draft = state.order_draft_service().get_draft(draft_id).await?;
    Ok(Json(draft))
}

/// Delete a draft that has not been placed
pub async fn delete_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.order_draft_service().delete_draft(draft_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add or replace a line
pub async fn upsert_line(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
    Json(input): Json<DraftLineInput>,
) -> AppResult<Json<OrderDraftView>> {
    let draft = state.order_draft_service().upsert_line(draft_id, input).await?;
    Ok(Json(draft))
}

/// Remove a line
pub async fn remove_line(
    State(state): State<AppState>,
    Path((draft_id, ingredient_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<OrderDraftView>> {
    let draft = state
        .order_draft_service()
        .remove_line(draft_id, ingredient_id)
        .await?;
    Ok(Json(draft))
}

/// Overwrite every line quantity with the par suggestion
pub async fn autofill_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> AppResult<Json<AutofillReport>> {
    let report = state.replenishment_service().autofill(draft_id).await?;
    Ok(Json(report))
}

/// Place a draft with its supplier
pub async fn place_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> AppResult<Json<PlacementOutcome>> {
    let outcome = state.order_draft_service().place_draft(draft_id).await?;
    Ok(Json(outcome))
}
