//! HTTP handlers for sale intake and stock deduction

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{JournalEntry, ListLimit, Sale};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::deduction::DeductionReport;
use crate::services::sale::{SaleOutcome, SubmitSaleInput};
use crate::AppState;

/// Record a sale and deduct its ingredients
pub async fn submit_sale(
    State(state): State<AppState>,
    Json(input): Json<SubmitSaleInput>,
) -> AppResult<(StatusCode, Json<SaleOutcome>)> {
    let outcome = state.sale_service().submit_sale(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Get a sale with its deduction status
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let sale = state.sale_service().get_sale(sale_id).await?;
    Ok(Json(sale))
}

/// Deduction journal of a sale
pub async fn get_journal(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let journal = state.sale_service().get_journal(sale_id).await?;
    Ok(Json(journal))
}

/// Resume (or re-run) the deduction of a sale
pub async fn process_deduction(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<DeductionReport>> {
    let report = state.sale_service().process_deduction(sale_id).await?;
    Ok(Json(report))
}

/// Sales whose deduction has not finished
pub async fn list_unfinished_sales(
    State(state): State<AppState>,
    Query(query): Query<ListLimit>,
) -> AppResult<Json<Vec<Sale>>> {
    let sales = state
        .sale_service()
        .list_unfinished_sales(query.effective())
        .await?;
    Ok(Json(sales))
}
