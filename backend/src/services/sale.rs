//! Sale intake: record a sale, resolve its recipes and deduct stock

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    resolve_sale, validate_non_negative_amount, validate_sale_lines, DeductionStatus,
    JournalEntry, RecipeBook, RecipeOwner, ResolutionGap, Sale, SaleLineItem, SaleTotals,
    StockAlert, StockChange,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::deduction::{DeductionEngine, DeductionReport};
use crate::store::{InventoryStore, NewSale};

#[derive(Clone)]
pub struct SaleService {
    store: Arc<dyn InventoryStore>,
    engine: DeductionEngine,
}

/// Input for recording a sale
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitSaleInput {
    #[validate(length(min = 1, message = "A sale needs at least one line item"))]
    pub line_items: Vec<SaleLineItem>,
    pub discount: Option<Decimal>,
}

/// Result of recording a sale
#[derive(Debug, Clone, Serialize)]
pub struct SaleOutcome {
    pub sale: Sale,
    pub warnings: Vec<ResolutionGap>,
    pub changes: Vec<StockChange>,
    pub alerts: Vec<StockAlert>,
    /// Alert writes that failed after stock was deducted
    pub alert_warnings: Vec<String>,
}

impl SaleService {
    pub fn new(store: Arc<dyn InventoryStore>, engine: DeductionEngine) -> Self {
        Self { store, engine }
    }

    /// Record a sale and deduct the stock it consumed.
    ///
    /// The sale and its journal are stored before any stock moves. If the
    /// deduction only partly applies, the error carries the sale id and the
    /// sale can be resumed with [`SaleService::process_deduction`].
    pub async fn submit_sale(&self, input: SubmitSaleInput) -> AppResult<SaleOutcome> {
        input.validate()?;
        validate_sale_lines(&input.line_items).map_err(|msg| {
            AppError::validation("line_items", msg, "รายการขายไม่ถูกต้อง")
        })?;
        if let Some(discount) = input.discount {
            validate_non_negative_amount(discount).map_err(|msg| {
                AppError::validation("discount", msg, "ส่วนลดต้องไม่ติดลบ")
            })?;
        }

        let totals = SaleTotals::compute(&input.line_items, input.discount);

        let owners: Vec<RecipeOwner> = input
            .line_items
            .iter()
            .flat_map(SaleLineItem::recipe_owners)
            .collect();
        let recipes: RecipeBook = self.store.get_recipes(&owners).await?.into_iter().collect();

        let resolution = resolve_sale(&input.line_items, &recipes);
        for gap in &resolution.warnings {
            tracing::warn!(warning = %gap, "Sale line not fully resolved");
        }
        let plan = resolution.aggregate();

        let sale = self
            .store
            .create_sale(NewSale {
                line_items: input.line_items,
                totals,
                resolution_warnings: resolution.warnings.clone(),
                plan,
            })
            .await?;

        tracing::info!(
            sale_id = %sale.id,
            total = %sale.totals.total,
            warnings = resolution.warnings.len(),
            "Sale recorded"
        );

        let report = self.engine.apply(sale.id).await?.ensure_complete()?;
        let sale = self.store.get_sale(sale.id).await?;

        Ok(SaleOutcome {
            sale,
            warnings: resolution.warnings,
            changes: report.changes,
            alerts: report.alerts,
            alert_warnings: report.warnings,
        })
    }

    /// Apply whatever is still pending for a sale; a no-op once applied
    pub async fn process_deduction(&self, sale_id: Uuid) -> AppResult<DeductionReport> {
        self.engine.apply(sale_id).await?.ensure_complete()
    }

    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<Sale> {
        Ok(self.store.get_sale(sale_id).await?)
    }

    pub async fn get_journal(&self, sale_id: Uuid) -> AppResult<Vec<JournalEntry>> {
        Ok(self.store.get_journal(sale_id).await?)
    }

    /// Sales whose deduction has not finished, oldest first
    pub async fn list_unfinished_sales(&self, limit: u32) -> AppResult<Vec<Sale>> {
        Ok(self
            .store
            .list_sales_by_status(
                &[
                    DeductionStatus::Pending,
                    DeductionStatus::Applying,
                    DeductionStatus::PartiallyApplied,
                ],
                limit,
            )
            .await?)
    }
}
