//! Entity store for the inventory core
//!
//! The services only talk to [`InventoryStore`]. Two implementations exist:
//! - [`PgStore`]: PostgreSQL via sqlx, used in production
//! - [`MemoryStore`]: a single-lock in-process store for tests and demos
//!
//! Ledger writes go through [`InventoryStore::apply_journal_entry`], which
//! decrements stock by a delta and stamps the journal row in one atomic unit.
//! No method writes an absolute stock value.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    ConsumptionMap, DeductionStatus, DraftLine, Ingredient, JournalEntry, NewStockAlert,
    OrderDraft, OrderStatus, RecipeLink, RecipeOwner, ResolutionGap, Sale, SaleLineItem,
    SaleTotals, StockAlert, StockChange, Supplier,
};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// Lost a race at the storage layer; safe to retry with the same delta
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// A conditional write found the record in the wrong state
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // serialization_failure, deadlock_detected
                Some("40001") | Some("40P01") => StoreError::Conflict(db_err.message().to_string()),
                // foreign_key_violation
                Some("23503") => StoreError::Precondition(db_err.message().to_string()),
                _ => StoreError::Database(err),
            },
            _ => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields for a new supplier
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub contact_email: String,
    pub phone: Option<String>,
}

/// Fields for a new ingredient
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub unit: String,
    pub current_stock: Decimal,
    pub min_stock_level: Decimal,
    pub max_stock_level: Option<Decimal>,
    pub cost_per_unit: Decimal,
    pub supplier_id: Option<Uuid>,
}

/// Ingredient list filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientFilter {
    pub supplier_id: Option<Uuid>,
    #[serde(skip)]
    pub ids: Option<Vec<Uuid>>,
}

/// A sale and its deduction plan, written together
#[derive(Debug, Clone)]
pub struct NewSale {
    pub line_items: Vec<SaleLineItem>,
    pub totals: SaleTotals,
    pub resolution_warnings: Vec<ResolutionGap>,
    pub plan: ConsumptionMap,
}

/// Alert list filter, newest first
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub ingredient_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub limit: u32,
}

/// Fields for a new order draft
#[derive(Debug, Clone)]
pub struct NewOrderDraft {
    pub supplier_id: Uuid,
    pub lines: Vec<DraftLine>,
    pub notes: Option<String>,
}

/// Result of applying one journal row
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Stock was decremented by this call
    Applied(StockChange),
    /// The row had already been applied; nothing changed
    AlreadyApplied(JournalEntry),
}

/// Typed entity store over the inventory records
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Cheap connectivity check for health reporting
    async fn ping(&self) -> StoreResult<()>;

    // Suppliers
    async fn create_supplier(&self, input: NewSupplier) -> StoreResult<Supplier>;
    async fn get_supplier(&self, id: Uuid) -> StoreResult<Supplier>;

    // Ingredients
    async fn create_ingredient(&self, input: NewIngredient) -> StoreResult<Ingredient>;
    async fn get_ingredient(&self, id: Uuid) -> StoreResult<Ingredient>;
    async fn list_ingredients(&self, filter: IngredientFilter) -> StoreResult<Vec<Ingredient>>;
    /// Fails with `Precondition` while any recipe references the ingredient
    async fn delete_ingredient(&self, id: Uuid) -> StoreResult<()>;

    // Recipes
    /// Insert or replace the recipe for its owner
    async fn upsert_recipe(&self, recipe: RecipeLink) -> StoreResult<RecipeLink>;
    /// Recipes for the given owners; owners without a recipe are absent
    async fn get_recipes(&self, owners: &[RecipeOwner]) -> StoreResult<Vec<RecipeLink>>;

    // Sales and the deduction journal
    /// Create the sale in `pending` state together with its journal rows
    async fn create_sale(&self, input: NewSale) -> StoreResult<Sale>;
    async fn get_sale(&self, id: Uuid) -> StoreResult<Sale>;
    async fn list_sales_by_status(
        &self,
        statuses: &[DeductionStatus],
        limit: u32,
    ) -> StoreResult<Vec<Sale>>;
    /// Stamps `deducted_at` when moving to `applied`
    async fn set_deduction_status(&self, sale_id: Uuid, status: DeductionStatus)
        -> StoreResult<()>;
    /// Journal rows ordered by ingredient id
    async fn get_journal(&self, sale_id: Uuid) -> StoreResult<Vec<JournalEntry>>;
    /// Atomically decrement the ingredient by the row quantity and stamp the row.
    /// A row that is already stamped is returned untouched.
    async fn apply_journal_entry(
        &self,
        sale_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<ApplyOutcome>;

    // Alerts (append-only)
    async fn create_alert(&self, alert: NewStockAlert) -> StoreResult<StockAlert>;
    async fn list_alerts(&self, filter: AlertFilter) -> StoreResult<Vec<StockAlert>>;

    // Order drafts
    async fn create_draft(&self, input: NewOrderDraft) -> StoreResult<OrderDraft>;
    async fn get_draft(&self, id: Uuid) -> StoreResult<OrderDraft>;
    async fn list_drafts(&self, status: Option<OrderStatus>, limit: u32)
        -> StoreResult<Vec<OrderDraft>>;
    /// Replace the draft's lines; `Precondition` unless the draft is in `draft` status
    async fn save_draft_lines(&self, id: Uuid, lines: Vec<DraftLine>) -> StoreResult<OrderDraft>;
    /// `Precondition` unless the draft is in `draft` status
    async fn delete_draft(&self, id: Uuid) -> StoreResult<()>;
    /// Compare-and-set `draft -> pending`, stamping `placed_at`.
    /// `Precondition` when the draft is not a draft or has nothing to order.
    async fn mark_draft_placed(&self, id: Uuid) -> StoreResult<OrderDraft>;
    async fn mark_supplier_notified(&self, id: Uuid) -> StoreResult<()>;
}
