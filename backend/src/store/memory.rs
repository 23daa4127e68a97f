//! In-process entity store
//!
//! All state sits behind one `tokio::sync::Mutex`, so every trait method is a
//! single atomic step. Fault injection hooks let tests force write conflicts
//! and hard failures on individual ingredients.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    DeductionStatus, DraftLine, Ingredient, JournalEntry, NewStockAlert, OrderDraft, OrderStatus,
    RecipeLink, RecipeOwner, Sale, StockAlert, StockChange, Supplier,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AlertFilter, ApplyOutcome, IngredientFilter, InventoryStore, NewIngredient, NewOrderDraft,
    NewSale, NewSupplier, StoreError, StoreResult,
};

#[derive(Default)]
struct MemoryState {
    suppliers: HashMap<Uuid, Supplier>,
    ingredients: HashMap<Uuid, Ingredient>,
    recipes: HashMap<RecipeOwner, RecipeLink>,
    sales: HashMap<Uuid, Sale>,
    journal: HashMap<Uuid, BTreeMap<Uuid, JournalEntry>>,
    alerts: Vec<StockAlert>,
    drafts: HashMap<Uuid, OrderDraft>,
}

#[derive(Default)]
struct FaultPlan {
    /// Remaining `Conflict` responses per ingredient
    conflicts: HashMap<Uuid, u32>,
    /// Remaining `Unavailable` responses per ingredient
    failures: HashMap<Uuid, u32>,
    fail_alert_writes: bool,
    /// Sale status writes to this status fail
    fail_status: Option<DeductionStatus>,
    fail_supplier_stamps: bool,
}

/// Store that keeps everything in memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    faults: Mutex<FaultPlan>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` ledger writes to an ingredient report a conflict
    pub async fn inject_conflicts(&self, ingredient_id: Uuid, count: u32) {
        self.faults.lock().await.conflicts.insert(ingredient_id, count);
    }

    /// Make the next `count` ledger writes to an ingredient fail outright
    pub async fn inject_failures(&self, ingredient_id: Uuid, count: u32) {
        self.faults.lock().await.failures.insert(ingredient_id, count);
    }

    pub async fn clear_faults(&self) {
        *self.faults.lock().await = FaultPlan::default();
    }

    pub async fn fail_alert_writes(&self, fail: bool) {
        self.faults.lock().await.fail_alert_writes = fail;
    }

    /// Make every write of `status` to a sale fail; `None` clears it
    pub async fn fail_status_writes(&self, status: Option<DeductionStatus>) {
        self.faults.lock().await.fail_status = status;
    }

    /// Make recording a supplier notification on a draft fail
    pub async fn fail_supplier_stamps(&self, fail: bool) {
        self.faults.lock().await.fail_supplier_stamps = fail;
    }

    async fn take_fault(&self, ingredient_id: Uuid) -> Option<StoreError> {
        let mut faults = self.faults.lock().await;
        if let Some(n) = faults.conflicts.get_mut(&ingredient_id) {
            if *n > 0 {
                *n -= 1;
                return Some(StoreError::Conflict(format!(
                    "concurrent update on ingredient {}",
                    ingredient_id
                )));
            }
        }
        if let Some(n) = faults.failures.get_mut(&ingredient_id) {
            if *n > 0 {
                *n -= 1;
                return Some(StoreError::Unavailable(format!(
                    "ledger write rejected for ingredient {}",
                    ingredient_id
                )));
            }
        }
        None
    }
}

fn not_found(what: &str) -> StoreError {
    StoreError::NotFound(what.to_string())
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_supplier(&self, input: NewSupplier) -> StoreResult<Supplier> {
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: input.name,
            contact_email: input.contact_email,
            phone: input.phone,
            created_at: Utc::now(),
        };
        let mut state = self.state.lock().await;
        state.suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    async fn get_supplier(&self, id: Uuid) -> StoreResult<Supplier> {
        let state = self.state.lock().await;
        state.suppliers.get(&id).cloned().ok_or_else(|| not_found("Supplier"))
    }

    async fn create_ingredient(&self, input: NewIngredient) -> StoreResult<Ingredient> {
        let mut state = self.state.lock().await;
        if let Some(supplier_id) = input.supplier_id {
            if !state.suppliers.contains_key(&supplier_id) {
                return Err(not_found("Supplier"));
            }
        }
        let now = Utc::now();
        let ingredient = Ingredient {
            id: Uuid::new_v4(),
            name: input.name,
            unit: input.unit,
            current_stock: input.current_stock,
            min_stock_level: input.min_stock_level,
            max_stock_level: input.max_stock_level,
            cost_per_unit: input.cost_per_unit,
            supplier_id: input.supplier_id,
            created_at: now,
            updated_at: now,
        };
        state.ingredients.insert(ingredient.id, ingredient.clone());
        Ok(ingredient)
    }

    async fn get_ingredient(&self, id: Uuid) -> StoreResult<Ingredient> {
        let state = self.state.lock().await;
        state.ingredients.get(&id).cloned().ok_or_else(|| not_found("Ingredient"))
    }

    async fn list_ingredients(&self, filter: IngredientFilter) -> StoreResult<Vec<Ingredient>> {
        let state = self.state.lock().await;
        let ids: Option<HashSet<Uuid>> = filter.ids.map(|ids| ids.into_iter().collect());
        let mut ingredients: Vec<Ingredient> = state
            .ingredients
            .values()
            .filter(|i| filter.supplier_id.map_or(true, |s| i.supplier_id == Some(s)))
            .filter(|i| ids.as_ref().map_or(true, |ids| ids.contains(&i.id)))
            .cloned()
            .collect();
        ingredients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(ingredients)
    }

    async fn delete_ingredient(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let referenced = state
            .recipes
            .values()
            .any(|r| r.components.iter().any(|c| c.ingredient_id == id));
        if referenced {
            return Err(StoreError::Precondition(
                "ingredient is referenced by a recipe".to_string(),
            ));
        }
        state
            .ingredients
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Ingredient"))
    }

    async fn upsert_recipe(&self, recipe: RecipeLink) -> StoreResult<RecipeLink> {
        let mut state = self.state.lock().await;
        if let Some(missing) = recipe
            .components
            .iter()
            .find(|c| !state.ingredients.contains_key(&c.ingredient_id))
        {
            return Err(StoreError::NotFound(format!("Ingredient {}", missing.ingredient_id)));
        }
        state.recipes.insert(recipe.owner, recipe.clone());
        Ok(recipe)
    }

    async fn get_recipes(&self, owners: &[RecipeOwner]) -> StoreResult<Vec<RecipeLink>> {
        let state = self.state.lock().await;
        let unique: HashSet<&RecipeOwner> = owners.iter().collect();
        Ok(unique
            .into_iter()
            .filter_map(|owner| state.recipes.get(owner).cloned())
            .collect())
    }

    async fn create_sale(&self, input: NewSale) -> StoreResult<Sale> {
        let mut state = self.state.lock().await;
        if let Some(missing) = input.plan.keys().find(|id| !state.ingredients.contains_key(id)) {
            return Err(StoreError::NotFound(format!("Ingredient {}", missing)));
        }

        let sale = Sale {
            id: Uuid::new_v4(),
            line_items: input.line_items,
            totals: input.totals,
            deduction_status: DeductionStatus::Pending,
            resolution_warnings: input.resolution_warnings,
            created_at: Utc::now(),
            deducted_at: None,
        };
        let journal = input
            .plan
            .into_iter()
            .map(|(ingredient_id, quantity)| {
                (
                    ingredient_id,
                    JournalEntry {
                        sale_id: sale.id,
                        ingredient_id,
                        quantity,
                        applied_at: None,
                        previous_stock: None,
                        new_stock: None,
                    },
                )
            })
            .collect();
        state.journal.insert(sale.id, journal);
        state.sales.insert(sale.id, sale.clone());
        Ok(sale)
    }

    async fn get_sale(&self, id: Uuid) -> StoreResult<Sale> {
        let state = self.state.lock().await;
        state.sales.get(&id).cloned().ok_or_else(|| not_found("Sale"))
    }

    async fn list_sales_by_status(
        &self,
        statuses: &[DeductionStatus],
        limit: u32,
    ) -> StoreResult<Vec<Sale>> {
        let state = self.state.lock().await;
        let mut sales: Vec<Sale> = state
            .sales
            .values()
            .filter(|s| statuses.contains(&s.deduction_status))
            .cloned()
            .collect();
        sales.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sales.truncate(limit as usize);
        Ok(sales)
    }

    async fn set_deduction_status(
        &self,
        sale_id: Uuid,
        status: DeductionStatus,
    ) -> StoreResult<()> {
        if self.faults.lock().await.fail_status == Some(status) {
            return Err(StoreError::Unavailable(format!(
                "status write {} rejected",
                status.as_str()
            )));
        }
        let mut state = self.state.lock().await;
        let sale = state.sales.get_mut(&sale_id).ok_or_else(|| not_found("Sale"))?;
        // a finished sale never moves back
        if sale.deduction_status == DeductionStatus::Applied {
            return Ok(());
        }
        sale.deduction_status = status;
        if status == DeductionStatus::Applied {
            sale.deducted_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn get_journal(&self, sale_id: Uuid) -> StoreResult<Vec<JournalEntry>> {
        let state = self.state.lock().await;
        if !state.sales.contains_key(&sale_id) {
            return Err(not_found("Sale"));
        }
        Ok(state
            .journal
            .get(&sale_id)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn apply_journal_entry(
        &self,
        sale_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<ApplyOutcome> {
        if let Some(fault) = self.take_fault(ingredient_id).await {
            return Err(fault);
        }

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let entry = state
            .journal
            .get_mut(&sale_id)
            .and_then(|rows| rows.get_mut(&ingredient_id))
            .ok_or_else(|| not_found("Journal entry"))?;
        if entry.is_applied() {
            return Ok(ApplyOutcome::AlreadyApplied(entry.clone()));
        }

        let ingredient = state
            .ingredients
            .get_mut(&ingredient_id)
            .ok_or_else(|| not_found("Ingredient"))?;
        let previous_stock = ingredient.current_stock;
        ingredient.current_stock = previous_stock.checked_sub(entry.quantity).ok_or_else(|| {
            StoreError::Precondition(format!("stock of ingredient {} out of range", ingredient_id))
        })?;
        ingredient.updated_at = Utc::now();

        entry.applied_at = Some(ingredient.updated_at);
        entry.previous_stock = Some(previous_stock);
        entry.new_stock = Some(ingredient.current_stock);

        Ok(ApplyOutcome::Applied(StockChange {
            ingredient_id,
            ingredient_name: ingredient.name.clone(),
            unit: ingredient.unit.clone(),
            previous_stock,
            new_stock: ingredient.current_stock,
            delta: entry.quantity,
            min_stock_level: ingredient.min_stock_level,
        }))
    }

    async fn create_alert(&self, alert: NewStockAlert) -> StoreResult<StockAlert> {
        if self.faults.lock().await.fail_alert_writes {
            return Err(StoreError::Unavailable("alert writes disabled".to_string()));
        }
        let alert = StockAlert {
            id: Uuid::new_v4(),
            ingredient_id: alert.ingredient_id,
            sale_id: alert.sale_id,
            severity: alert.severity,
            message: alert.message,
            stock_level: alert.stock_level,
            created_at: Utc::now(),
        };
        self.state.lock().await.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn list_alerts(&self, filter: AlertFilter) -> StoreResult<Vec<StockAlert>> {
        let state = self.state.lock().await;
        Ok(state
            .alerts
            .iter()
            .rev()
            .filter(|a| filter.ingredient_id.map_or(true, |id| a.ingredient_id == id))
            .filter(|a| filter.sale_id.map_or(true, |id| a.sale_id == Some(id)))
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn create_draft(&self, input: NewOrderDraft) -> StoreResult<OrderDraft> {
        let mut state = self.state.lock().await;
        if !state.suppliers.contains_key(&input.supplier_id) {
            return Err(not_found("Supplier"));
        }
        let now = Utc::now();
        let draft = OrderDraft {
            id: Uuid::new_v4(),
            supplier_id: input.supplier_id,
            status: OrderStatus::Draft,
            lines: input.lines,
            notes: input.notes,
            created_at: now,
            updated_at: now,
            placed_at: None,
            supplier_notified_at: None,
        };
        state.drafts.insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn get_draft(&self, id: Uuid) -> StoreResult<OrderDraft> {
        let state = self.state.lock().await;
        state.drafts.get(&id).cloned().ok_or_else(|| not_found("Order draft"))
    }

    async fn list_drafts(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> StoreResult<Vec<OrderDraft>> {
        let state = self.state.lock().await;
        let mut drafts: Vec<OrderDraft> = state
            .drafts
            .values()
            .filter(|d| status.map_or(true, |s| d.status == s))
            .cloned()
            .collect();
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        drafts.truncate(limit as usize);
        Ok(drafts)
    }

    async fn save_draft_lines(&self, id: Uuid, lines: Vec<DraftLine>) -> StoreResult<OrderDraft> {
        let mut state = self.state.lock().await;
        let draft = state.drafts.get_mut(&id).ok_or_else(|| not_found("Order draft"))?;
        if !draft.status.is_editable() {
            return Err(StoreError::Precondition(format!("order is {}", draft.status)));
        }
        draft.lines = lines;
        draft.updated_at = Utc::now();
        Ok(draft.clone())
    }

    async fn delete_draft(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let draft = state.drafts.get(&id).ok_or_else(|| not_found("Order draft"))?;
        if !draft.status.is_editable() {
            return Err(StoreError::Precondition(format!("order is {}", draft.status)));
        }
        state.drafts.remove(&id);
        Ok(())
    }

    async fn mark_draft_placed(&self, id: Uuid) -> StoreResult<OrderDraft> {
        let mut state = self.state.lock().await;
        let draft = state.drafts.get_mut(&id).ok_or_else(|| not_found("Order draft"))?;
        if !draft.status.is_editable() {
            return Err(StoreError::Precondition(format!("order is {}", draft.status)));
        }
        if !draft.has_orderable_lines() {
            return Err(StoreError::Precondition("order has no lines".to_string()));
        }
        let now = Utc::now();
        draft.status = OrderStatus::Pending;
        draft.placed_at = Some(now);
        draft.updated_at = now;
        Ok(draft.clone())
    }

    async fn mark_supplier_notified(&self, id: Uuid) -> StoreResult<()> {
        if self.faults.lock().await.fail_supplier_stamps {
            return Err(StoreError::Unavailable("supplier stamps disabled".to_string()));
        }
        let mut state = self.state.lock().await;
        let draft = state.drafts.get_mut(&id).ok_or_else(|| not_found("Order draft"))?;
        draft.supplier_notified_at = Some(Utc::now());
        Ok(())
    }
}
