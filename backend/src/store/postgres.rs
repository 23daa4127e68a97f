//! PostgreSQL entity store
//!
//! Stock is only ever changed with `current_stock = current_stock - $delta`
//! inside the transaction that stamps the journal row, so concurrent sales
//! serialize on the ingredient row lock instead of overwriting each other.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    draft_total, AlertSeverity, DeductionStatus, DraftLine, Ingredient, JournalEntry,
    NewStockAlert, OrderDraft, OrderStatus, RecipeComponent, RecipeKind, RecipeLink, RecipeOwner,
    ResolutionGap, Sale, SaleLineItem, SaleTotals, StockAlert, StockChange, Supplier,
};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{
    AlertFilter, ApplyOutcome, IngredientFilter, InventoryStore, NewIngredient, NewOrderDraft,
    NewSale, NewSupplier, StoreError, StoreResult,
};

const INGREDIENT_COLUMNS: &str = "id, name, unit, current_stock, min_stock_level, \
    max_stock_level, cost_per_unit, supplier_id, created_at, updated_at";

const SALE_COLUMNS: &str = "id, line_items, subtotal, discount, total, deduction_status, \
    resolution_warnings, created_at, deducted_at";

const DRAFT_COLUMNS: &str = "id, supplier_id, status, notes, created_at, updated_at, \
    placed_at, supplier_notified_at";

/// sqlx-backed store
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    async fn load_draft_lines(&self, draft_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<DraftLine>>> {
        let rows = sqlx::query_as::<_, DraftLineRow>(
            r#"
            SELECT draft_id, ingredient_id, ingredient_name, unit, quantity, unit_cost
            FROM order_draft_lines
            WHERE draft_id = ANY($1)
            ORDER BY draft_id, position
            "#,
        )
        .bind(draft_ids.to_vec())
        .fetch_all(&self.db)
        .await?;

        let mut lines: HashMap<Uuid, Vec<DraftLine>> = HashMap::new();
        for row in rows {
            lines.entry(row.draft_id).or_default().push(DraftLine {
                ingredient_id: row.ingredient_id,
                ingredient_name: row.ingredient_name,
                unit: row.unit,
                quantity: row.quantity,
                unit_cost: row.unit_cost,
            });
        }
        Ok(lines)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, FromRow)]
struct SupplierRow {
    id: Uuid,
    name: String,
    contact_email: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(r: SupplierRow) -> Self {
        Supplier {
            id: r.id,
            name: r.name,
            contact_email: r.contact_email,
            phone: r.phone,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct IngredientRow {
    id: Uuid,
    name: String,
    unit: String,
    current_stock: Decimal,
    min_stock_level: Decimal,
    max_stock_level: Option<Decimal>,
    cost_per_unit: Decimal,
    supplier_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IngredientRow> for Ingredient {
    fn from(r: IngredientRow) -> Self {
        Ingredient {
            id: r.id,
            name: r.name,
            unit: r.unit,
            current_stock: r.current_stock,
            min_stock_level: r.min_stock_level,
            max_stock_level: r.max_stock_level,
            cost_per_unit: r.cost_per_unit,
            supplier_id: r.supplier_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    owner_kind: String,
    owner_id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct ComponentRow {
    owner_kind: String,
    owner_id: Uuid,
    ingredient_id: Uuid,
    quantity_per_serving: Decimal,
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    line_items: Json<Vec<SaleLineItem>>,
    subtotal: Decimal,
    discount: Decimal,
    total: Decimal,
    deduction_status: String,
    resolution_warnings: Json<Vec<ResolutionGap>>,
    created_at: DateTime<Utc>,
    deducted_at: Option<DateTime<Utc>>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = StoreError;

    fn try_from(r: SaleRow) -> Result<Self, Self::Error> {
        let deduction_status = DeductionStatus::from_str(&r.deduction_status).ok_or_else(|| {
            StoreError::Corrupt(format!("sale {} has status {}", r.id, r.deduction_status))
        })?;
        Ok(Sale {
            id: r.id,
            line_items: r.line_items.0,
            totals: SaleTotals {
                subtotal: r.subtotal,
                discount: r.discount,
                total: r.total,
            },
            deduction_status,
            resolution_warnings: r.resolution_warnings.0,
            created_at: r.created_at,
            deducted_at: r.deducted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct JournalRow {
    sale_id: Uuid,
    ingredient_id: Uuid,
    quantity: Decimal,
    applied_at: Option<DateTime<Utc>>,
    previous_stock: Option<Decimal>,
    new_stock: Option<Decimal>,
}

impl From<JournalRow> for JournalEntry {
    fn from(r: JournalRow) -> Self {
        JournalEntry {
            sale_id: r.sale_id,
            ingredient_id: r.ingredient_id,
            quantity: r.quantity,
            applied_at: r.applied_at,
            previous_stock: r.previous_stock,
            new_stock: r.new_stock,
        }
    }
}

#[derive(Debug, FromRow)]
struct DecrementRow {
    name: String,
    unit: String,
    previous_stock: Decimal,
    new_stock: Decimal,
    min_stock_level: Decimal,
}

#[derive(Debug, FromRow)]
struct AlertRow {
    id: Uuid,
    ingredient_id: Uuid,
    sale_id: Option<Uuid>,
    severity: String,
    message: String,
    stock_level: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for StockAlert {
    type Error = StoreError;

    fn try_from(r: AlertRow) -> Result<Self, Self::Error> {
        let severity = AlertSeverity::from_str(&r.severity).ok_or_else(|| {
            StoreError::Corrupt(format!("alert {} has severity {}", r.id, r.severity))
        })?;
        Ok(StockAlert {
            id: r.id,
            ingredient_id: r.ingredient_id,
            sale_id: r.sale_id,
            severity,
            message: r.message,
            stock_level: r.stock_level,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DraftRow {
    id: Uuid,
    supplier_id: Uuid,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    placed_at: Option<DateTime<Utc>>,
    supplier_notified_at: Option<DateTime<Utc>>,
}

impl DraftRow {
    fn into_draft(self, lines: Vec<DraftLine>) -> StoreResult<OrderDraft> {
        let status = OrderStatus::from_str(&self.status).ok_or_else(|| {
            StoreError::Corrupt(format!("order draft {} has status {}", self.id, self.status))
        })?;
        Ok(OrderDraft {
            id: self.id,
            supplier_id: self.supplier_id,
            status,
            lines,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            placed_at: self.placed_at,
            supplier_notified_at: self.supplier_notified_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DraftLineRow {
    draft_id: Uuid,
    ingredient_id: Uuid,
    ingredient_name: String,
    unit: String,
    quantity: Decimal,
    unit_cost: Decimal,
}

async fn insert_draft_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    draft_id: Uuid,
    lines: &[DraftLine],
) -> StoreResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_draft_lines
                (draft_id, position, ingredient_id, ingredient_name, unit, quantity, unit_cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(draft_id)
        .bind(position as i32)
        .bind(line.ingredient_id)
        .bind(&line.ingredient_name)
        .bind(&line.unit)
        .bind(line.quantity)
        .bind(line.unit_cost)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// ============================================================================
// Store implementation
// ============================================================================

#[async_trait]
impl InventoryStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn create_supplier(&self, input: NewSupplier) -> StoreResult<Supplier> {
        let row = sqlx::query_as::<_, SupplierRow>(
            r#"
            INSERT INTO suppliers (id, name, contact_email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, contact_email, phone, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.contact_email)
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn get_supplier(&self, id: Uuid) -> StoreResult<Supplier> {
        sqlx::query_as::<_, SupplierRow>(
            "SELECT id, name, contact_email, phone, created_at FROM suppliers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Into::into)
        .ok_or_else(|| StoreError::NotFound("Supplier".to_string()))
    }

    async fn create_ingredient(&self, input: NewIngredient) -> StoreResult<Ingredient> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            INSERT INTO ingredients
                (id, name, unit, current_stock, min_stock_level, max_stock_level, cost_per_unit, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.unit)
        .bind(input.current_stock)
        .bind(input.min_stock_level)
        .bind(input.max_stock_level)
        .bind(input.cost_per_unit)
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Precondition(_) => StoreError::NotFound("Supplier".to_string()),
            other => other,
        })?;

        Ok(row.into())
    }

    async fn get_ingredient(&self, id: Uuid) -> StoreResult<Ingredient> {
        sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Into::into)
        .ok_or_else(|| StoreError::NotFound("Ingredient".to_string()))
    }

    async fn list_ingredients(&self, filter: IngredientFilter) -> StoreResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            SELECT {INGREDIENT_COLUMNS}
            FROM ingredients
            WHERE ($1::uuid IS NULL OR supplier_id = $1)
              AND ($2::uuid[] IS NULL OR id = ANY($2))
            ORDER BY name, id
            "#
        ))
        .bind(filter.supplier_id)
        .bind(filter.ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_ingredient(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::Precondition(_) => StoreError::Precondition(
                    "ingredient is referenced by a recipe or record".to_string(),
                ),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Ingredient".to_string()));
        }
        Ok(())
    }

    async fn upsert_recipe(&self, recipe: RecipeLink) -> StoreResult<RecipeLink> {
        let kind = recipe.owner.kind.as_str();
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO recipes (owner_kind, owner_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_kind, owner_id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(kind)
        .bind(recipe.owner.id)
        .bind(&recipe.name)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM recipe_components WHERE owner_kind = $1 AND owner_id = $2")
            .bind(kind)
            .bind(recipe.owner.id)
            .execute(&mut *tx)
            .await?;

        for (position, component) in recipe.components.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recipe_components
                    (owner_kind, owner_id, position, ingredient_id, quantity_per_serving)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(kind)
            .bind(recipe.owner.id)
            .bind(position as i32)
            .bind(component.ingredient_id)
            .bind(component.quantity_per_serving)
            .execute(&mut *tx)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::Precondition(_) => {
                    StoreError::NotFound(format!("Ingredient {}", component.ingredient_id))
                }
                other => other,
            })?;
        }

        tx.commit().await?;
        Ok(recipe)
    }

    async fn get_recipes(&self, owners: &[RecipeOwner]) -> StoreResult<Vec<RecipeLink>> {
        if owners.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = owners.iter().map(|o| o.id).collect();

        let recipes = sqlx::query_as::<_, RecipeRow>(
            "SELECT owner_kind, owner_id, name FROM recipes WHERE owner_id = ANY($1)",
        )
        .bind(ids.clone())
        .fetch_all(&self.db)
        .await?;

        let components = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT owner_kind, owner_id, ingredient_id, quantity_per_serving
            FROM recipe_components
            WHERE owner_id = ANY($1)
            ORDER BY owner_kind, owner_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_owner: HashMap<(String, Uuid), Vec<RecipeComponent>> = HashMap::new();
        for c in components {
            by_owner
                .entry((c.owner_kind, c.owner_id))
                .or_default()
                .push(RecipeComponent {
                    ingredient_id: c.ingredient_id,
                    quantity_per_serving: c.quantity_per_serving,
                });
        }

        let mut links = Vec::with_capacity(recipes.len());
        for r in recipes {
            let kind = RecipeKind::from_str(&r.owner_kind).ok_or_else(|| {
                StoreError::Corrupt(format!("recipe {} has kind {}", r.owner_id, r.owner_kind))
            })?;
            let owner = RecipeOwner { kind, id: r.owner_id };
            if !owners.contains(&owner) {
                continue;
            }
            let components = by_owner.remove(&(r.owner_kind, r.owner_id)).unwrap_or_default();
            links.push(RecipeLink {
                owner,
                name: r.name,
                components,
            });
        }
        Ok(links)
    }

    async fn create_sale(&self, input: NewSale) -> StoreResult<Sale> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            INSERT INTO sales (id, line_items, subtotal, discount, total, deduction_status, resolution_warnings)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(Json(&input.line_items))
        .bind(input.totals.subtotal)
        .bind(input.totals.discount)
        .bind(input.totals.total)
        .bind(Json(&input.resolution_warnings))
        .fetch_one(&mut *tx)
        .await?;

        for (ingredient_id, quantity) in &input.plan {
            sqlx::query(
                "INSERT INTO sale_deductions (sale_id, ingredient_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(row.id)
            .bind(ingredient_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::Precondition(_) => {
                    StoreError::NotFound(format!("Ingredient {}", ingredient_id))
                }
                other => other,
            })?;
        }

        tx.commit().await?;
        row.try_into()
    }

    async fn get_sale(&self, id: Uuid) -> StoreResult<Sale> {
        sqlx::query_as::<_, SaleRow>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound("Sale".to_string()))?
            .try_into()
    }

    async fn list_sales_by_status(
        &self,
        statuses: &[DeductionStatus],
        limit: u32,
    ) -> StoreResult<Vec<Sale>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE deduction_status = ANY($1)
            ORDER BY created_at
            LIMIT $2
            "#
        ))
        .bind(statuses)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn set_deduction_status(
        &self,
        sale_id: Uuid,
        status: DeductionStatus,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET deduction_status = $2,
                deducted_at = CASE WHEN $2 = 'applied' THEN NOW() ELSE deducted_at END
            WHERE id = $1 AND deduction_status <> 'applied'
            "#,
        )
        .bind(sale_id)
        .bind(status.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            // either missing or already applied; only the first is an error
            let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sales WHERE id = $1)")
                .bind(sale_id)
                .fetch_one(&self.db)
                .await?;
            if !exists {
                return Err(StoreError::NotFound("Sale".to_string()));
            }
        }
        Ok(())
    }

    async fn get_journal(&self, sale_id: Uuid) -> StoreResult<Vec<JournalEntry>> {
        let rows = sqlx::query_as::<_, JournalRow>(
            r#"
            SELECT sale_id, ingredient_id, quantity, applied_at, previous_stock, new_stock
            FROM sale_deductions
            WHERE sale_id = $1
            ORDER BY ingredient_id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        if rows.is_empty() {
            // distinguish an empty plan from an unknown sale
            self.get_sale(sale_id).await?;
        }
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn apply_journal_entry(
        &self,
        sale_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<ApplyOutcome> {
        let mut tx = self.db.begin().await?;

        let entry: JournalEntry = sqlx::query_as::<_, JournalRow>(
            r#"
            SELECT sale_id, ingredient_id, quantity, applied_at, previous_stock, new_stock
            FROM sale_deductions
            WHERE sale_id = $1 AND ingredient_id = $2
            FOR UPDATE
            "#,
        )
        .bind(sale_id)
        .bind(ingredient_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("Journal entry".to_string()))?
        .into();

        if entry.is_applied() {
            tx.rollback().await?;
            return Ok(ApplyOutcome::AlreadyApplied(entry));
        }

        let row = sqlx::query_as::<_, DecrementRow>(
            r#"
            UPDATE ingredients
            SET current_stock = current_stock - $1, updated_at = NOW()
            WHERE id = $2
            RETURNING name, unit, current_stock + $1 AS previous_stock,
                      current_stock AS new_stock, min_stock_level
            "#,
        )
        .bind(entry.quantity)
        .bind(ingredient_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("Ingredient".to_string()))?;

        sqlx::query(
            r#"
            UPDATE sale_deductions
            SET applied_at = NOW(), previous_stock = $3, new_stock = $4
            WHERE sale_id = $1 AND ingredient_id = $2
            "#,
        )
        .bind(sale_id)
        .bind(ingredient_id)
        .bind(row.previous_stock)
        .bind(row.new_stock)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ApplyOutcome::Applied(StockChange {
            ingredient_id,
            ingredient_name: row.name,
            unit: row.unit,
            previous_stock: row.previous_stock,
            new_stock: row.new_stock,
            delta: entry.quantity,
            min_stock_level: row.min_stock_level,
        }))
    }

    async fn create_alert(&self, alert: NewStockAlert) -> StoreResult<StockAlert> {
        sqlx::query_as::<_, AlertRow>(
            r#"
            INSERT INTO stock_alerts (id, ingredient_id, sale_id, severity, message, stock_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, ingredient_id, sale_id, severity, message, stock_level, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(alert.ingredient_id)
        .bind(alert.sale_id)
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(alert.stock_level)
        .fetch_one(&self.db)
        .await?
        .try_into()
    }

    async fn list_alerts(&self, filter: AlertFilter) -> StoreResult<Vec<StockAlert>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, ingredient_id, sale_id, severity, message, stock_level, created_at
            FROM stock_alerts
            WHERE ($1::uuid IS NULL OR ingredient_id = $1)
              AND ($2::uuid IS NULL OR sale_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(filter.ingredient_id)
        .bind(filter.sale_id)
        .bind(filter.limit as i64)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_draft(&self, input: NewOrderDraft) -> StoreResult<OrderDraft> {
        let mut tx = self.db.begin().await?;
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO order_drafts (id, supplier_id, status, notes, total)
            VALUES ($1, $2, 'draft', $3, $4)
            "#,
        )
        .bind(id)
        .bind(input.supplier_id)
        .bind(&input.notes)
        .bind(draft_total(&input.lines))
        .execute(&mut *tx)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Precondition(_) => StoreError::NotFound("Supplier".to_string()),
            other => other,
        })?;

        insert_draft_lines(&mut tx, id, &input.lines).await?;
        tx.commit().await?;

        self.get_draft(id).await
    }

    async fn get_draft(&self, id: Uuid) -> StoreResult<OrderDraft> {
        let row = sqlx::query_as::<_, DraftRow>(&format!(
            "SELECT {DRAFT_COLUMNS} FROM order_drafts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| StoreError::NotFound("Order draft".to_string()))?;

        let mut lines = self.load_draft_lines(&[id]).await?;
        row.into_draft(lines.remove(&id).unwrap_or_default())
    }

    async fn list_drafts(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> StoreResult<Vec<OrderDraft>> {
        let rows = sqlx::query_as::<_, DraftRow>(&format!(
            r#"
            SELECT {DRAFT_COLUMNS}
            FROM order_drafts
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.load_draft_lines(&ids).await?;
        rows.into_iter()
            .map(|r| {
                let draft_lines = lines.remove(&r.id).unwrap_or_default();
                r.into_draft(draft_lines)
            })
            .collect()
    }

    async fn save_draft_lines(&self, id: Uuid, lines: Vec<DraftLine>) -> StoreResult<OrderDraft> {
        let mut tx = self.db.begin().await?;

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM order_drafts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("Order draft".to_string()))?;

        if status != OrderStatus::Draft.as_str() {
            return Err(StoreError::Precondition(format!("order is {}", status)));
        }

        sqlx::query("DELETE FROM order_draft_lines WHERE draft_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_draft_lines(&mut tx, id, &lines).await?;

        sqlx::query("UPDATE order_drafts SET total = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(draft_total(&lines))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.get_draft(id).await
    }

    async fn delete_draft(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM order_drafts WHERE id = $1 AND status = 'draft'")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            let draft = self.get_draft(id).await?;
            return Err(StoreError::Precondition(format!("order is {}", draft.status)));
        }
        Ok(())
    }

    async fn mark_draft_placed(&self, id: Uuid) -> StoreResult<OrderDraft> {
        let result = sqlx::query(
            r#"
            UPDATE order_drafts
            SET status = 'pending',
                placed_at = NOW(),
                updated_at = NOW(),
                total = COALESCE(
                    (SELECT SUM(quantity * unit_cost) FROM order_draft_lines WHERE draft_id = $1), 0)
            WHERE id = $1
              AND status = 'draft'
              AND EXISTS (SELECT 1 FROM order_draft_lines WHERE draft_id = $1 AND quantity > 0)
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        let draft = self.get_draft(id).await?;
        if result.rows_affected() == 0 {
            let reason = if draft.status.is_editable() {
                "order has no lines".to_string()
            } else {
                format!("order is {}", draft.status)
            };
            return Err(StoreError::Precondition(reason));
        }
        Ok(draft)
    }

    async fn mark_supplier_notified(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE order_drafts SET supplier_notified_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Order draft".to_string()));
        }
        Ok(())
    }
}
