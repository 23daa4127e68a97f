//! Order draft lifecycle: edit while `draft`, place once, notify the supplier

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    validate_draft_line, DraftLine, Ingredient, OrderDraft, OrderDraftView, OrderStatus, Supplier,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::notification::{SupplierMessage, SupplierNotifier};
use crate::store::{IngredientFilter, InventoryStore, NewOrderDraft};

#[derive(Clone)]
pub struct OrderDraftService {
    store: Arc<dyn InventoryStore>,
    notifier: Arc<dyn SupplierNotifier>,
    sender_name: String,
}

/// One requested line; name, unit and cost default from the ingredient
#[derive(Debug, Clone, Deserialize)]
pub struct DraftLineInput {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDraftInput {
    pub supplier_id: Uuid,
    #[serde(default)]
    pub lines: Vec<DraftLineInput>,
    #[validate(length(max = 1000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

/// Result of placing a draft
#[derive(Debug, Clone, Serialize)]
pub struct PlacementOutcome {
    pub draft: OrderDraftView,
    pub supplier_notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

fn not_editable(draft: &OrderDraft) -> AppError {
    AppError::InvalidDraftTransition(format!("order is {}", draft.status))
}

impl OrderDraftService {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        notifier: Arc<dyn SupplierNotifier>,
        sender_name: String,
    ) -> Self {
        Self {
            store,
            notifier,
            sender_name,
        }
    }

    pub async fn create_draft(&self, input: CreateDraftInput) -> AppResult<OrderDraftView> {
        input.validate()?;
        self.store.get_supplier(input.supplier_id).await?;

        let ids: Vec<Uuid> = input.lines.iter().map(|l| l.ingredient_id).collect();
        let ingredients = self.load_ingredients(ids).await?;

        let mut draft_lines: Vec<DraftLine> = Vec::with_capacity(input.lines.len());
        for line in input.lines {
            let ingredient = ingredients
                .get(&line.ingredient_id)
                .ok_or_else(|| AppError::NotFound(format!("Ingredient {}", line.ingredient_id)))?;
            let line = build_line(ingredient, line.quantity, line.unit_cost)?;
            match draft_lines.iter_mut().find(|l| l.ingredient_id == line.ingredient_id) {
                Some(existing) => *existing = line,
                None => draft_lines.push(line),
            }
        }

        let draft = self
            .store
            .create_draft(NewOrderDraft {
                supplier_id: input.supplier_id,
                lines: draft_lines,
                notes: input.notes,
            })
            .await?;

        tracing::info!(draft_id = %draft.id, supplier_id = %draft.supplier_id, "Order draft created");
        Ok(draft.into())
    }

    pub async fn get_draft(&self, draft_id: Uuid) -> AppResult<OrderDraftView> {
        Ok(self.store.get_draft(draft_id).await?.into())
    }

    pub async fn list_drafts(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> AppResult<Vec<OrderDraftView>> {
        let drafts = self.store.list_drafts(status, limit).await?;
        Ok(drafts.into_iter().map(OrderDraftView::from).collect())
    }

    /// Add a line or replace the existing line for the same ingredient
    pub async fn upsert_line(
        &self,
        draft_id: Uuid,
        input: DraftLineInput,
    ) -> AppResult<OrderDraftView> {
        let mut draft = self.store.get_draft(draft_id).await?;
        if !draft.status.is_editable() {
            return Err(not_editable(&draft));
        }

        let ingredient = self.store.get_ingredient(input.ingredient_id).await?;
        draft.upsert_line(build_line(&ingredient, input.quantity, input.unit_cost)?);

        Ok(self.store.save_draft_lines(draft_id, draft.lines).await?.into())
    }

    pub async fn remove_line(&self, draft_id: Uuid, ingredient_id: Uuid) -> AppResult<OrderDraftView> {
        let mut draft = self.store.get_draft(draft_id).await?;
        if !draft.status.is_editable() {
            return Err(not_editable(&draft));
        }
        if !draft.remove_line(ingredient_id) {
            return Err(AppError::NotFound("Draft line".to_string()));
        }

        Ok(self.store.save_draft_lines(draft_id, draft.lines).await?.into())
    }

    pub async fn delete_draft(&self, draft_id: Uuid) -> AppResult<()> {
        let draft = self.store.get_draft(draft_id).await?;
        if !draft.status.is_editable() {
            return Err(not_editable(&draft));
        }
        self.store.delete_draft(draft_id).await?;
        tracing::info!(draft_id = %draft_id, "Order draft deleted");
        Ok(())
    }

    /// Move a draft to `pending` and notify its supplier.
    ///
    /// Only the caller that wins the `draft -> pending` compare-and-set sends
    /// the notification. A failed notification leaves the order placed.
    pub async fn place_draft(&self, draft_id: Uuid) -> AppResult<PlacementOutcome> {
        let draft = self.store.get_draft(draft_id).await?;
        if !draft.status.is_editable() {
            return Err(not_editable(&draft));
        }
        if !draft.has_orderable_lines() {
            return Err(AppError::InvalidDraftTransition(
                "order has no lines with a quantity to order".to_string(),
            ));
        }
        let supplier = self.store.get_supplier(draft.supplier_id).await?;

        let placed = self.store.mark_draft_placed(draft_id).await?;
        tracing::info!(
            draft_id = %draft_id,
            supplier_id = %supplier.id,
            total = %placed.total(),
            "Order placed"
        );

        let message = compose_message(&self.sender_name, &supplier, &placed);
        let (supplier_notified, notification_error) = match self.notifier.notify(&message).await {
            Ok(()) => (true, None),
            Err(e) => {
                tracing::warn!(draft_id = %draft_id, error = %e, "Supplier notification failed");
                (false, Some(e.to_string()))
            }
        };

        let mut draft = placed;
        if supplier_notified {
            // the order went out; a missing stamp must not read as a failed placement
            match self.store.mark_supplier_notified(draft_id).await {
                Ok(()) => {
                    if let Ok(stamped) = self.store.get_draft(draft_id).await {
                        draft = stamped;
                    }
                }
                Err(e) => tracing::warn!(
                    draft_id = %draft_id,
                    error = %e,
                    "Supplier notified but the notification was not recorded"
                ),
            }
        }

        Ok(PlacementOutcome {
            draft: draft.into(),
            supplier_notified,
            notification_error,
        })
    }

    async fn load_ingredients(&self, ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, Ingredient>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self
            .store
            .list_ingredients(IngredientFilter {
                supplier_id: None,
                ids: Some(ids),
            })
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect())
    }
}

fn build_line(
    ingredient: &Ingredient,
    quantity: Decimal,
    unit_cost: Option<Decimal>,
) -> AppResult<DraftLine> {
    let line = DraftLine {
        ingredient_id: ingredient.id,
        ingredient_name: ingredient.name.clone(),
        unit: ingredient.unit.clone(),
        quantity,
        unit_cost: unit_cost.unwrap_or(ingredient.cost_per_unit),
    };
    validate_draft_line(&line)
        .map_err(|msg| AppError::validation("quantity", msg, "จำนวนสั่งซื้อไม่ถูกต้อง"))?;
    Ok(line)
}

/// Plain-text purchase order for the supplier
pub fn compose_message(sender_name: &str, supplier: &Supplier, draft: &OrderDraft) -> SupplierMessage {
    let reference = draft.id.simple().to_string();
    let reference = &reference[..8];

    let mut body = format!("Hello {},\n\nPlease supply the following:\n", supplier.name);
    for line in draft.lines.iter().filter(|l| l.quantity > Decimal::ZERO) {
        body.push_str(&format!(
            "- {}: {} {} @ {} = {}\n",
            line.ingredient_name,
            line.quantity,
            line.unit,
            line.unit_cost,
            line.line_total()
        ));
    }
    body.push_str(&format!("\nOrder total: {}\n", draft.total()));
    if let Some(notes) = &draft.notes {
        body.push_str(&format!("Notes: {}\n", notes));
    }
    body.push_str(&format!("\nThank you,\n{}", sender_name));

    SupplierMessage {
        recipient: supplier.contact_email.clone(),
        subject: format!("Purchase order {} from {}", reference, sender_name),
        body,
    }
}
