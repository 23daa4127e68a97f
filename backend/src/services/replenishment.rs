//! Replenishment drafter: reorder suggestions, fresh drafts and auto-fill

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use shared::{
    autofill_to_par, group_by_supplier, reorder_suggestions, AutofillChange, Ingredient,
    OrderDraftView, ReorderSuggestion,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{IngredientFilter, InventoryStore, NewOrderDraft};

#[derive(Clone)]
pub struct ReplenishmentService {
    store: Arc<dyn InventoryStore>,
}

/// Drafts created by one generation run
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDrafts {
    pub drafts: Vec<OrderDraftView>,
    /// Ingredients that need reordering but have no supplier
    pub unassigned: Vec<ReorderSuggestion>,
}

/// Result of auto-filling a draft to par
#[derive(Debug, Clone, Serialize)]
pub struct AutofillReport {
    pub draft: OrderDraftView,
    pub changes: Vec<AutofillChange>,
}

impl ReplenishmentService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Ingredients at or under their minimum, with the quantity to reach par
    pub async fn suggest(&self, supplier_id: Option<Uuid>) -> AppResult<Vec<ReorderSuggestion>> {
        let ingredients = self
            .store
            .list_ingredients(IngredientFilter {
                supplier_id,
                ids: None,
            })
            .await?;
        Ok(reorder_suggestions(&ingredients))
    }

    /// Create one new draft per supplier from the current ledger
    pub async fn generate_drafts(&self, supplier_id: Option<Uuid>) -> AppResult<GeneratedDrafts> {
        if let Some(id) = supplier_id {
            self.store.get_supplier(id).await?;
        }

        let groups = group_by_supplier(self.suggest(supplier_id).await?);
        let mut drafts = Vec::with_capacity(groups.by_supplier.len());

        for (supplier_id, suggestions) in groups.by_supplier {
            let draft = self
                .store
                .create_draft(NewOrderDraft {
                    supplier_id,
                    lines: suggestions.iter().map(ReorderSuggestion::to_draft_line).collect(),
                    notes: None,
                })
                .await?;

            tracing::info!(
                draft_id = %draft.id,
                supplier_id = %supplier_id,
                lines = draft.lines.len(),
                "Replenishment draft generated"
            );
            drafts.push(draft.into());
        }

        if !groups.unassigned.is_empty() {
            tracing::warn!(
                count = groups.unassigned.len(),
                "Ingredients need reordering but have no supplier"
            );
        }

        Ok(GeneratedDrafts {
            drafts,
            unassigned: groups.unassigned,
        })
    }

    /// Overwrite every line quantity of a draft with its par suggestion
    pub async fn autofill(&self, draft_id: Uuid) -> AppResult<AutofillReport> {
        let mut draft = self.store.get_draft(draft_id).await?;
        if !draft.status.is_editable() {
            return Err(AppError::InvalidDraftTransition(format!(
                "order is {}",
                draft.status
            )));
        }

        let ids: Vec<Uuid> = draft.lines.iter().map(|l| l.ingredient_id).collect();
        let ingredients: HashMap<Uuid, Ingredient> = self
            .store
            .list_ingredients(IngredientFilter {
                supplier_id: None,
                ids: Some(ids),
            })
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let changes = autofill_to_par(&mut draft, &ingredients);
        let draft = self.store.save_draft_lines(draft_id, draft.lines).await?;

        let overwritten = changes
            .iter()
            .filter(|c| c.previous_quantity != c.new_quantity)
            .count();
        tracing::info!(
            draft_id = %draft_id,
            lines = changes.len(),
            overwritten = overwritten,
            "Draft auto-filled to par"
        );

        Ok(AutofillReport {
            draft: draft.into(),
            changes,
        })
    }
}
