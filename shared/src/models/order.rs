//! Replenishment order draft models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order status. Only `Draft` is editable here; `Received` and `Cancelled`
/// are set by fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    /// Placed with the supplier, awaiting delivery
    Pending,
    Received,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Pending => "pending",
            OrderStatus::Received => "received",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(OrderStatus::Draft),
            "pending" => Some(OrderStatus::Pending),
            "received" => Some(OrderStatus::Received),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, OrderStatus::Draft)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingredient on an order draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftLine {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

impl DraftLine {
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// A replenishment proposal for one supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDraft {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub status: OrderStatus,
    pub lines: Vec<DraftLine>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub placed_at: Option<DateTime<Utc>>,
    pub supplier_notified_at: Option<DateTime<Utc>>,
}

impl OrderDraft {
    /// Sum of line totals, always derived from the current lines
    pub fn total(&self) -> Decimal {
        draft_total(&self.lines)
    }

    /// Whether anything would actually be ordered
    pub fn has_orderable_lines(&self) -> bool {
        self.lines.iter().any(|l| l.quantity > Decimal::ZERO)
    }

    pub fn line(&self, ingredient_id: Uuid) -> Option<&DraftLine> {
        self.lines.iter().find(|l| l.ingredient_id == ingredient_id)
    }

    /// Insert a line or replace the one for the same ingredient
    pub fn upsert_line(&mut self, line: DraftLine) {
        match self
            .lines
            .iter_mut()
            .find(|l| l.ingredient_id == line.ingredient_id)
        {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
    }

    /// Remove the line for an ingredient; returns whether one was present
    pub fn remove_line(&mut self, ingredient_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.ingredient_id != ingredient_id);
        self.lines.len() != before
    }
}

/// Total of a set of draft lines
pub fn draft_total(lines: &[DraftLine]) -> Decimal {
    lines.iter().map(DraftLine::line_total).sum()
}

/// Serialized view of a draft with its derived totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraftView {
    #[serde(flatten)]
    pub draft: OrderDraft,
    pub line_totals: Vec<Decimal>,
    pub total: Decimal,
}

impl From<OrderDraft> for OrderDraftView {
    fn from(draft: OrderDraft) -> Self {
        let line_totals = draft.lines.iter().map(DraftLine::line_total).collect();
        let total = draft.total();
        Self {
            draft,
            line_totals,
            total,
        }
    }
}

/// A quantity overwritten by auto-fill to par
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutofillChange {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
}
