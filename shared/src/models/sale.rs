//! Point-of-sale transaction models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RecipeOwner, ResolutionGap};

/// An add-on chosen for a line item (extra shot, syrup, topping)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedAddOn {
    pub add_on_id: Uuid,
    pub name: String,
    /// Quantity per unit of the parent item
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// One sold menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleLineItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub add_ons: Vec<SelectedAddOn>,
}

impl SaleLineItem {
    /// Line amount including add-ons, which scale with the item quantity
    pub fn amount(&self) -> Decimal {
        let add_ons: Decimal = self
            .add_ons
            .iter()
            .map(|a| a.quantity * a.unit_price)
            .sum();
        self.quantity * (self.unit_price + add_ons)
    }

    /// Every recipe this line may need for resolution
    pub fn recipe_owners(&self) -> impl Iterator<Item = RecipeOwner> + '_ {
        std::iter::once(RecipeOwner::menu_item(self.menu_item_id))
            .chain(self.add_ons.iter().map(|a| RecipeOwner::add_on(a.add_on_id)))
    }
}

/// Monetary totals of a sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl SaleTotals {
    /// Totals for a set of lines; the total never drops below zero
    pub fn compute(lines: &[SaleLineItem], discount: Option<Decimal>) -> Self {
        let subtotal: Decimal = lines.iter().map(SaleLineItem::amount).sum();
        let discount = discount.unwrap_or(Decimal::ZERO);
        Self {
            subtotal,
            discount,
            total: (subtotal - discount).max(Decimal::ZERO),
        }
    }
}

/// Where a sale stands with respect to its stock deduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionStatus {
    /// Recorded, nothing applied yet
    Pending,
    /// Deduction started and has not reported back
    Applying,
    /// Some journal rows applied, at least one failed
    PartiallyApplied,
    /// Every journal row applied
    Applied,
}

impl DeductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeductionStatus::Pending => "pending",
            DeductionStatus::Applying => "applying",
            DeductionStatus::PartiallyApplied => "partially_applied",
            DeductionStatus::Applied => "applied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DeductionStatus::Pending),
            "applying" => Some(DeductionStatus::Applying),
            "partially_applied" => Some(DeductionStatus::PartiallyApplied),
            "applied" => Some(DeductionStatus::Applied),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, DeductionStatus::Applied)
    }
}

/// A recorded sale. Line items and totals never change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    pub id: Uuid,
    pub line_items: Vec<SaleLineItem>,
    pub totals: SaleTotals,
    pub deduction_status: DeductionStatus,
    pub resolution_warnings: Vec<ResolutionGap>,
    pub created_at: DateTime<Utc>,
    pub deducted_at: Option<DateTime<Utc>>,
}

/// One row of a sale's deduction plan.
///
/// `applied_at` is set in the same atomic store operation that decrements
/// the ingredient, so a stamped row is never applied twice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub sale_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub applied_at: Option<DateTime<Utc>>,
    pub previous_stock: Option<Decimal>,
    pub new_stock: Option<Decimal>,
}

impl JournalEntry {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}
