//! Ingredient ledger and supplier models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StockBand;

/// A tracked ingredient with its on-hand quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    /// Unit of measure, e.g. "g", "ml", "pcs"
    pub unit: String,
    /// On-hand quantity. May go negative when sales outrun recorded stock.
    pub current_stock: Decimal,
    pub min_stock_level: Decimal,
    /// Explicit par level; when absent the par is derived from the minimum
    pub max_stock_level: Option<Decimal>,
    pub cost_per_unit: Decimal,
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Current stock band against the configured minimum
    pub fn band(&self) -> StockBand {
        StockBand::classify(self.current_stock, self.min_stock_level)
    }

    /// Target quantity to replenish up to
    pub fn par_level(&self) -> Decimal {
        par_level(self.min_stock_level, self.max_stock_level)
    }

    /// Quantity needed to bring this ingredient back to par
    pub fn suggested_reorder(&self) -> Decimal {
        suggested_quantity(self.current_stock, self.par_level())
    }

    /// Whether fresh draft generation should pick this ingredient up
    pub fn needs_reorder(&self) -> bool {
        self.current_stock <= self.min_stock_level
    }
}

/// A supplier that receives placed orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Par level: the explicit maximum, else twice the minimum, else the minimum
pub fn par_level(min_stock_level: Decimal, max_stock_level: Option<Decimal>) -> Decimal {
    match max_stock_level {
        Some(max) if max > Decimal::ZERO => max,
        _ if min_stock_level > Decimal::ZERO => min_stock_level * Decimal::from(2),
        _ => min_stock_level,
    }
}

/// Suggested reorder quantity, never negative
pub fn suggested_quantity(current_stock: Decimal, par: Decimal) -> Decimal {
    (par - current_stock).max(Decimal::ZERO)
}
