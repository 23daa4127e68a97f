//! Stock bands and low-stock alert models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock level classification against an ingredient's minimum.
///
/// Ordered from best to worst so that `a < b` means `b` is the worse band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBand {
    Ok,
    Low,
    Out,
}

impl StockBand {
    /// `stock <= 0` is out, `0 < stock <= min` is low, everything else is ok
    pub fn classify(stock: Decimal, min_stock_level: Decimal) -> Self {
        if stock <= Decimal::ZERO {
            StockBand::Out
        } else if stock <= min_stock_level {
            StockBand::Low
        } else {
            StockBand::Ok
        }
    }

    /// Alert severity raised on entering this band
    pub fn severity(&self) -> Option<AlertSeverity> {
        match self {
            StockBand::Ok => None,
            StockBand::Low => Some(AlertSeverity::High),
            StockBand::Out => Some(AlertSeverity::Critical),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockBand::Ok => "ok",
            StockBand::Low => "low",
            StockBand::Out => "out",
        }
    }
}

impl std::fmt::Display for StockBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "high" => Some(AlertSeverity::High),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

/// A persisted stock alert. Alerts are append-only history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockAlert {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    /// Sale whose deduction raised the alert
    pub sale_id: Option<Uuid>,
    pub severity: AlertSeverity,
    pub message: String,
    pub stock_level: Decimal,
    pub created_at: DateTime<Utc>,
}

/// An alert that has been decided on but not yet written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewStockAlert {
    pub ingredient_id: Uuid,
    pub sale_id: Option<Uuid>,
    pub severity: AlertSeverity,
    pub message: String,
    pub stock_level: Decimal,
}

/// Before/after view of one ingredient's stock, as seen by the threshold check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockChange {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit: String,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    /// Amount removed; `new_stock = previous_stock - delta`
    pub delta: Decimal,
    pub min_stock_level: Decimal,
}

impl StockChange {
    pub fn previous_band(&self) -> StockBand {
        StockBand::classify(self.previous_stock, self.min_stock_level)
    }

    pub fn new_band(&self) -> StockBand {
        StockBand::classify(self.new_stock, self.min_stock_level)
    }
}

/// Decide whether a stock change raises an alert.
///
/// An alert is produced only when the change moves the ingredient into a
/// worse band than it was in before (ok -> low, ok -> out, low -> out).
pub fn evaluate_change(change: &StockChange, sale_id: Option<Uuid>) -> Option<NewStockAlert> {
    let previous = change.previous_band();
    let current = change.new_band();
    if current <= previous {
        return None;
    }

    let severity = current.severity()?;
    let message = match current {
        StockBand::Out => format!(
            "{} is out of stock ({} {})",
            change.ingredient_name, change.new_stock, change.unit
        ),
        _ => format!(
            "{} is running low ({} {} left, minimum {})",
            change.ingredient_name, change.new_stock, change.unit, change.min_stock_level
        ),
    };

    Some(NewStockAlert {
        ingredient_id: change.ingredient_id,
        sale_id,
        severity,
        message,
        stock_level: change.new_stock,
    })
}
