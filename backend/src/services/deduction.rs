//! Stock deduction engine
//!
//! A sale is written together with its deduction journal: one row per
//! ingredient, holding the aggregated quantity. Applying a row is a single
//! store operation that decrements stock by the row's delta and stamps the
//! row, so the journal always tells which ingredients are done.
//!
//! `apply` is also the resume path. Rows already stamped are skipped; the
//! rest are applied in ingredient id order.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use shared::{DeductionStatus, JournalEntry, StockAlert, StockChange};
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::error::{AppError, AppResult};
use crate::services::threshold::ThresholdMonitor;
use crate::store::{ApplyOutcome, InventoryStore, StoreError};

/// How ledger write conflicts are retried
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Sleep before attempt `n + 1` is `backoff * n`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &InventoryConfig) -> Self {
        Self {
            max_attempts: config.max_write_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&InventoryConfig::default())
    }
}

/// A journal row that could not be applied in this call
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub ingredient_id: Uuid,
    pub attempts: u32,
    /// Still conflicting when the retry budget ran out
    pub conflict: bool,
    pub error: String,
}

/// What one `apply` call did
#[derive(Debug, Clone, Serialize)]
pub struct DeductionReport {
    pub sale_id: Uuid,
    pub status: DeductionStatus,
    /// The sale was fully applied before this call; nothing changed
    pub already_applied: bool,
    /// Changes applied by this call, in ingredient id order
    pub changes: Vec<StockChange>,
    /// Journal after this call
    pub journal: Vec<JournalEntry>,
    pub alerts: Vec<StockAlert>,
    pub warnings: Vec<String>,
    pub failures: Vec<RowFailure>,
}

impl DeductionReport {
    pub fn applied_ingredients(&self) -> Vec<Uuid> {
        self.journal
            .iter()
            .filter(|e| e.is_applied())
            .map(|e| e.ingredient_id)
            .collect()
    }

    pub fn pending_ingredients(&self) -> Vec<Uuid> {
        self.journal
            .iter()
            .filter(|e| !e.is_applied())
            .map(|e| e.ingredient_id)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.status == DeductionStatus::Applied
    }

    /// Turn an incomplete report into the error the caller reports
    pub fn ensure_complete(self) -> AppResult<Self> {
        if self.is_complete() {
            return Ok(self);
        }

        let applied = self.applied_ingredients();
        if applied.is_empty() {
            if let Some(conflict) = self.failures.iter().find(|f| f.conflict) {
                if self.failures.iter().all(|f| f.conflict) {
                    return Err(AppError::LedgerWriteConflict {
                        sale_id: self.sale_id,
                        ingredient_id: conflict.ingredient_id,
                        attempts: conflict.attempts,
                    });
                }
            }
        }

        Err(AppError::PartialDeduction {
            sale_id: self.sale_id,
            applied,
            pending: self.pending_ingredients(),
        })
    }
}

#[derive(Clone)]
pub struct DeductionEngine {
    store: Arc<dyn InventoryStore>,
    monitor: ThresholdMonitor,
    retry: RetryPolicy,
}

impl DeductionEngine {
    pub fn new(store: Arc<dyn InventoryStore>, retry: RetryPolicy) -> Self {
        Self {
            monitor: ThresholdMonitor::new(store.clone()),
            store,
            retry,
        }
    }

    /// Apply (or resume) the deduction journal of a sale
    pub async fn apply(&self, sale_id: Uuid) -> AppResult<DeductionReport> {
        let sale = self.store.get_sale(sale_id).await?;

        if sale.deduction_status.is_finished() {
            let journal = self.store.get_journal(sale_id).await?;
            tracing::debug!(sale_id = %sale_id, "Deduction already applied");
            return Ok(DeductionReport {
                sale_id,
                status: DeductionStatus::Applied,
                already_applied: true,
                changes: Vec::new(),
                journal,
                alerts: Vec::new(),
                warnings: Vec::new(),
                failures: Vec::new(),
            });
        }

        let journal = self.store.get_journal(sale_id).await?;
        let mut stamped = HashSet::new();
        if let Err(e) = self
            .store
            .set_deduction_status(sale_id, DeductionStatus::Applying)
            .await
        {
            return Err(interrupted(sale_id, &journal, &stamped, e));
        }

        let mut changes = Vec::new();
        let mut failures = Vec::new();

        for entry in journal.iter().filter(|e| !e.is_applied()) {
            match self.apply_row(sale_id, entry.ingredient_id).await {
                Ok(ApplyOutcome::Applied(change)) => {
                    stamped.insert(change.ingredient_id);
                    changes.push(change);
                }
                // a concurrent caller got there first
                Ok(ApplyOutcome::AlreadyApplied(row)) => {
                    stamped.insert(row.ingredient_id);
                }
                Err(failure) => failures.push(failure),
            }
        }

        // Stamped rows are never re-applied, so their alerts are raised now or never
        let threshold = self.monitor.record(&changes, Some(sale_id)).await;

        let journal = match self.store.get_journal(sale_id).await {
            Ok(journal) => journal,
            Err(e) => return Err(interrupted(sale_id, &journal, &stamped, e)),
        };
        let applied = journal.iter().filter(|e| e.is_applied()).count();
        let status = if applied == journal.len() {
            DeductionStatus::Applied
        } else if applied > 0 {
            DeductionStatus::PartiallyApplied
        } else {
            DeductionStatus::Pending
        };
        if let Err(e) = self.store.set_deduction_status(sale_id, status).await {
            return Err(interrupted(sale_id, &journal, &stamped, e));
        }

        if failures.is_empty() {
            tracing::info!(
                sale_id = %sale_id,
                ingredients = changes.len(),
                alerts = threshold.alerts.len(),
                "Stock deducted for sale"
            );
        } else {
            tracing::warn!(
                sale_id = %sale_id,
                applied = applied,
                pending = journal.len() - applied,
                status = status.as_str(),
                "Stock deduction incomplete"
            );
        }

        Ok(DeductionReport {
            sale_id,
            status,
            already_applied: false,
            changes,
            journal,
            alerts: threshold.alerts,
            warnings: threshold.warnings,
            failures,
        })
    }

    async fn apply_row(&self, sale_id: Uuid, ingredient_id: Uuid) -> Result<ApplyOutcome, RowFailure> {
        let mut attempt = 1;
        loop {
            match self.store.apply_journal_entry(sale_id, ingredient_id).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    tracing::warn!(
                        sale_id = %sale_id,
                        ingredient_id = %ingredient_id,
                        attempt = attempt,
                        error = %e,
                        "Ledger write conflict, retrying"
                    );
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        sale_id = %sale_id,
                        ingredient_id = %ingredient_id,
                        attempts = attempt,
                        error = %e,
                        "Ledger write failed"
                    );
                    return Err(RowFailure {
                        ingredient_id,
                        attempts: attempt,
                        conflict: matches!(e, StoreError::Conflict(_)),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}

/// A store failure after rows may have been stamped. The sale is left
/// unfinished and resumable; the error lists where each row stands.
fn interrupted(
    sale_id: Uuid,
    journal: &[JournalEntry],
    stamped: &HashSet<Uuid>,
    error: StoreError,
) -> AppError {
    let (applied, pending): (Vec<&JournalEntry>, Vec<&JournalEntry>) = journal
        .iter()
        .partition(|e| e.is_applied() || stamped.contains(&e.ingredient_id));
    tracing::error!(
        sale_id = %sale_id,
        applied = applied.len(),
        pending = pending.len(),
        error = %error,
        "Deduction interrupted by a store failure"
    );
    AppError::PartialDeduction {
        sale_id,
        applied: applied.iter().map(|e| e.ingredient_id).collect(),
        pending: pending.iter().map(|e| e.ingredient_id).collect(),
    }
}
