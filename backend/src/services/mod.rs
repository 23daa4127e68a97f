//! Business logic services for the Kitchen Stock service

pub mod deduction;
pub mod inventory;
pub mod notification;
pub mod order_draft;
pub mod replenishment;
pub mod sale;
pub mod threshold;

pub use deduction::{DeductionEngine, DeductionReport, RetryPolicy};
pub use inventory::InventoryService;
pub use notification::{LogNotifier, SupplierNotifier, WebhookNotifier};
pub use order_draft::OrderDraftService;
pub use replenishment::ReplenishmentService;
pub use sale::SaleService;
pub use threshold::ThresholdMonitor;
