//! HTTP request handlers

pub mod alerts;
pub mod drafts;
pub mod health;
pub mod inventory;
pub mod sales;

pub use alerts::*;
pub use drafts::*;
pub use health::*;
pub use inventory::*;
pub use sales::*;
