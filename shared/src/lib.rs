//! Shared types and models for the Kitchen Stock Platform
//!
//! This crate contains the domain records and the pure inventory math shared
//! between the backend and the browser (via WASM).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
