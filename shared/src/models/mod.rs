//! Domain models for the Kitchen Stock Platform

mod alert;
mod consumption;
mod ingredient;
mod order;
mod recipe;
mod replenishment;
mod sale;

pub use alert::*;
pub use consumption::*;
pub use ingredient::*;
pub use order::*;
pub use recipe::*;
pub use replenishment::*;
pub use sale::*;
