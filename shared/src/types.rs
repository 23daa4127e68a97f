//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Default number of records returned by list queries
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Upper bound on records returned by list queries
pub const MAX_LIST_LIMIT: u32 = 500;

/// Limit parameters for list queries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListLimit {
    pub limit: Option<u32>,
}

impl ListLimit {
    /// Requested limit clamped to `1..=MAX_LIST_LIMIT`
    pub fn effective(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(ListLimit::default().effective(), DEFAULT_LIST_LIMIT);
        assert_eq!(ListLimit { limit: Some(0) }.effective(), 1);
        assert_eq!(ListLimit { limit: Some(10_000) }.effective(), MAX_LIST_LIMIT);
    }
}
