//! Error handling for the Kitchen Stock service
//!
//! Provides consistent error responses in Thai and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_th: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_th: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid draft transition: {0}")]
    InvalidDraftTransition(String),

    /// Some journal rows applied, the rest still pending; resumable
    #[error("Sale {sale_id} partially deducted ({} applied, {} pending)", applied.len(), pending.len())]
    PartialDeduction {
        sale_id: Uuid,
        applied: Vec<Uuid>,
        pending: Vec<Uuid>,
    },

    /// Write conflicts outlasted the retry budget before anything applied
    #[error("Ledger write conflict on ingredient {ingredient_id} after {attempts} attempts")]
    LedgerWriteConflict {
        sale_id: Uuid,
        ingredient_id: Uuid,
        attempts: u32,
    },

    // Storage errors
    #[error("Storage error: {0}")]
    StorageError(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::Precondition(msg) => AppError::InvalidDraftTransition(msg),
            StoreError::Conflict(msg) => AppError::Conflict {
                resource: "ledger".to_string(),
                message_th: format!("ข้อมูลถูกแก้ไขพร้อมกัน: {}", msg),
                message: msg,
            },
            StoreError::Unavailable(msg) | StoreError::Corrupt(msg) => AppError::StorageError(msg),
            StoreError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<&&str> = field_errors.keys().collect();
        fields.sort();
        match fields.first() {
            Some(field) => {
                let message = field_errors
                    .get(**field)
                    .and_then(|errs| errs.first())
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                AppError::Validation {
                    field: field.to_string(),
                    message_th: format!("ข้อมูล {} ไม่ถูกต้อง", field),
                    message,
                }
            }
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

impl AppError {
    /// Validation failure on a named field with a Thai translation
    pub fn validation(field: &str, message: &str, message_th: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_th: message_th.to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_th: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_th,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_th: message_th.clone(),
                    field: Some(field.clone()),
                    details: None,
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_th: format!("ข้อมูลไม่ถูกต้อง: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::Conflict {
                resource,
                message,
                message_th,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message_en: message.clone(),
                    message_th: message_th.clone(),
                    field: Some(resource.clone()),
                    details: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_th: format!("ไม่พบ {}", resource),
                    field: None,
                    details: None,
                },
            ),
            AppError::InvalidDraftTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_DRAFT_TRANSITION".to_string(),
                    message_en: msg.clone(),
                    message_th: format!("ไม่สามารถเปลี่ยนสถานะใบสั่งซื้อได้: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::PartialDeduction {
                sale_id,
                applied,
                pending,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "PARTIAL_DEDUCTION".to_string(),
                    message_en: format!(
                        "Stock deduction for sale {} is incomplete; retry to finish",
                        sale_id
                    ),
                    message_th: format!("การตัดสต็อกของการขาย {} ยังไม่ครบ กรุณาลองใหม่", sale_id),
                    field: None,
                    details: Some(serde_json::json!({
                        "sale_id": sale_id,
                        "applied": applied,
                        "pending": pending,
                    })),
                },
            ),
            AppError::LedgerWriteConflict {
                sale_id,
                ingredient_id,
                attempts,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "LEDGER_WRITE_CONFLICT".to_string(),
                    message_en: format!(
                        "Stock ledger was busy after {} attempts; retry the deduction",
                        attempts
                    ),
                    message_th: "สต็อกถูกแก้ไขพร้อมกัน กรุณาลองตัดสต็อกใหม่".to_string(),
                    field: None,
                    details: Some(serde_json::json!({
                        "sale_id": sale_id,
                        "ingredient_id": ingredient_id,
                    })),
                },
            ),
            AppError::StorageError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "STORAGE_ERROR".to_string(),
                    message_en: format!("Storage error: {}", msg),
                    message_th: format!("เกิดข้อผิดพลาดในการจัดเก็บ: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดกับฐานข้อมูล".to_string(),
                    field: None,
                    details: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_http_semantics() {
        assert!(matches!(
            AppError::from(StoreError::NotFound("Sale".into())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::Precondition("order is pending".into())),
            AppError::InvalidDraftTransition(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::Conflict("busy".into())),
            AppError::Conflict { .. }
        ));
    }

    #[test]
    fn test_partial_deduction_is_server_error() {
        let response = AppError::PartialDeduction {
            sale_id: Uuid::new_v4(),
            applied: vec![Uuid::new_v4()],
            pending: vec![Uuid::new_v4()],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_failures_are_server_errors() {
        for err in [
            StoreError::Unavailable("pool timed out".into()),
            StoreError::Corrupt("bad status".into()),
        ] {
            let err = AppError::from(err);
            assert!(matches!(err, AppError::StorageError(_)));
            assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        let response = AppError::LedgerWriteConflict {
            sale_id: Uuid::new_v4(),
            ingredient_id: Uuid::new_v4(),
            attempts: 5,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_transition_is_unprocessable() {
        let response = AppError::InvalidDraftTransition("order is pending".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
