use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::model::leave_request::LeaveStatus;

#[derive(Debug, Error)]
pub enum HrmError {
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{reason} (start: {start}, end: {end})")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: &'static str,
    },

    #[error("{month}/{year} is not a valid calendar month")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Insufficient leave balance. Requesting: {requested}, Available: {available}")]
    InsufficientBalance {
        employee_id: u64,
        requested: i64,
        available: i32,
    },

    #[error("Leave request {leave_id} is already processed ({status})")]
    InvalidState { leave_id: u64, status: LeaveStatus },

    #[error("Attendance record {attendance_id} is finalized and cannot be updated")]
    AlreadyFinalized { attendance_id: u64 },

    #[error("Attendance for {month}/{year} is not finalized")]
    FailedPrecondition { year: i32, month: u32 },

    #[error("Payroll for {month}/{year} has already been generated")]
    AlreadyExists { year: i32, month: u32 },

    #[error("Failed to update attendance records for leave request {leave_id}: {source}")]
    AttendanceSync {
        leave_id: u64,
        #[source]
        source: Box<HrmError>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl HrmError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        HrmError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// True for storage-layer failures as opposed to business-rule violations.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            HrmError::Database(_) | HrmError::Storage(_) => true,
            HrmError::AttendanceSync { source, .. } => source.is_infrastructure(),
            _ => false,
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, HrmError>;

impl ResponseError for HrmError {
    fn status_code(&self) -> StatusCode {
        match self {
            HrmError::NotFound { .. } => StatusCode::NOT_FOUND,
            HrmError::InvalidRange { .. }
            | HrmError::InvalidMonth { .. }
            | HrmError::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
            HrmError::InvalidState { .. }
            | HrmError::AlreadyFinalized { .. }
            | HrmError::AlreadyExists { .. } => StatusCode::CONFLICT,
            HrmError::FailedPrecondition { .. } => StatusCode::PRECONDITION_FAILED,
            HrmError::AttendanceSync { .. } | HrmError::Database(_) | HrmError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            return HttpResponse::build(status).json(json!({
                "message": "Internal Server Error"
            }));
        }
        HttpResponse::build(status).json(json!({
            "message": self.to_string()
        }))
    }
}
