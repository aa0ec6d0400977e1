use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::model::attendance::{AttendanceRecord, EventKind};

/// Failures of the attendance lifecycle and its persistence.
///
/// State conflicts carry the conflicting record so the caller can decide how
/// to proceed.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn(Box<AttendanceRecord>),

    #[display(fmt = "Please check in first before checking out")]
    NotCheckedIn(Option<Box<AttendanceRecord>>),

    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut(Box<AttendanceRecord>),

    #[display(fmt = "Attendance record already exists for this date")]
    RecordExists,

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "Attendance record not found")]
    NotFound,

    #[display(fmt = "No {} record to {}", _0, _1)]
    EventMissing(EventKind, &'static str),

    #[display(fmt = "Image upload failed: {}", _0)]
    Upload(String),

    #[display(fmt = "Stored attendance row is invalid: {}", _0)]
    Corrupt(String),

    #[display(fmt = "Database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for AttendanceError {}

impl From<sqlx::Error> for AttendanceError {
    fn from(e: sqlx::Error) -> Self {
        AttendanceError::Database(e)
    }
}

impl AttendanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        AttendanceError::Validation(message.into())
    }

    fn conflicting_record(&self) -> Option<&AttendanceRecord> {
        match self {
            AttendanceError::AlreadyCheckedIn(r) | AttendanceError::AlreadyCheckedOut(r) => {
                Some(&**r)
            }
            AttendanceError::NotCheckedIn(r) => r.as_deref(),
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            AttendanceError::Upload(_) | AttendanceError::Corrupt(_) | AttendanceError::Database(_)
        )
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::AlreadyCheckedIn(_)
            | AttendanceError::NotCheckedIn(_)
            | AttendanceError::AlreadyCheckedOut(_)
            | AttendanceError::RecordExists
            | AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::NotFound | AttendanceError::EventMissing(..) => StatusCode::NOT_FOUND,
            AttendanceError::Upload(_)
            | AttendanceError::Corrupt(_)
            | AttendanceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            tracing::error!(error = %self, "Attendance request failed");

            let mut body = json!({
                "success": false,
                "message": "Internal Server Error",
            });
            if cfg!(debug_assertions) {
                body["error"] = json!(self.to_string());
            }
            return HttpResponse::build(self.status_code()).json(body);
        }

        let mut body = json!({
            "success": false,
            "message": self.to_string(),
        });
        if let Some(record) = self.conflicting_record() {
            body["attendance"] = json!(record);
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
