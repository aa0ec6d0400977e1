use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::error::AttendanceError;

/// Daily status of an attendance record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    EarlyCheckout,
    LateEarlyCheckout,
}

impl AttendanceStatus {
    /// Status after leaving before the end cutoff.
    pub fn with_early_checkout(self) -> Self {
        match self {
            AttendanceStatus::Present => AttendanceStatus::EarlyCheckout,
            AttendanceStatus::Late => AttendanceStatus::LateEarlyCheckout,
            other => other,
        }
    }

    /// Inverse of [`with_early_checkout`](Self::with_early_checkout), used when
    /// a check-out is rejected.
    pub fn without_early_checkout(self) -> Self {
        match self {
            AttendanceStatus::EarlyCheckout => AttendanceStatus::Present,
            AttendanceStatus::LateEarlyCheckout => AttendanceStatus::Late,
            other => other,
        }
    }

    pub const ALL: [AttendanceStatus; 6] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::HalfDay,
        AttendanceStatus::EarlyCheckout,
        AttendanceStatus::LateEarlyCheckout,
    ];
}

/// How a check-in or check-out was captured.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaptureMethod {
    FaceRecognition,
    Manual,
    QrCode,
}

/// Which half of the day a verify/reject action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    CheckIn,
    CheckOut,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CheckIn => "checkIn",
            EventKind::CheckOut => "checkOut",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured check-in or check-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEvent {
    #[schema(example = "2026-01-05T09:15:00", value_type = String)]
    pub time: NaiveDateTime,
    pub image_url: Option<String>,
    pub qr_code: Option<String>,
    /// Percentage on the 0-100 scale.
    #[schema(example = 100.0)]
    pub confidence: f64,
    pub method: CaptureMethod,
    pub location: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub check_in: Option<CaptureEvent>,
    pub check_out: Option<CaptureEvent>,
    pub status: AttendanceStatus,
    #[schema(example = 7.25)]
    pub hours_worked: f64,
    pub early_checkout: bool,
    pub notes: Option<String>,
    pub verified_by: Option<u64>,
    #[schema(value_type = Option<String>)]
    pub created_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<NaiveDateTime>,
}

impl AttendanceRecord {
    /// Empty record for a user-day, before any capture is attached.
    pub fn new(user_id: u64, date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            id: 0,
            user_id,
            date,
            check_in: None,
            check_out: None,
            status,
            hours_worked: 0.0,
            early_checkout: false,
            notes: None,
            verified_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn event(&self, kind: EventKind) -> Option<&CaptureEvent> {
        match kind {
            EventKind::CheckIn => self.check_in.as_ref(),
            EventKind::CheckOut => self.check_out.as_ref(),
        }
    }

    pub fn event_mut(&mut self, kind: EventKind) -> &mut Option<CaptureEvent> {
        match kind {
            EventKind::CheckIn => &mut self.check_in,
            EventKind::CheckOut => &mut self.check_out,
        }
    }
}

/// Flat `attendance` row as stored in MySQL.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,

    pub check_in_time: Option<NaiveDateTime>,
    pub check_in_image_url: Option<String>,
    pub check_in_qr_code: Option<String>,
    pub check_in_confidence: Option<f64>,
    pub check_in_method: Option<String>,
    pub check_in_location: Option<String>,
    pub check_in_verified: bool,

    pub check_out_time: Option<NaiveDateTime>,
    pub check_out_image_url: Option<String>,
    pub check_out_qr_code: Option<String>,
    pub check_out_confidence: Option<f64>,
    pub check_out_method: Option<String>,
    pub check_out_location: Option<String>,
    pub check_out_verified: bool,

    pub status: String,
    pub hours_worked: f64,
    pub early_checkout: bool,
    pub notes: Option<String>,
    pub verified_by: Option<u64>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

fn event_from_columns(
    time: Option<NaiveDateTime>,
    image_url: Option<String>,
    qr_code: Option<String>,
    confidence: Option<f64>,
    method: Option<String>,
    location: Option<String>,
    verified: bool,
) -> Result<Option<CaptureEvent>, AttendanceError> {
    let Some(time) = time else {
        return Ok(None);
    };

    let method = match method.as_deref() {
        Some(m) => m
            .parse::<CaptureMethod>()
            .map_err(|_| AttendanceError::Corrupt(format!("unknown capture method '{m}'")))?,
        None => CaptureMethod::Manual,
    };

    Ok(Some(CaptureEvent {
        time,
        image_url,
        qr_code,
        confidence: confidence.unwrap_or(0.0),
        method,
        location,
        verified,
    }))
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AttendanceError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AttendanceStatus>()
            .map_err(|_| AttendanceError::Corrupt(format!("unknown status '{}'", row.status)))?;

        let check_in = event_from_columns(
            row.check_in_time,
            row.check_in_image_url,
            row.check_in_qr_code,
            row.check_in_confidence,
            row.check_in_method,
            row.check_in_location,
            row.check_in_verified,
        )?;

        let check_out = event_from_columns(
            row.check_out_time,
            row.check_out_image_url,
            row.check_out_qr_code,
            row.check_out_confidence,
            row.check_out_method,
            row.check_out_location,
            row.check_out_verified,
        )?;

        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            check_in,
            check_out,
            status,
            hours_worked: row.hours_worked,
            early_checkout: row.early_checkout,
            notes: row.notes,
            verified_by: row.verified_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Admin list row: the record plus who it belongs to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceWithUserRow {
    #[sqlx(flatten)]
    pub attendance: AttendanceRow,
    pub username: String,
    pub full_name: Option<String>,
    pub department_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceWithUser {
    #[serde(flatten)]
    pub attendance: AttendanceRecord,
    pub username: String,
    pub full_name: Option<String>,
    pub department: Option<String>,
}

impl TryFrom<AttendanceWithUserRow> for AttendanceWithUser {
    type Error = AttendanceError;

    fn try_from(row: AttendanceWithUserRow) -> Result<Self, Self::Error> {
        Ok(AttendanceWithUser {
            attendance: row.attendance.try_into()?,
            username: row.username,
            full_name: row.full_name,
            department: row.department_name,
        })
    }
}
