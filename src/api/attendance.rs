use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, CaptureMethod, EventKind};
use crate::repository::attendance::{self as repo, AttendanceFilter, Page};
use crate::service::lifecycle::{self, Capture, FULL_CONFIDENCE};
use crate::service::stats::{self, AttendanceStats};
use crate::utils::{image_upload::ImageUploader, schedule_cache};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MarkType {
    CheckIn,
    CheckOut,
}

impl MarkType {
    fn kind(self) -> EventKind {
        match self {
            MarkType::CheckIn => EventKind::CheckIn,
            MarkType::CheckOut => EventKind::CheckOut,
        }
    }
}

/// Face or QR capture sent by the client.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    #[serde(rename = "type")]
    #[schema(example = "check-in")]
    pub mark_type: MarkType,
    /// JPEG as base64 or a data URI.
    pub base64_image: Option<String>,
    /// Match confidence in percent (0-100).
    #[schema(example = 92.5)]
    pub confidence: Option<f64>,
    pub method: Option<CaptureMethod>,
    #[schema(example = "Main gate")]
    pub location: Option<String>,
    pub qr_code: Option<String>,
    /// Client clock reading. Logged only.
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualMark {
    #[serde(rename = "type")]
    #[schema(example = "check-out")]
    pub mark_type: MarkType,
    pub location: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MyAttendanceQuery {
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    /// 1-based page
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Page size, at most 100
    #[param(example = 10)]
    pub limit: Option<u64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePage {
    pub success: bool,
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub limit: u64,
    #[schema(example = 1)]
    pub total: i64,
    #[schema(example = 1)]
    pub total_pages: u64,
}

/// Effective method and confidence for a `/mark` capture.
///
/// QR and manual captures default to full confidence, face matches to zero.
fn capture_from(payload: &MarkAttendance) -> Result<Capture, AttendanceError> {
    let method = payload.method.unwrap_or(if payload.qr_code.is_some() {
        CaptureMethod::QrCode
    } else {
        CaptureMethod::FaceRecognition
    });

    let confidence = match (payload.confidence, method) {
        (Some(c), _) => lifecycle::validate_confidence(c)?,
        (None, CaptureMethod::FaceRecognition) => 0.0,
        (None, _) => FULL_CONFIDENCE,
    };

    Ok(Capture {
        method,
        confidence,
        location: payload.location.clone(),
        image_url: None,
        qr_code: payload.qr_code.clone(),
    })
}

/// Reload after a lost race and report why the write did not apply.
async fn conflict_after_race(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
    kind: EventKind,
) -> AttendanceError {
    let current = match repo::find_for_day(pool, user_id, date).await {
        Ok(current) => current,
        Err(e) => return e,
    };
    let guard = match kind {
        EventKind::CheckIn => lifecycle::ensure_can_check_in(current.as_ref()),
        EventKind::CheckOut => lifecycle::ensure_can_check_out(current.as_ref()),
    };
    guard.err().unwrap_or_else(|| {
        AttendanceError::validation("Attendance was modified concurrently, please try again")
    })
}

async fn record_mark(
    pool: &MySqlPool,
    config: &Config,
    uploader: &ImageUploader,
    user_id: u64,
    kind: EventKind,
    mut capture: Capture,
    image: Option<&str>,
) -> Result<AttendanceRecord, AttendanceError> {
    let now: NaiveDateTime = Local::now().naive_local();
    let today = now.date();

    let schedule = schedule_cache::schedule_for_user(pool, user_id, config.default_schedule).await?;
    let existing = repo::find_for_day(pool, user_id, today).await?;

    match kind {
        EventKind::CheckIn => lifecycle::ensure_can_check_in(existing.as_ref())?,
        EventKind::CheckOut => lifecycle::ensure_can_check_out(existing.as_ref())?,
    }

    if let Some(image) = image {
        capture.image_url = uploader.upload(image, "attendance").await?;
    }

    let is_new = existing.is_none();
    let record = match kind {
        EventKind::CheckIn => lifecycle::check_in(
            existing,
            user_id,
            now,
            capture,
            &schedule,
            &config.verification,
        )?,
        EventKind::CheckOut => {
            lifecycle::check_out(existing, now, capture, &schedule, &config.verification)?
        }
    };

    let applied = match kind {
        EventKind::CheckIn if is_new => match repo::insert(pool, &record).await {
            Ok(saved) => return Ok(saved),
            Err(AttendanceError::RecordExists) => false,
            Err(e) => return Err(e),
        },
        EventKind::CheckIn => repo::save_check_in(pool, &record).await?,
        EventKind::CheckOut => repo::save_check_out(pool, &record).await?,
    };

    if !applied {
        info!(user_id, %kind, "Lost a concurrent attendance write");
        return Err(conflict_after_race(pool, user_id, today, kind).await);
    }

    repo::find_by_id(pool, record.id)
        .await?
        .ok_or(AttendanceError::NotFound)
}

fn marked(kind: EventKind, record: AttendanceRecord) -> HttpResponse {
    let message = match kind {
        EventKind::CheckIn => "Checked in successfully",
        EventKind::CheckOut => "Checked out successfully",
    };
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
        "attendance": record
    }))
}

/// Face or QR check-in/check-out
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance marked", body = Object, example = json!({
            "success": true,
            "message": "Checked in successfully",
            "attendance": {}
        })),
        (status = 400, description = "Already checked in/out, not checked in, or bad confidence", body = Object, example = json!({
            "success": false,
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(
    name = "attendance_mark",
    skip(auth, pool, config, uploader, payload),
    fields(user_id = auth.user_id, mark_type = ?payload.mark_type)
)]
pub async fn mark(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    uploader: web::Data<ImageUploader>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<HttpResponse> {
    let capture = capture_from(&payload)?;
    if let Some(ts) = &payload.timestamp {
        debug!(client_timestamp = %ts, "Using server clock instead of client timestamp");
    }

    let kind = payload.mark_type.kind();
    let record = record_mark(
        pool.get_ref(),
        &config,
        &uploader,
        auth.user_id,
        kind,
        capture,
        payload.base64_image.as_deref(),
    )
    .await?;

    info!(record_id = record.id, status = %record.status, "Attendance marked");
    Ok(marked(kind, record))
}

/// Manual check-in/check-out without a capture
#[utoipa::path(
    post,
    path = "/api/attendance/mark-manual",
    request_body = ManualMark,
    responses(
        (status = 200, description = "Attendance marked", body = Object),
        (status = 400, description = "Already checked in/out or not checked in"),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Too many requests")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(
    name = "attendance_mark_manual",
    skip(auth, pool, config, uploader, payload),
    fields(user_id = auth.user_id, mark_type = ?payload.mark_type)
)]
pub async fn mark_manual(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    uploader: web::Data<ImageUploader>,
    payload: web::Json<ManualMark>,
) -> actix_web::Result<HttpResponse> {
    if let Some(ts) = &payload.timestamp {
        debug!(client_timestamp = %ts, "Using server clock instead of client timestamp");
    }

    let kind = payload.mark_type.kind();
    let record = record_mark(
        pool.get_ref(),
        &config,
        &uploader,
        auth.user_id,
        kind,
        Capture::manual(payload.location.clone()),
        None,
    )
    .await?;

    info!(record_id = record.id, status = %record.status, "Attendance marked manually");
    Ok(marked(kind, record))
}

/// Caller's record for today, or null
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record", body = Object, example = json!({
            "success": true,
            "attendance": null
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<HttpResponse> {
    let today = Local::now().date_naive();
    let record = repo::find_for_day(pool.get_ref(), auth.user_id, today).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "attendance": record
    })))
}

/// Caller's attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    params(MyAttendanceQuery),
    responses(
        (status = 200, description = "Paginated history", body = AttendancePage),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MyAttendanceQuery>,
) -> actix_web::Result<HttpResponse> {
    let filter = AttendanceFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        user_id: Some(auth.user_id),
        ..Default::default()
    };
    let page = Page::new(query.page, query.limit);

    let (rows, total) = repo::list(pool.get_ref(), &filter, Some(page)).await?;

    Ok(HttpResponse::Ok().json(AttendancePage {
        success: true,
        data: rows.into_iter().map(|r| r.attendance).collect(),
        page: page.page,
        limit: page.limit,
        total,
        total_pages: page.total_pages(total),
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
}

/// Caller's statistics with their longest streak
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Statistics", body = AttendanceStats),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StatsQuery>,
) -> actix_web::Result<HttpResponse> {
    let filter = AttendanceFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        user_id: Some(auth.user_id),
        ..Default::default()
    };

    let raw = repo::aggregate(pool.get_ref(), &filter).await?;
    let dates = repo::dates_for_user(pool.get_ref(), auth.user_id).await?;

    let mut summary = stats::summarize(raw);
    summary.current_streak = Some(stats::streak(&dates));

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "stats": summary
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payload(body: serde_json::Value) -> MarkAttendance {
        serde_json::from_value(body).unwrap()
    }

    #[rstest]
    #[case(json!({"type": "check-in", "qrCode": "ROOM-12"}), CaptureMethod::QrCode, 100.0)]
    #[case(json!({"type": "check-in", "confidence": 91.5}), CaptureMethod::FaceRecognition, 91.5)]
    #[case(json!({"type": "check-out"}), CaptureMethod::FaceRecognition, 0.0)]
    #[case(json!({"type": "check-in", "method": "manual"}), CaptureMethod::Manual, 100.0)]
    fn capture_defaults(
        #[case] body: serde_json::Value,
        #[case] method: CaptureMethod,
        #[case] confidence: f64,
    ) {
        let capture = capture_from(&payload(body)).unwrap();
        assert_eq!(capture.method, method);
        assert_eq!(capture.confidence, confidence);
    }

    #[rstest]
    #[case(150.0)]
    #[case(-1.0)]
    fn out_of_range_confidence_is_rejected(#[case] confidence: f64) {
        let err = capture_from(&payload(json!({"type": "check-in", "confidence": confidence})))
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[test]
    fn mark_type_uses_kebab_case() {
        let mark = payload(json!({"type": "check-out", "timestamp": "2026-01-05T17:00:00Z"}));
        assert_eq!(mark.mark_type.kind(), EventKind::CheckOut);
        assert!(serde_json::from_value::<MarkAttendance>(json!({"type": "checkIn"})).is_err());
    }
}
