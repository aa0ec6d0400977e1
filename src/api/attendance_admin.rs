use crate::auth::auth::AuthUser;
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, AttendanceWithUser, EventKind};
use crate::repository::attendance::{
    self as repo, AttendanceFilter, Page, ReadTimes, VerificationFilter,
};
use crate::service::export;
use crate::service::lifecycle::{self, BulkOutcome, ManualUpdate};
use crate::service::stats::{self, AttendanceStats};
use actix_web::{HttpResponse, http::header, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<u64>,
    /// Department id
    pub department: Option<u64>,
    pub status: Option<AttendanceStatus>,
    pub verification: Option<VerificationFilter>,
    /// 1-based page (list only)
    pub page: Option<u64>,
    /// Page size, at most 100 (list only)
    pub limit: Option<u64>,
}

impl From<&AttendanceQuery> for AttendanceFilter {
    fn from(q: &AttendanceQuery) -> Self {
        AttendanceFilter {
            start_date: q.start_date,
            end_date: q.end_date,
            user_id: q.user_id,
            department_id: q.department,
            status: q.status,
            verification: q.verification,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminAttendancePage {
    pub success: bool,
    pub data: Vec<AttendanceWithUser>,
    pub page: u64,
    pub limit: u64,
    pub total: i64,
    pub total_pages: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackfillRequest {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(value_type = String, example = "2026-01-05")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[schema(example = "09:00")]
    pub check_in_time: Option<String>,
    #[schema(example = "17:00")]
    pub check_out_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    #[serde(rename = "type")]
    #[schema(example = "checkIn")]
    pub kind: EventKind,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkVerifyRequest {
    #[schema(example = json!([1, 2, 3]))]
    pub ids: Vec<u64>,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendance {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
    #[schema(value_type = Option<String>, example = "2026-01-05T09:00:00")]
    pub check_in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, example = "2026-01-05T17:00:00")]
    pub check_out_time: Option<NaiveDateTime>,
    pub check_in_verified: Option<bool>,
    pub check_out_verified: Option<bool>,
}

impl From<UpdateAttendance> for ManualUpdate {
    fn from(u: UpdateAttendance) -> Self {
        ManualUpdate {
            status: u.status,
            notes: u.notes,
            check_in_time: u.check_in_time,
            check_out_time: u.check_out_time,
            check_in_verified: u.check_in_verified,
            check_out_verified: u.check_out_verified,
        }
    }
}

fn attendance_response(message: impl Into<String>, attendance: impl Serialize) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": message.into(),
        "attendance": attendance
    }))
}

/// Filtered attendance across all users
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated records", body = AdminAttendancePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let filter = AttendanceFilter::from(&*query);
    let page = Page::new(query.page, query.limit);
    let (data, total) = repo::list(pool.get_ref(), &filter, Some(page)).await?;

    Ok(HttpResponse::Ok().json(AdminAttendancePage {
        success: true,
        data,
        page: page.page,
        limit: page.limit,
        total,
        total_pages: page.total_pages(total),
    }))
}

/// Statistics across all users
#[utoipa::path(
    get,
    path = "/api/attendance/admin/stats",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Statistics", body = AttendanceStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn admin_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let raw = repo::aggregate(pool.get_ref(), &AttendanceFilter::from(&*query)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "stats": stats::summarize(raw)
    })))
}

/// Back-fill a record for a user-day
#[utoipa::path(
    post,
    path = "/api/attendance/admin/create",
    request_body = BackfillRequest,
    responses(
        (status = 201, description = "Record created", body = Object),
        (status = 400, description = "Bad times or record already exists", body = Object, example = json!({
            "success": false,
            "message": "Attendance record already exists for this date"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn create_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BackfillRequest>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    let payload = payload.into_inner();

    let check_in = payload
        .check_in_time
        .as_deref()
        .map(lifecycle::parse_time_of_day)
        .transpose()?;
    let check_out = payload
        .check_out_time
        .as_deref()
        .map(lifecycle::parse_time_of_day)
        .transpose()?;

    let mut record = lifecycle::backfill(
        payload.user_id,
        payload.date,
        payload.status,
        check_in,
        check_out,
        auth.user_id,
    )?;
    record.notes = payload.notes;

    let saved = repo::insert(pool.get_ref(), &record).await?;
    info!(record_id = saved.id, user_id = saved.user_id, admin_id = auth.user_id, admin = %auth.username, "Attendance back-filled");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Attendance record created",
        "attendance": saved
    })))
}

async fn verify_one(
    pool: &MySqlPool,
    id: u64,
    kind: EventKind,
    admin_id: u64,
) -> Result<AttendanceRecord, AttendanceError> {
    let mut record = repo::find_by_id(pool, id)
        .await?
        .ok_or(AttendanceError::NotFound)?;
    let read = ReadTimes::of(&record);
    lifecycle::verify(&mut record, kind, admin_id)?;
    repo::save(pool, &record, read).await?;
    Ok(record)
}

/// Verify one half of a record
#[utoipa::path(
    patch,
    path = "/api/attendance/{id}/verify",
    params(("id" = u64, Path, description = "Attendance record id")),
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verified", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Record or sub-record missing", body = Object, example = json!({
            "success": false,
            "message": "No checkIn record to verify"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn verify_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<VerifyRequest>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();

    let record = verify_one(pool.get_ref(), id, payload.kind, auth.user_id).await?;
    info!(record_id = id, kind = %payload.kind, admin_id = auth.user_id, admin = %auth.username, "Attendance verified");

    Ok(attendance_response(format!("{} verified successfully", payload.kind), record))
}

/// Reject one half of a record
#[utoipa::path(
    patch,
    path = "/api/attendance/{id}/reject",
    params(("id" = u64, Path, description = "Attendance record id")),
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Rejected", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Record or sub-record missing")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn reject_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<VerifyRequest>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();

    let mut record = repo::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or(AttendanceError::NotFound)?;
    let read = ReadTimes::of(&record);
    lifecycle::reject(&mut record, payload.kind, auth.user_id)?;
    repo::save(pool.get_ref(), &record, read).await?;

    info!(record_id = id, kind = %payload.kind, admin_id = auth.user_id, admin = %auth.username, "Attendance rejected");
    Ok(attendance_response(format!("{} rejected", payload.kind), record))
}

/// Verify many records; failures are reported per item
#[utoipa::path(
    patch,
    path = "/api/attendance/bulk-verify",
    request_body = BulkVerifyRequest,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkOutcome),
        (status = 400, description = "No ids given"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn bulk_verify(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BulkVerifyRequest>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    if payload.ids.is_empty() {
        return Err(AttendanceError::validation("ids must not be empty").into());
    }

    let mut outcome = BulkOutcome::default();
    for &id in &payload.ids {
        match verify_one(pool.get_ref(), id, payload.kind, auth.user_id).await {
            Ok(_) => outcome.succeeded(),
            Err(e) => outcome.failed(id, &e),
        }
    }

    info!(
        success_count = outcome.success_count,
        error_count = outcome.error_count,
        admin_id = auth.user_id,
        admin = %auth.username,
        "Bulk verification finished"
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!(
            "Verified {} of {} records",
            outcome.success_count,
            payload.ids.len()
        ),
        "successCount": outcome.success_count,
        "errorCount": outcome.error_count,
        "errors": outcome.errors
    })))
}

/// Overwrite fields of a record
#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record id")),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Updated", body = Object),
        (status = 400, description = "Inconsistent times"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();

    let mut record = repo::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or(AttendanceError::NotFound)?;
    let read = ReadTimes::of(&record);
    lifecycle::apply_update(&mut record, payload.into_inner().into(), auth.user_id)?;
    repo::save(pool.get_ref(), &record, read).await?;

    info!(record_id = id, admin_id = auth.user_id, admin = %auth.username, "Attendance updated");
    Ok(attendance_response("Attendance updated successfully", record))
}

/// Filtered records as CSV
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn export_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let (rows, total) = repo::list(pool.get_ref(), &AttendanceFilter::from(&*query), None).await?;
    info!(total, admin_id = auth.user_id, admin = %auth.username, "Exporting attendance");

    let filename = format!("attendance-{}.csv", Local::now().format("%Y-%m-%d"));
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(export::to_csv(&rows)))
}

/// Hard-delete a record
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record id")),
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({
            "success": true,
            "message": "Attendance record deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();

    if !repo::delete(pool.get_ref(), id).await? {
        return Err(AttendanceError::NotFound.into());
    }

    info!(record_id = id, admin_id = auth.user_id, admin = %auth.username, "Attendance deleted");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Attendance record deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_maps_department_onto_filter() {
        let query: AttendanceQuery = parse_query(
            "startDate=2026-01-01&department=4&status=half-day&verification=unverified&page=2",
        );
        let filter = AttendanceFilter::from(&query);

        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(filter.department_id, Some(4));
        assert_eq!(filter.status, Some(AttendanceStatus::HalfDay));
        assert_eq!(filter.verification, Some(VerificationFilter::Unverified));
        assert_eq!(filter.user_id, None);
    }

    fn parse_query(raw: &str) -> AttendanceQuery {
        web::Query::<AttendanceQuery>::from_query(raw)
            .unwrap()
            .into_inner()
    }

    #[test]
    fn update_body_converts_to_manual_update() {
        let body: UpdateAttendance = serde_json::from_value(json!({
            "checkInTime": "2026-01-05T09:00:00",
            "checkOutVerified": true,
            "notes": "corrected"
        }))
        .unwrap();
        let update = ManualUpdate::from(body);

        assert_eq!(
            update.check_in_time,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap().and_hms_opt(9, 0, 0)
        );
        assert_eq!(update.check_out_verified, Some(true));
        assert_eq!(update.notes.as_deref(), Some("corrected"));
        assert!(update.status.is_none());
    }

    #[test]
    fn verify_body_uses_camel_case_kind() {
        let body: BulkVerifyRequest =
            serde_json::from_value(json!({"ids": [1, 2], "type": "checkOut"})).unwrap();
        assert_eq!(body.kind, EventKind::CheckOut);
    }
}
