use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AttendanceError;
use crate::model::department::{Department, WorkSchedule};
use crate::repository::department as repo;
use crate::utils::schedule_cache;
use actix_web::{HttpResponse, web};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Computer Science")]
    pub name: String,
    /// Effective cutoffs, with defaults filled in.
    pub schedule: WorkSchedule,
    /// False when the department relies on the default cutoffs.
    pub custom_schedule: bool,
}

impl DepartmentResponse {
    fn new(department: Department, default: WorkSchedule) -> Self {
        let custom_schedule =
            department.work_start_hour.is_some() || department.work_end_hour.is_some();
        Self {
            id: department.id,
            schedule: department.schedule(default),
            name: department.name,
            custom_schedule,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    #[schema(example = 8)]
    pub start_hour: u8,
    #[schema(example = 30)]
    pub start_minute: u8,
    #[schema(example = 16)]
    pub end_hour: u8,
    #[schema(example = 30)]
    pub end_minute: u8,
}

impl ScheduleUpdate {
    fn to_schedule(&self) -> Result<WorkSchedule, AttendanceError> {
        let time = |h: u8, m: u8, what: &str| {
            NaiveTime::from_hms_opt(h as u32, m as u32, 0).ok_or_else(|| {
                AttendanceError::validation(format!(
                    "{what} must be a valid time (hour 0-23, minute 0-59)"
                ))
            })
        };
        let start = time(self.start_hour, self.start_minute, "Start")?;
        let end = time(self.end_hour, self.end_minute, "End")?;

        if start >= end {
            return Err(AttendanceError::validation(
                "Start time must be before end time",
            ));
        }
        Ok(WorkSchedule { start, end })
    }
}

/// Departments with their effective schedules
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Departments", body = Vec<DepartmentResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Department"
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<HttpResponse> {
    let departments = repo::list(pool.get_ref())
        .await
        .map_err(AttendanceError::from)?;

    let data: Vec<DepartmentResponse> = departments
        .into_iter()
        .map(|d| DepartmentResponse::new(d, config.default_schedule))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": data
    })))
}

/// Set a department's late and early-departure cutoffs
#[utoipa::path(
    put,
    path = "/api/departments/{id}/schedule",
    params(("id" = u64, Path, description = "Department id")),
    request_body = ScheduleUpdate,
    responses(
        (status = 200, description = "Schedule updated", body = Object),
        (status = 400, description = "Invalid schedule"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Department not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Department"
)]
pub async fn update_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<ScheduleUpdate>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();
    payload.to_schedule()?;

    let exists = repo::find_by_id(pool.get_ref(), id)
        .await
        .map_err(AttendanceError::from)?
        .is_some();
    if !exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Department not found"
        })));
    }

    repo::update_schedule(
        pool.get_ref(),
        id,
        (payload.start_hour, payload.start_minute),
        (payload.end_hour, payload.end_minute),
    )
    .await
    .map_err(AttendanceError::from)?;
    schedule_cache::invalidate(id).await;

    let department = repo::find_by_id(pool.get_ref(), id)
        .await
        .map_err(AttendanceError::from)?
        .ok_or(AttendanceError::NotFound)?;

    info!(department_id = id, admin_id = auth.user_id, admin = %auth.username, "Department schedule updated");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Schedule updated",
        "department": DepartmentResponse::new(department, config.default_schedule)
    })))
}
