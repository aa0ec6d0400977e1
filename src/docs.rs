use crate::api::attendance::{AttendancePage, ManualMark, MarkAttendance, MarkType};
use crate::api::attendance_admin::{
    AdminAttendancePage, BackfillRequest, BulkVerifyRequest, UpdateAttendance, VerifyRequest,
};
use crate::api::department::{DepartmentResponse, ScheduleUpdate};
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, AttendanceWithUser, CaptureEvent, CaptureMethod, EventKind,
};
use crate::model::department::WorkSchedule;
use crate::models::{LoginReqDto, LoginResponse};
use crate::repository::attendance::VerificationFilter;
use crate::service::lifecycle::{BulkItemError, BulkOutcome};
use crate::service::stats::{AttendanceStats, StatusBreakdown};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "0.1.0",
        description = r#"
## Attendance Management

Daily check-in and check-out for students and faculty, captured by face
recognition, QR code or manually, with admin verification.

### Key Features
- **Marking**: one record per user and day; late and early-departure status
  derived from the department schedule
- **Verification**: captures above the confidence threshold verify
  themselves, the rest wait for an admin (single or bulk)
- **Reporting**: filtered lists, statistics with streaks, CSV export

### Security
All `/api` endpoints require a JWT bearer token from `/auth/login`.
Admin endpoints additionally require the admin role.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::attendance::mark,
        crate::api::attendance::mark_manual,
        crate::api::attendance::today,
        crate::api::attendance::my_attendance,
        crate::api::attendance::my_stats,

        crate::api::attendance_admin::list_attendance,
        crate::api::attendance_admin::admin_stats,
        crate::api::attendance_admin::create_attendance,
        crate::api::attendance_admin::verify_attendance,
        crate::api::attendance_admin::reject_attendance,
        crate::api::attendance_admin::bulk_verify,
        crate::api::attendance_admin::update_attendance,
        crate::api::attendance_admin::export_attendance,
        crate::api::attendance_admin::delete_attendance,

        crate::api::department::list_departments,
        crate::api::department::update_schedule
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            MarkType,
            MarkAttendance,
            ManualMark,
            AttendancePage,
            AdminAttendancePage,
            BackfillRequest,
            VerifyRequest,
            BulkVerifyRequest,
            UpdateAttendance,
            BulkOutcome,
            BulkItemError,
            AttendanceRecord,
            AttendanceWithUser,
            AttendanceStatus,
            CaptureEvent,
            CaptureMethod,
            EventKind,
            VerificationFilter,
            AttendanceStats,
            StatusBreakdown,
            WorkSchedule,
            DepartmentResponse,
            ScheduleUpdate
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Token issuance"),
        (name = "Attendance", description = "Self-service attendance APIs"),
        (name = "Attendance Admin", description = "Attendance review and reporting APIs"),
        (name = "Department", description = "Department schedule APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
