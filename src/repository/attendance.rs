use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use sqlx::mysql::{MySqlArguments, MySqlQueryResult};
use sqlx::query::Query;
use sqlx::{MySql, MySqlPool};
use utoipa::ToSchema;

use crate::error::AttendanceError;
use crate::model::attendance::{
    AttendanceRecord, AttendanceRow, AttendanceStatus, AttendanceWithUser, AttendanceWithUserRow,
    CaptureEvent,
};
use crate::service::stats::RawStats;

const FROM_JOINED: &str = r#"
    FROM attendance a
    JOIN users u ON u.id = a.user_id
    LEFT JOIN departments d ON d.id = u.department_id
"#;

const UNVERIFIED_SQL: &str = "((a.check_in_time IS NOT NULL AND NOT a.check_in_verified) \
     OR (a.check_out_time IS NOT NULL AND NOT a.check_out_verified))";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationFilter {
    /// Every present half is verified.
    Verified,
    /// At least one present half still awaits verification.
    Unverified,
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<u64>,
    pub department_id: Option<u64>,
    pub status: Option<AttendanceStatus>,
    pub verification: Option<VerificationFilter>,
}

const MAX_LIMIT: u64 = 100;
// keeps `offset()` inside MySQL's signed BIGINT
const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    /// 1-based page, `limit` clamped to 1..=100.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(10).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> u64 {
        let total = total.max(0) as u64;
        total.div_ceil(self.limit)
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
    Date(NaiveDate),
}

fn where_clause(filter: &AttendanceFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(start) = filter.start_date {
        where_sql.push_str(" AND a.date >= ?");
        args.push(FilterValue::Date(start));
    }
    if let Some(end) = filter.end_date {
        where_sql.push_str(" AND a.date <= ?");
        args.push(FilterValue::Date(end));
    }
    if let Some(user_id) = filter.user_id {
        where_sql.push_str(" AND a.user_id = ?");
        args.push(FilterValue::U64(user_id));
    }
    if let Some(department_id) = filter.department_id {
        where_sql.push_str(" AND u.department_id = ?");
        args.push(FilterValue::U64(department_id));
    }
    if let Some(status) = filter.status {
        where_sql.push_str(" AND a.status = ?");
        args.push(FilterValue::Str(status.into()));
    }
    match filter.verification {
        Some(VerificationFilter::Verified) => {
            where_sql.push_str(&format!(" AND NOT {UNVERIFIED_SQL}"));
        }
        Some(VerificationFilter::Unverified) => {
            where_sql.push_str(&format!(" AND {UNVERIFIED_SQL}"));
        }
        None => {}
    }

    (where_sql, args)
}

/// Binds filter values onto any sqlx query flavour.
macro_rules! bind_filters {
    ($q:expr, $args:expr) => {{
        let mut q = $q;
        for arg in $args {
            q = match arg {
                FilterValue::U64(v) => q.bind(*v),
                FilterValue::Str(s) => q.bind(*s),
                FilterValue::Date(d) => q.bind(*d),
            };
        }
        q
    }};
}

/// Column values of one capture half, in `attendance` column order.
struct EventColumns {
    time: Option<NaiveDateTime>,
    image_url: Option<String>,
    qr_code: Option<String>,
    confidence: Option<f64>,
    method: Option<String>,
    location: Option<String>,
    verified: bool,
}

impl EventColumns {
    fn of(event: Option<&CaptureEvent>) -> Self {
        match event {
            Some(e) => Self {
                time: Some(e.time),
                image_url: e.image_url.clone(),
                qr_code: e.qr_code.clone(),
                confidence: Some(e.confidence),
                method: Some(e.method.to_string()),
                location: e.location.clone(),
                verified: e.verified,
            },
            None => Self {
                time: None,
                image_url: None,
                qr_code: None,
                confidence: None,
                method: None,
                location: None,
                verified: false,
            },
        }
    }

    fn bind<'q>(self, q: Query<'q, MySql, MySqlArguments>) -> Query<'q, MySql, MySqlArguments> {
        q.bind(self.time)
            .bind(self.image_url)
            .bind(self.qr_code)
            .bind(self.confidence)
            .bind(self.method)
            .bind(self.location)
            .bind(self.verified)
    }
}

/// Binds every mutable column, in the order used by `INSERT` and `UPDATE`.
fn bind_mutable<'q>(
    q: Query<'q, MySql, MySqlArguments>,
    record: &AttendanceRecord,
) -> Query<'q, MySql, MySqlArguments> {
    let q = EventColumns::of(record.check_in.as_ref()).bind(q);
    let q = EventColumns::of(record.check_out.as_ref()).bind(q);
    q.bind(record.status.to_string())
        .bind(record.hours_worked)
        .bind(record.early_checkout)
        .bind(record.notes.clone())
        .bind(record.verified_by)
}

const MUTABLE_ASSIGNMENTS: &str = r#"
    check_in_time = ?, check_in_image_url = ?, check_in_qr_code = ?, check_in_confidence = ?,
    check_in_method = ?, check_in_location = ?, check_in_verified = ?,
    check_out_time = ?, check_out_image_url = ?, check_out_qr_code = ?, check_out_confidence = ?,
    check_out_method = ?, check_out_location = ?, check_out_verified = ?,
    status = ?, hours_worked = ?, early_checkout = ?, notes = ?, verified_by = ?
"#;

pub async fn find_by_id(pool: &MySqlPool, id: u64) -> Result<Option<AttendanceRecord>, AttendanceError> {
    let row = sqlx::query_as::<_, AttendanceRow>("SELECT * FROM attendance WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(AttendanceRecord::try_from).transpose()
}

pub async fn find_for_day(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, AttendanceError> {
    let row = sqlx::query_as::<_, AttendanceRow>(
        "SELECT * FROM attendance WHERE user_id = ? AND date = ?",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    row.map(AttendanceRecord::try_from).transpose()
}

/// Inserts a new record. The `(user_id, date)` unique index turns a second
/// insert for the same day into [`AttendanceError::RecordExists`].
pub async fn insert(
    pool: &MySqlPool,
    record: &AttendanceRecord,
) -> Result<AttendanceRecord, AttendanceError> {
    let q = sqlx::query(
        r#"
        INSERT INTO attendance (
            user_id, date,
            check_in_time, check_in_image_url, check_in_qr_code, check_in_confidence,
            check_in_method, check_in_location, check_in_verified,
            check_out_time, check_out_image_url, check_out_qr_code, check_out_confidence,
            check_out_method, check_out_location, check_out_verified,
            status, hours_worked, early_checkout, notes, verified_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.user_id)
    .bind(record.date);

    let result = match bind_mutable(q, record).execute(pool).await {
        Ok(result) => result,
        Err(e) => return Err(map_insert_error(e)),
    };

    find_by_id(pool, result.last_insert_id())
        .await?
        .ok_or(AttendanceError::NotFound)
}

fn map_insert_error(e: sqlx::Error) -> AttendanceError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AttendanceError::RecordExists;
        }
        if db_err.is_foreign_key_violation() {
            return AttendanceError::validation("Unknown user");
        }
    }
    AttendanceError::Database(e)
}

// Matches only while both capture times are still the ones that were read.
const UNCHANGED_GUARD: &str = " AND check_in_time <=> ? AND check_out_time <=> ?";

fn update_sql(guard: &str) -> String {
    format!("UPDATE attendance SET {MUTABLE_ASSIGNMENTS} WHERE id = ?{guard}")
}

async fn update_guarded(
    pool: &MySqlPool,
    record: &AttendanceRecord,
    guard: &str,
) -> Result<MySqlQueryResult, AttendanceError> {
    let sql = update_sql(guard);
    let q = bind_mutable(sqlx::query(&sql), record).bind(record.id);
    Ok(q.execute(pool).await?)
}

/// Capture times of a record as it was read, before an admin edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimes {
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
}

impl ReadTimes {
    pub fn of(record: &AttendanceRecord) -> Self {
        Self {
            check_in: record.check_in.as_ref().map(|e| e.time),
            check_out: record.check_out.as_ref().map(|e| e.time),
        }
    }
}

/// Writes a check-in onto an existing record only if it still has none.
///
/// Returns `false` when a concurrent request got there first.
pub async fn save_check_in(pool: &MySqlPool, record: &AttendanceRecord) -> Result<bool, AttendanceError> {
    let result = update_guarded(pool, record, " AND check_in_time IS NULL").await?;
    Ok(result.rows_affected() == 1)
}

/// Writes a check-out only if the stored record is checked in and not yet out.
pub async fn save_check_out(pool: &MySqlPool, record: &AttendanceRecord) -> Result<bool, AttendanceError> {
    let result = update_guarded(
        pool,
        record,
        " AND check_in_time IS NOT NULL AND check_out_time IS NULL",
    )
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Overwrite used by admin actions.
///
/// The write only lands if no check-in or check-out was stored since `read`
/// was taken; otherwise the caller gets a conflict and must re-read.
pub async fn save(
    pool: &MySqlPool,
    record: &AttendanceRecord,
    read: ReadTimes,
) -> Result<(), AttendanceError> {
    let sql = update_sql(UNCHANGED_GUARD);
    let result = bind_mutable(sqlx::query(&sql), record)
        .bind(record.id)
        .bind(read.check_in)
        .bind(read.check_out)
        .execute(pool)
        .await?;
    if result.rows_affected() == 1 {
        return Ok(());
    }

    // zero rows also means "matched but nothing changed"
    match find_by_id(pool, record.id).await? {
        None => Err(AttendanceError::NotFound),
        Some(current) if ReadTimes::of(&current) == read => Ok(()),
        Some(_) => Err(AttendanceError::validation(
            "Attendance was modified concurrently, please try again",
        )),
    }
}

pub async fn delete(pool: &MySqlPool, id: u64) -> Result<bool, AttendanceError> {
    let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Filtered records joined with their owner, newest first.
///
/// `page = None` returns every match (export).
pub async fn list(
    pool: &MySqlPool,
    filter: &AttendanceFilter,
    page: Option<Page>,
) -> Result<(Vec<AttendanceWithUser>, i64), AttendanceError> {
    let (where_sql, args) = where_clause(filter);

    let count_sql = format!("SELECT COUNT(*) {FROM_JOINED}{where_sql}");
    let total = bind_filters!(sqlx::query_scalar::<MySql, i64>(&count_sql), &args)
        .fetch_one(pool)
        .await?;

    let mut data_sql = format!(
        "SELECT a.*, u.username, u.full_name, d.name AS department_name {FROM_JOINED}{where_sql} \
         ORDER BY a.date DESC, a.id DESC"
    );
    if page.is_some() {
        data_sql.push_str(" LIMIT ? OFFSET ?");
    }

    let mut data_q = bind_filters!(sqlx::query_as::<MySql, AttendanceWithUserRow>(&data_sql), &args);
    if let Some(page) = page {
        data_q = data_q.bind(page.limit).bind(page.offset());
    }

    let rows = data_q.fetch_all(pool).await?;
    let records = rows
        .into_iter()
        .map(AttendanceWithUser::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((records, total))
}

/// Status counts, average hours and pending verifications for a filter.
pub async fn aggregate(pool: &MySqlPool, filter: &AttendanceFilter) -> Result<RawStats, AttendanceError> {
    let (where_sql, args) = where_clause(filter);

    let counts_sql = format!("SELECT a.status, COUNT(*) {FROM_JOINED}{where_sql} GROUP BY a.status");
    let status_counts = bind_filters!(sqlx::query_as::<MySql, (String, i64)>(&counts_sql), &args)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(status, n)| {
            status
                .parse::<AttendanceStatus>()
                .map(|s| (s, n))
                .map_err(|_| AttendanceError::Corrupt(format!("unknown status '{status}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let avg_sql = format!(
        "SELECT AVG(a.hours_worked) {FROM_JOINED}{where_sql} AND a.hours_worked > 0"
    );
    let average_hours = bind_filters!(sqlx::query_scalar::<MySql, Option<f64>>(&avg_sql), &args)
        .fetch_one(pool)
        .await?;

    let pending_sql = format!("SELECT COUNT(*) {FROM_JOINED}{where_sql} AND {UNVERIFIED_SQL}");
    let pending_verification = bind_filters!(sqlx::query_scalar::<MySql, i64>(&pending_sql), &args)
        .fetch_one(pool)
        .await?;

    Ok(RawStats {
        status_counts,
        average_hours,
        pending_verification,
    })
}

/// Every day the user has a record for, oldest first.
pub async fn dates_for_user(pool: &MySqlPool, user_id: u64) -> Result<Vec<NaiveDate>, AttendanceError> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM attendance WHERE user_id = ? ORDER BY date ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(dates)
}
