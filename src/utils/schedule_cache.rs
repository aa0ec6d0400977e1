use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::department::WorkSchedule;
use crate::repository::department;

/// department id => resolved cutoffs
pub static SCHEDULE_CACHE: Lazy<Cache<u64, WorkSchedule>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(600)) // schedules rarely change
        .build()
});

/// Cutoffs that apply to `user_id`: their department's, else `default`.
pub async fn schedule_for_user(
    pool: &MySqlPool,
    user_id: u64,
    default: WorkSchedule,
) -> Result<WorkSchedule, sqlx::Error> {
    let department_id = sqlx::query_scalar::<_, Option<u64>>(
        "SELECT department_id FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .flatten();

    let Some(department_id) = department_id else {
        return Ok(default);
    };

    if let Some(schedule) = SCHEDULE_CACHE.get(&department_id).await {
        return Ok(schedule);
    }

    let schedule = match department::find_by_id(pool, department_id).await? {
        Some(d) => d.schedule(default),
        None => default,
    };
    SCHEDULE_CACHE.insert(department_id, schedule).await;

    Ok(schedule)
}

/// Drop a department's cached cutoffs after an edit.
pub async fn invalidate(department_id: u64) {
    SCHEDULE_CACHE.invalidate(&department_id).await;
}

/// Load every department schedule into the cache.
pub async fn warmup_schedule_cache(pool: &MySqlPool, default: WorkSchedule) -> Result<()> {
    let mut stream = department::stream_all(pool);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let d = row?;
        SCHEDULE_CACHE.insert(d.id, d.schedule(default)).await;
        total_count += 1;
    }

    tracing::info!(departments = total_count, "Schedule cache warmup complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[actix_web::test]
    async fn invalidate_drops_cached_schedule() {
        let schedule = WorkSchedule {
            start: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            end: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
        };
        SCHEDULE_CACHE.insert(990_001, schedule).await;
        assert_eq!(SCHEDULE_CACHE.get(&990_001).await, Some(schedule));

        invalidate(990_001).await;

        assert_eq!(SCHEDULE_CACHE.get(&990_001).await, None);
    }
}
