use futures_util::stream::BoxStream;
use sqlx::MySqlPool;

use crate::model::department::Department;

pub async fn list(pool: &MySqlPool) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &MySqlPool, id: u64) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub fn stream_all(pool: &MySqlPool) -> BoxStream<'_, Result<Department, sqlx::Error>> {
    sqlx::query_as::<_, Department>("SELECT * FROM departments").fetch(pool)
}

pub async fn update_schedule(
    pool: &MySqlPool,
    id: u64,
    start: (u8, u8),
    end: (u8, u8),
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE departments
        SET work_start_hour = ?, work_start_minute = ?, work_end_hour = ?, work_end_minute = ?
        WHERE id = ?
        "#,
    )
    .bind(start.0)
    .bind(start.1)
    .bind(end.0)
    .bind(end.1)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
