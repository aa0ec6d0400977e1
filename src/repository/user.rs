use sqlx::MySqlPool;

use crate::model::user::User;

pub async fn find_by_username(pool: &MySqlPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, email, password, role_id, department_id, is_active
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn touch_last_login(pool: &MySqlPool, user_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
