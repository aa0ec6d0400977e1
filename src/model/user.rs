use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub role_id: u8,
    pub department_id: Option<u64>,
    pub is_active: bool,
}
