use serde::Serialize;
use sqlx::FromRow;

/// A user row without credentials; what the admin user list returns.
#[derive(Debug, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role_id: u8,
    pub vacation_balance: f64,
}
