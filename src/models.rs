use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize)]
pub struct LoginReqDto {
    pub pin: String,
}

/// Credential row used only by the login path.
#[derive(FromRow)]
pub struct UserCred {
    pub id: i64,
    pub username: String,
    pub pin_hash: String,
    pub role_id: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
}
