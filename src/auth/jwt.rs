use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub fn generate_access_token(
    user_id: i64,
    username: String,
    role: u8,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = Claims {
        user_id,
        sub: username,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    #[test]
    fn roundtrip_preserves_identity_and_role() {
        let token = generate_access_token(7, "Marc".to_string(), Role::Worker.as_id(), "secret", 60);
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "Marc");
        assert_eq!(claims.role, Role::Worker.as_id());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(7, "Marc".to_string(), 1, "secret", 60);
        assert!(verify_token(&token, "other").is_err());
    }
}
