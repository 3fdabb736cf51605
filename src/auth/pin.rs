use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hashes a login PIN for storage. PINs are short, so they are never
/// stored or compared in the clear.
pub fn hash_pin(pin: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(pin.as_bytes(), &salt)?.to_string())
}

pub fn verify_pin(pin: &str, hashed: &str) -> Result<(), argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(pin.as_bytes(), &parsed)
}

/// Exactly six ASCII digits.
pub fn valid_pin_format(pin: &str) -> bool {
    pin.len() == 6 && pin.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hashed = hash_pin("123456").unwrap();
        assert!(verify_pin("123456", &hashed).is_ok());
        assert!(verify_pin("654321", &hashed).is_err());
    }

    #[test]
    fn pin_format() {
        assert!(valid_pin_format("000000"));
        assert!(!valid_pin_format("12345"));
        assert!(!valid_pin_format("1234567"));
        assert!(!valid_pin_format("12a456"));
        assert!(!valid_pin_format(""));
    }
}
