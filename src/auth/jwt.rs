use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::models::Claims;

fn now() -> usize {
    usize::try_from(Utc::now().timestamp()).unwrap_or_default()
}

pub fn generate_access_token(
    staff_id: u64,
    username: String,
    role: u8,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = Claims {
        staff_id,
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

    #[test]
    fn token_round_trip_keeps_identity() {
        let token = generate_access_token(7, "desk".into(), 2, "s3cret", 600).unwrap();
        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.staff_id, 7);
        assert_eq!(claims.sub, "desk");
        assert_eq!(claims.role, 2);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(7, "desk".into(), 2, "s3cret", 600).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
