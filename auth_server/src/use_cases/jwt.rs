use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: u64,
}

/// Signs a 7-day HS256 token whose subject is the user id.
pub fn issue_token(user_id: Uuid, now_epoch_seconds: u64, secret: &str) -> Result<String, String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now_epoch_seconds + SESSION_TTL_SECONDS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| err.to_string())
}

/// Verifies a signed token and returns the subject user id. `jsonwebtoken`
/// rejects expired tokens on its own via the `exp` claim.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, String> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| err.to_string())?;
    Uuid::parse_str(&data.claims.sub).map_err(|err| err.to_string())
}
