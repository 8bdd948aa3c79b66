use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Actor id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(&self, user_id: i32, now: i64) -> AppResult<String> {
        let claims = Claims { sub: user_id.to_string(), iat: now, exp: now + self.ttl_secs };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
    }

    /// The actor id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> AppResult<i32> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(
            |e| {
                tracing::debug!(error = %e, "rejected bearer token");
                AppError::Unauthorized
            },
        )?;
        data.claims.sub.parse().map_err(|_| AppError::Unauthorized)
    }
}
