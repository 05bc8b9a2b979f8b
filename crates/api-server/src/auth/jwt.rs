use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJwtClaims {
    pub sub: String,
    pub exp: usize,
}

/// Verifies user tokens signed with a shared HS256 secret.
///
/// Tokens are issued by the login service; this server only checks them.
#[derive(Clone)]
pub struct JwtKeys {
    decoding: DecodingKey,
    #[cfg(test)]
    encoding: jsonwebtoken::EncodingKey,
}

fn user_validation() -> Validation {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            #[cfg(test)]
            encoding: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify_user_jwt(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = decode::<UserJwtClaims>(token, &self.decoding, &user_validation())
            .map(|decoded| decoded.claims)
            .map_err(|err| AuthError::Unauthorized(format!("Invalid user JWT: {}", err)))?;

        Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::Unauthorized("Invalid token subject".to_string()))
    }
}

#[cfg(test)]
impl JwtKeys {
    pub fn issue_user_jwt(
        &self,
        user_id: Uuid,
        ttl_hours: i64,
    ) -> jsonwebtoken::errors::Result<(String, usize)> {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp() as usize;
        let claims = UserJwtClaims {
            sub: user_id.to_string(),
            exp,
        };
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding)
            .map(|token| (token, exp))
    }
}
