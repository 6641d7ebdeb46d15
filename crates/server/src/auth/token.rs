//! Signed session tokens.
//!
//! A token carries the account id, email, role and department so that
//! handlers can scope queries without loading the account again. Tokens are
//! HS256 JWTs and cannot be revoked before they expire.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use models::{principal::Principal, role::Role};
use serde::{Deserialize, Serialize};

/// What the token vouches for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub department_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub department_id: Option<i32>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role, self.department_id)
    }
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn issue(&self, payload: &TokenPayload) -> jsonwebtoken::errors::Result<String> {
        self.issue_at(payload, Utc::now())
    }

    fn issue_at(
        &self,
        payload: &TokenPayload,
        now: DateTime<Utc>,
    ) -> jsonwebtoken::errors::Result<String> {
        let claims = Claims {
            id: payload.id,
            email: payload.email.clone(),
            role: payload.role,
            department_id: payload.department_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Returns the claims of a valid token; anything else is `None`
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .ok()
            .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TokenPayload {
        TokenPayload {
            id: 4,
            email: "hod.cse@college.edu".to_string(),
            role: Role::Hod,
            department_id: Some(1),
        }
    }

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(secret, Duration::days(7))
    }

    #[test]
    fn test_round_trip() {
        let tokens = issuer("secret");
        let token = tokens.issue(&payload()).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.id, 4);
        assert_eq!(claims.role, Role::Hod);
        assert_eq!(claims.department_id, Some(1));
        assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
        assert_eq!(claims.principal(), Principal::new(4, Role::Hod, Some(1)));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let tokens = issuer("secret");
        let mut token = tokens.issue(&payload()).unwrap();
        let last = token.pop().unwrap();
        token.push(if last == 'A' { 'B' } else { 'A' });

        assert!(tokens.verify(&token).is_none());
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let token = issuer("other").issue(&payload()).unwrap();
        assert!(issuer("secret").verify(&token).is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = issuer("secret");
        let token = tokens
            .issue_at(&payload(), Utc::now() - Duration::days(8))
            .unwrap();

        assert!(tokens.verify(&token).is_none());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(issuer("secret").verify("not.a.token").is_none());
        assert!(issuer("secret").verify("").is_none());
    }
}
