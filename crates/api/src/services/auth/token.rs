//! Bearer-token issuance and validation (HS256 JWT).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use atelier_core::{UserId, UserRole};

use super::AuthError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: UserId,
    /// Role at issuance time.
    pub role: UserRole,
    /// Issued-at (seconds since epoch).
    pub iat: u64,
    /// Expiry (seconds since epoch).
    pub exp: u64,
}

/// Signs and validates access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl TokenService {
    /// Create a token service from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_minutes: u64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            ttl_secs: ttl_minutes * 60,
        }
    }

    /// Issue a signed token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId, role: UserRole) -> Result<String, AuthError> {
        let now = current_unix_time();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for expired, malformed, or
    /// tampered tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

fn current_unix_time() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("kD92mX4qLp7vRt1bYw8cNz5jFh3gQa6e"), 30)
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let svc = service();
        let user_id = UserId::generate();

        let token = svc.issue(user_id, UserRole::Client).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Client);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_role_is_preserved() {
        let svc = service();
        let token = svc.issue(UserId::generate(), UserRole::Admin).unwrap();
        assert_eq!(svc.verify(&token).unwrap().role, UserRole::Admin);
    }

    #[test]
    fn test_rejects_garbage() {
        let svc = service();
        assert!(svc.verify("not-a-token").is_err());
        assert!(svc.verify("").is_err());
    }

    #[test]
    fn test_rejects_tampered_token() {
        let svc = service();
        let token = svc.issue(UserId::generate(), UserRole::Client).unwrap();

        // Flip a character in the signature segment
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(svc.verify(&tampered).is_err());
    }

    #[test]
    fn test_rejects_token_signed_with_other_key() {
        let svc = service();
        let other = TokenService::new(
            &SecretString::from("q8Zr5Nv2Xm7Kj4Wd1Bp6Yt3Hs9Fc0Lgw"),
            30,
        );
        let token = other.issue(UserId::generate(), UserRole::Admin).unwrap();
        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let svc = service();
        let now = current_unix_time();
        // Expired well past jsonwebtoken's default 60s leeway
        let claims = Claims {
            sub: UserId::generate(),
            role: UserRole::Client,
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("kD92mX4qLp7vRt1bYw8cNz5jFh3gQa6e".as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            svc.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
