//! HS256 bearer tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{validate_claims, JwtClaims, TokenValidationError};

/// Issues and verifies access tokens.
pub trait JwtValidator: Send + Sync {
    fn issue(&self, claims: &JwtClaims) -> Result<String, TokenValidationError>;

    /// Verify the signature, decode, and check the claim time window at `now`.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// Shared-secret (HMAC-SHA256) token codec.
pub struct Hs256JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256JwtValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtValidator").finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn issue(&self, claims: &JwtClaims) -> Result<String, TokenValidationError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenValidationError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenValidationError::Expired,
                ErrorKind::ImmatureSignature => TokenValidationError::NotYetValid,
                _ => TokenValidationError::Malformed(e.to_string()),
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use folio_core::UserId;

    use super::*;

    #[test]
    fn issued_token_validates() {
        let codec = Hs256JwtValidator::new("test-secret");
        let now = Utc::now();
        let claims = JwtClaims::new(UserId::new(), "ada", now, Duration::minutes(10));

        let token = codec.issue(&claims).unwrap();
        assert_eq!(codec.validate(&token, now).unwrap(), claims);
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let now = Utc::now();
        let claims = JwtClaims::new(UserId::new(), "ada", now, Duration::minutes(10));
        let token = Hs256JwtValidator::new("one").issue(&claims).unwrap();

        let err = Hs256JwtValidator::new("two").validate(&token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = Hs256JwtValidator::new("test-secret");
        let issued = Utc::now() - Duration::hours(3);
        let claims = JwtClaims::new(UserId::new(), "ada", issued, Duration::minutes(10));

        let token = codec.issue(&claims).unwrap();
        assert_eq!(codec.validate(&token, Utc::now()), Err(TokenValidationError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = Hs256JwtValidator::new("test-secret");
        let err = codec.validate("not.a.token", Utc::now()).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }
}
