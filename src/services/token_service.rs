//! Signs and verifies the bearer tokens carrying user identity claims.
//!
//! Development, staging, and testing tiers sign with HS256 and a shared
//! secret so no key files are needed locally; production signs with RS512
//! and a PEM key pair read once at startup.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

/// Identity fields embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// What a caller wants signed; `iat`/`exp` are filled in at issuance.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i32,
    pub username: Option<String>,
    pub role: Option<String>,
}

/// Outcome of [`TokenService::verify`]. A value, not an error: callers
/// branch on expired-vs-invalid without error-based control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(Claims),
    Expired,
    Invalid,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl TokenService {
    /// Key material for the asymmetric path must be loadable here; a missing
    /// or malformed key file is a startup failure, never a per-request one.
    pub fn from_config(auth: &AuthConfig) -> Result<Self> {
        let (algorithm, encoding_key, decoding_key) = if auth.environment.uses_symmetric_keys() {
            (
                Algorithm::HS256,
                EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
                DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            )
        } else {
            let private_pem = std::fs::read(&auth.private_key_path).with_context(|| {
                format!("Failed to read private key: {}", auth.private_key_path)
            })?;
            let public_pem = std::fs::read(&auth.public_key_path)
                .with_context(|| format!("Failed to read public key: {}", auth.public_key_path))?;

            (
                Algorithm::RS512,
                EncodingKey::from_rsa_pem(&private_pem).context("Invalid private key PEM")?,
                DecodingKey::from_rsa_pem(&public_pem).context("Invalid public key PEM")?,
            )
        };

        Ok(Self {
            algorithm,
            encoding_key,
            decoding_key,
            token_ttl: Duration::days(auth.token_ttl_days),
        })
    }

    /// Signs the identity with the default TTL.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_with_ttl(identity, self.token_ttl)
    }

    pub fn issue_with_ttl(
        &self,
        identity: &Identity,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            id: identity.id,
            username: identity.username.clone(),
            role: identity.role.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    #[must_use]
    pub fn verify(&self, token: &str) -> Verification {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Verification::Valid(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Verification::Expired,
            Err(_) => Verification::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    fn test_service() -> TokenService {
        let auth = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        };
        TokenService::from_config(&auth).unwrap()
    }

    fn identity() -> Identity {
        Identity {
            id: 42,
            username: Some("alice".to_string()),
            role: Some("user".to_string()),
        }
    }

    #[test]
    fn test_verify_round_trips_claims() {
        let service = test_service();
        let token = service.issue(&identity()).unwrap();

        match service.verify(&token) {
            Verification::Valid(claims) => {
                assert_eq!(claims.id, 42);
                assert_eq!(claims.username.as_deref(), Some("alice"));
                assert_eq!(claims.role.as_deref(), Some("user"));
                assert!(claims.exp > claims.iat);
            }
            other => panic!("expected valid token, got {other:?}"),
        }
    }

    #[test]
    fn test_expired_token_flags_expired_not_invalid() {
        let service = test_service();
        let token = service
            .issue_with_ttl(&identity(), Duration::seconds(-30))
            .unwrap();

        assert_eq!(service.verify(&token), Verification::Expired);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let service = test_service();
        let token = service.issue(&identity()).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('A');

        assert_eq!(service.verify(&tampered), Verification::Invalid);
        assert_eq!(service.verify("not-a-token"), Verification::Invalid);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let service = test_service();
        let token = service.issue(&identity()).unwrap();

        let other = TokenService::from_config(&AuthConfig {
            jwt_secret: "different-secret".to_string(),
            ..AuthConfig::default()
        })
        .unwrap();

        assert_eq!(other.verify(&token), Verification::Invalid);
    }

    #[test]
    fn test_claims_without_role_survive_round_trip() {
        // Refresh-issued tokens drop the role claim entirely.
        let service = test_service();
        let token = service
            .issue(&Identity {
                id: 7,
                username: None,
                role: None,
            })
            .unwrap();

        match service.verify(&token) {
            Verification::Valid(claims) => {
                assert_eq!(claims.id, 7);
                assert!(claims.username.is_none());
                assert!(claims.role.is_none());
            }
            other => panic!("expected valid token, got {other:?}"),
        }
    }
}
