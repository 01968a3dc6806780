//! Credential verification seam.
//!
//! The identity service is an external collaborator; callers depend on the
//! `IdentityVerifier` trait only. The shipped implementation validates HS256
//! JWTs locally; an HTTP-backed verifier slots in behind the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use tillpoint_core::{DomainError, DomainResult, UserId};

use crate::claims::{AccessClaims, validate_claims};

/// Identity established by a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSubject {
    pub subject_id: UserId,
    pub email: String,
}

/// Verifies a bearer credential, yielding the subject identity.
///
/// Must reject malformed and expired tokens with `AuthenticationFailed`;
/// implementations never reveal *why* a credential failed to the caller.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, bearer: &str) -> DomainResult<VerifiedSubject>;
}

/// HS256 JWT verifier.
pub struct Hs256IdentityVerifier {
    key: DecodingKey,
}

impl Hs256IdentityVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }
}

#[async_trait]
impl IdentityVerifier for Hs256IdentityVerifier {
    async fn verify(&self, bearer: &str) -> DomainResult<VerifiedSubject> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked deterministically in validate_claims.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<AccessClaims>(bearer, &self.key, &validation)
            .map_err(|_| DomainError::AuthenticationFailed)?;

        validate_claims(&data.claims, Utc::now())?;

        Ok(VerifiedSubject {
            subject_id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Fixed token → subject map for tests.
#[derive(Default)]
pub struct StaticIdentityVerifier {
    subjects: HashMap<String, VerifiedSubject>,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, subject: VerifiedSubject) {
        self.subjects.insert(token.into(), subject);
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, bearer: &str) -> DomainResult<VerifiedSubject> {
        self.subjects
            .get(bearer)
            .cloned()
            .ok_or(DomainError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn mint(claims: &AccessClaims, secret: &[u8]) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn fresh_claims() -> AccessClaims {
        let now = Utc::now().timestamp();
        AccessClaims {
            sub: UserId::new(),
            email: "user@example.test".into(),
            iat: now - 10,
            exp: now + 600,
        }
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let claims = fresh_claims();
        let verifier = Hs256IdentityVerifier::new(SECRET);
        let subject = verifier.verify(&mint(&claims, SECRET)).await.unwrap();
        assert_eq!(subject.subject_id, claims.sub);
        assert_eq!(subject.email, claims.email);
    }

    #[tokio::test]
    async fn rejects_wrong_signature() {
        let claims = fresh_claims();
        let verifier = Hs256IdentityVerifier::new(SECRET);
        let err = verifier
            .verify(&mint(&claims, b"other-secret"))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::AuthenticationFailed);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: UserId::new(),
            email: "user@example.test".into(),
            iat: now - 600,
            exp: now - 10,
        };
        let verifier = Hs256IdentityVerifier::new(SECRET);
        assert!(verifier.verify(&mint(&claims, SECRET)).await.is_err());
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let verifier = Hs256IdentityVerifier::new(SECRET);
        assert!(verifier.verify("not.a.jwt").await.is_err());
    }
}
