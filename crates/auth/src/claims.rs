//! Access-token claims model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{DomainError, UserId};

/// Claims carried by a bearer access token.
///
/// Deliberately minimal: the token proves *who* the subject is; role and
/// tenant come from the profile lookup afterwards, so a stale token can never
/// smuggle in a revoked role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user profile id).
    pub sub: UserId,

    pub email: String,

    /// Issued-at, seconds since epoch.
    pub iat: i64,

    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Deterministically validate the claims' time window.
///
/// Signature verification happens in the verifier; this checks only what the
/// decoded claims assert.
pub fn validate_claims(claims: &AccessClaims, now: DateTime<Utc>) -> Result<(), DomainError> {
    if claims.exp <= claims.iat {
        return Err(DomainError::AuthenticationFailed);
    }
    let now = now.timestamp();
    if now < claims.iat || now >= claims.exp {
        return Err(DomainError::AuthenticationFailed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims(iat: i64, exp: i64) -> AccessClaims {
        AccessClaims {
            sub: UserId::new(),
            email: "cashier@example.test".into(),
            iat,
            exp,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn accepts_token_inside_window() {
        assert!(validate_claims(&claims(100, 200), at(150)).is_ok());
    }

    #[test]
    fn rejects_expired_token() {
        assert_eq!(
            validate_claims(&claims(100, 200), at(200)),
            Err(DomainError::AuthenticationFailed)
        );
    }

    #[test]
    fn rejects_not_yet_valid_token() {
        assert!(validate_claims(&claims(100, 200), at(50)).is_err());
    }

    #[test]
    fn rejects_inverted_window() {
        assert!(validate_claims(&claims(200, 100), at(150)).is_err());
    }
}
