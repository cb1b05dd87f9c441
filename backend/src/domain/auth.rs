//! Access gate primitives: credentials, principals, and the token codec.
//!
//! Tokens are signed JWTs carrying the user id and role with a bounded
//! expiry. Verification is a pure function of the token and the configured
//! secret; no server-side session state exists.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::error::DomainError;
use super::user::{Role, UserId};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and non-empty after trimming.
/// - `password` is non-empty but retains caller-provided whitespace to avoid
///   surprising credential comparisons.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email string suitable for user lookups.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Authenticated caller extracted from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Authenticated user identifier.
    pub id: UserId,
    /// Role claimed by the token.
    pub role: Role,
}

impl Principal {
    /// Fail with `Forbidden` unless the principal holds `role`.
    ///
    /// Role comparison is already case-normalized because [`Role`] is a
    /// closed enum parsed case-insensitively.
    pub fn require_role(&self, role: Role) -> Result<(), DomainError> {
        if self.role == role {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!(
                "{} role required",
                role.as_str()
            )))
        }
    }
}

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| DomainError::internal(format!("password hashing failed: {err}")))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// An unparseable stored hash counts as a mismatch rather than an error so
/// the caller's uniform `InvalidCredentials` response is preserved.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Wire shape of the JWT claims.
///
/// Historical tokens nested the identity under a `user` key; current tokens
/// are flat. Both decode; only the flat shape is ever issued.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<NestedClaims>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NestedClaims {
    id: Uuid,
    #[serde(default)]
    role: Option<String>,
}

impl Claims {
    /// Flatten either claim shape into `(id, role)`.
    fn identity(self) -> Option<(Uuid, String)> {
        let Self {
            sub,
            id,
            role,
            user,
            exp: _,
        } = self;
        if let Some(nested) = user {
            return Some((nested.id, nested.role.or(role)?));
        }
        Some((sub.or(id)?, role?))
    }
}

/// Signed-token issuer and verifier.
///
/// Built once at startup from the configured secret and shared read-only
/// across requests.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    /// Build a codec from the shared secret and token lifetime.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a signed, time-boxed token for the given identity.
    pub fn issue(&self, id: UserId, role: Role) -> Result<String, DomainError> {
        let exp = Utc::now() + self.ttl;
        let claims = Claims {
            sub: Some(*id.as_uuid()),
            id: None,
            role: Some(role.as_str().to_owned()),
            exp: exp.timestamp(),
            user: None,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| DomainError::internal(format!("token signing failed: {err}")))
    }

    /// Decode and verify a token, yielding the caller's principal.
    ///
    /// Fails with `Unauthorized` on bad signature, expiry, or a payload
    /// missing the identity claims.
    pub fn verify(&self, token: &str) -> Result<Principal, DomainError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| DomainError::unauthorized("invalid or expired token"))?;
        let (id, role) = data
            .claims
            .identity()
            .ok_or_else(|| DomainError::unauthorized("token payload missing identity"))?;
        let role = Role::parse(&role)
            .map_err(|_| DomainError::unauthorized("token payload carries unknown role"))?;
        Ok(Principal {
            id: UserId::from_uuid(id),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret", Duration::hours(1))
    }

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("a@b.c", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err =
            LoginCredentials::try_from_parts(email, password).expect_err("invalid inputs fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn issue_then_verify_round_trips_identity() {
        let codec = codec();
        let id = UserId::generate();
        let token = codec.issue(id, Role::Admin).expect("issue");
        let principal = codec.verify(&token).expect("verify");
        assert_eq!(principal.id, id);
        assert_eq!(principal.role, Role::Admin);
    }

    #[rstest]
    fn verify_rejects_foreign_signature() {
        let token = codec()
            .issue(UserId::generate(), Role::Borrower)
            .expect("issue");
        let other = TokenCodec::new(b"different-secret", Duration::hours(1));
        let err = other.verify(&token).expect_err("must reject");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    fn verify_rejects_expired_token() {
        let expired = TokenCodec::new(b"test-secret", Duration::hours(-2));
        let token = expired
            .issue(UserId::generate(), Role::Borrower)
            .expect("issue");
        let err = codec().verify(&token).expect_err("must reject");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    fn verify_accepts_nested_user_claims() {
        let id = Uuid::new_v4();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let claims = Claims {
            sub: None,
            id: None,
            role: None,
            exp,
            user: Some(NestedClaims {
                id,
                role: Some("ADMIN".to_owned()),
            }),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("encode");
        let principal = codec().verify(&token).expect("nested shape decodes");
        assert_eq!(principal.id, UserId::from_uuid(id));
        assert_eq!(principal.role, Role::Admin);
    }

    #[rstest]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cret").expect("hash");
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-phc-string"));
    }

    #[rstest]
    fn require_role_enforces_admin() {
        let principal = Principal {
            id: UserId::generate(),
            role: Role::Borrower,
        };
        let err = principal.require_role(Role::Admin).expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
        principal
            .require_role(Role::Borrower)
            .expect("own role passes");
    }
}
