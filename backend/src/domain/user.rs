//! User identity: identifiers, roles, and the registered account entity.
//!
//! Inbound payloads are validated here before any service or port is
//! touched, so handlers stay thin and the persistence layer only ever sees
//! well-formed values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Opaque user identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed role set. Storage variance (`ADMIN`, `Admin`, ...) is tolerated on
/// read by [`Role::parse`]; only canonical lowercase is ever written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account: applies for loans, reads own ledger.
    Borrower,
    /// Reviews, approves/rejects, and disburses loans.
    Admin,
}

impl Role {
    /// Parse a stored role string, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "borrower" => Ok(Self::Borrower),
            "admin" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole(raw.to_owned())),
        }
    }

    /// Canonical lowercase spelling used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Borrower => "borrower",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for user-facing identity inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Full name was missing or blank once trimmed.
    #[error("full name must not be empty")]
    EmptyFullName,
    /// Email was blank or structurally invalid.
    #[error("email address is invalid")]
    InvalidEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Stored role string is outside the closed set.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Email address, trimmed, with the original casing preserved.
///
/// ## Invariants
/// - Non-empty after trimming and contains exactly one `@` with characters
///   on both sides. Anything stricter belongs to a verification flow, which
///   is out of scope.
/// - Comparisons and storage lookups are case-insensitive; use
///   [`EmailAddress::normalized`] for those.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an email address.
    pub fn new(raw: &str) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        let mut parts = trimmed.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let host = parts.next().unwrap_or_default();
        if local.is_empty() || host.is_empty() || host.contains('@') {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Original, case-preserved form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Lowercase form used for uniqueness checks and lookups.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Display name as entered at registration.
    pub full_name: String,
    /// Unique email address.
    pub email: EmailAddress,
    /// Argon2 PHC-format password hash. Never serialized outward.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated registration input.
///
/// The password is kept in a zeroizing buffer so a dropped draft does not
/// leave plaintext credentials in freed memory.
#[derive(Debug, Clone)]
pub struct RegistrationDraft {
    full_name: String,
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl RegistrationDraft {
    /// Construct a draft from raw request fields.
    pub fn new(full_name: &str, email: &str, password: &str) -> Result<Self, UserValidationError> {
        let name = full_name.trim();
        if name.is_empty() {
            return Err(UserValidationError::EmptyFullName);
        }
        if password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self {
            full_name: name.to_owned(),
            email: EmailAddress::new(email)?,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Trimmed display name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.full_name.as_str()
    }

    /// Validated email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plaintext password; only the hasher should read this.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin", Role::Admin)]
    #[case("ADMIN", Role::Admin)]
    #[case("  Admin  ", Role::Admin)]
    #[case("borrower", Role::Borrower)]
    #[case("BORROWER", Role::Borrower)]
    fn role_parse_is_case_insensitive(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(Role::parse(raw).expect("known role"), expected);
    }

    #[rstest]
    fn role_parse_rejects_free_text() {
        assert!(matches!(
            Role::parse("superuser"),
            Err(UserValidationError::UnknownRole(_))
        ));
    }

    #[rstest]
    #[case("")]
    #[case("no-at-sign")]
    #[case("@host")]
    #[case("local@")]
    #[case("a@b@c")]
    fn email_rejects_malformed(#[case] raw: &str) {
        assert_eq!(
            EmailAddress::new(raw),
            Err(UserValidationError::InvalidEmail)
        );
    }

    #[rstest]
    fn email_preserves_case_but_normalizes_for_lookup() {
        let email = EmailAddress::new(" Maria@Example.COM ").expect("valid");
        assert_eq!(email.as_str(), "Maria@Example.COM");
        assert_eq!(email.normalized(), "maria@example.com");
    }

    #[rstest]
    #[case("", "a@b.c", "pw", UserValidationError::EmptyFullName)]
    #[case("  ", "a@b.c", "pw", UserValidationError::EmptyFullName)]
    #[case("Maria", "bad", "pw", UserValidationError::InvalidEmail)]
    #[case("Maria", "a@b.c", "", UserValidationError::EmptyPassword)]
    fn registration_draft_validates_fields(
        #[case] name: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: UserValidationError,
    ) {
        let err = RegistrationDraft::new(name, email, password).expect_err("invalid");
        assert_eq!(err, expected);
    }
}
