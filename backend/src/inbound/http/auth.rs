//! Authentication endpoints: register, login, and the caller profile.

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{LoginCredentials, Principal, RegistrationDraft, Role, User, UserId};
use crate::domain::{DomainError, LoginValidationError, UserValidationError};

use super::error::ApiResult;
use super::state::HttpState;

/// Registration request body. Historical clients sent `fullName`; both
/// spellings are accepted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name.
    #[serde(alias = "fullName", default)]
    pub full_name: String,
    /// Unique email address.
    #[serde(default)]
    pub email: String,
    /// Plaintext password; hashed before storage, never logged.
    #[serde(default)]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Registered email address.
    #[serde(default)]
    pub email: String,
    /// Account password.
    #[serde(default)]
    pub password: String,
}

/// Public view of a user; the password hash never leaves the domain.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable identifier.
    pub id: UserId,
    /// Display name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Account role.
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.as_str().to_owned(),
            role: user.role,
        }
    }
}

/// Token plus the created or authenticated user.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Signed bearer token.
    pub token: String,
    /// The authenticated user.
    pub user: UserProfile,
}

fn map_registration_error(err: UserValidationError) -> DomainError {
    DomainError::invalid_request(err.to_string())
}

fn map_login_error(_: LoginValidationError) -> DomainError {
    // Shape problems in a login payload still read as bad credentials, not
    // as a schema hint for enumeration.
    DomainError::unauthorized("invalid credentials")
}

/// Create a borrower account and issue a first token.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered")
    ),
    tags = ["auth"],
    operation_id = "register"
)]
#[post("/api/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let draft = RegistrationDraft::new(&body.full_name, &body.email, &body.password)
        .map_err(map_registration_error)?;
    let (token, user) = state.accounts.register(draft).await?;
    Ok(HttpResponse::Created().json(TokenResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// Verify credentials and issue a token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tags = ["auth"],
    operation_id = "login"
)]
#[post("/api/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from_parts(&body.email, &body.password).map_err(map_login_error)?;
    let (token, user) = state.accounts.login(&credentials).await?;
    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// Return the caller's profile.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Caller profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token")
    ),
    tags = ["auth"],
    operation_id = "me"
)]
#[get("/api/auth/me")]
pub async fn me(state: web::Data<HttpState>, principal: Principal) -> ApiResult<HttpResponse> {
    let user = state.accounts.profile(principal.id).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(&user)))
}
