//! OpenAPI documentation for the REST API.
//!
//! Registers every HTTP endpoint and the shared schemas, plus the bearer
//! token security scheme. Debug builds serve the generated document at
//! `/api-docs/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{DashboardStats, PendingLoan};
use crate::domain::{EntryKind, LedgerEntry, Loan, LoanStatus, Role};
use crate::inbound::http::{accounts, admin, auth, health, loans, ApiError};

/// Adds the bearer token scheme issued by the auth endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Signed token issued by POST /api/auth/register or /api/auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Microlend backend API",
        description = "HTTP interface for borrower accounts, loan lifecycle, and ledger reads."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        auth::register,
        auth::login,
        auth::me,
        loans::apply,
        loans::my_loans,
        accounts::balance,
        accounts::my_transactions,
        admin::list_loans,
        admin::list_pending,
        admin::approve,
        admin::reject,
        admin::disburse,
        admin::dashboard_stats,
        health::health,
    ),
    components(schemas(
        ApiError,
        Role,
        Loan,
        LoanStatus,
        LedgerEntry,
        EntryKind,
        PendingLoan,
        DashboardStats,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::TokenResponse,
        auth::UserProfile,
        loans::ApplyRequest,
        admin::RejectRequest,
        admin::DisburseResponse,
        accounts::BalanceResponse,
        health::HealthReport,
    )),
    tags(
        (name = "auth", description = "Registration, login, and profile"),
        (name = "loans", description = "Borrower loan applications"),
        (name = "accounts", description = "Balance and transaction history"),
        (name = "admin", description = "Loan review, disbursement, and reporting"),
        (name = "health", description = "Service health probe")
    )
)]
pub struct ApiDoc;
