//! Borrower loan endpoints: apply and list own loans.

use actix_web::{get, post, web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{DomainError, Loan, LoanApplication, LoanValidationError, Principal};

use super::error::ApiResult;
use super::state::HttpState;

/// Loan application body. Both snake_case and camelCase field spellings
/// are accepted for compatibility with older clients.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyRequest {
    /// Principal amount requested.
    #[serde(alias = "amountRequested")]
    #[schema(value_type = String, example = "50000")]
    pub amount_requested: BigDecimal,
    /// Free-text purpose of the loan.
    #[serde(default)]
    pub purpose: String,
    /// Repayment term in whole months.
    #[serde(alias = "termMonths", alias = "repaymentTermMonths")]
    pub repayment_term_months: i32,
}

fn map_validation_error(err: LoanValidationError) -> DomainError {
    DomainError::invalid_request(err.to_string())
}

/// Submit a loan application; it starts in `pending`.
#[utoipa::path(
    post,
    path = "/api/loans/apply",
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application created", body = Loan),
        (status = 400, description = "Invalid amount, purpose, or term"),
        (status = 401, description = "Missing or invalid token")
    ),
    tags = ["loans"],
    operation_id = "applyForLoan"
)]
#[post("/api/loans/apply")]
pub async fn apply(
    state: web::Data<HttpState>,
    principal: Principal,
    body: web::Json<ApplyRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let application = LoanApplication::new(
        body.amount_requested,
        &body.purpose,
        body.repayment_term_months,
    )
    .map_err(map_validation_error)?;
    let loan = state.loans.apply(principal.id, application).await?;
    Ok(HttpResponse::Created().json(loan))
}

/// List the caller's loans, newest first.
#[utoipa::path(
    get,
    path = "/api/loans/my-loans",
    responses(
        (status = 200, description = "Caller's loans", body = [Loan]),
        (status = 401, description = "Missing or invalid token")
    ),
    tags = ["loans"],
    operation_id = "myLoans"
)]
#[get("/api/loans/my-loans")]
pub async fn my_loans(
    state: web::Data<HttpState>,
    principal: Principal,
) -> ApiResult<HttpResponse> {
    let loans = state.loans.list_mine(principal.id).await?;
    Ok(HttpResponse::Ok().json(loans))
}
